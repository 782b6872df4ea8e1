//! uniquerun: make sure only one instance of a named application runs per user.
//!
//! The first instance records its process identifier in a marker file under
//! the user data directory (`<data-root>/<app>/<app>.pid`). Later instances
//! find the marker, check that the recorded process is alive and looks like
//! the application, and report that they are not first. Markers left behind
//! by crashed processes are detected as stale and replaced.
//!
//! # Run only once
//!
//! ```no_run
//! let result = uniquerun::run_guarded("editor", |first| {
//!     if first {
//!         // start the application
//!     }
//! });
//! if let Err(err) = result {
//!     eprintln!("Error: {}", err);
//!     std::process::exit(err.exit_code());
//! }
//! ```
//!
//! # First-launch-only work
//!
//! ```no_run
//! use uniquerun::InstanceGuard;
//!
//! let mut guard = InstanceGuard::new("editor");
//! let first = guard.acquire();
//! if first {
//!     println!("only executed at first launch");
//! }
//! println!("always executed");
//! guard.release()?;
//! # Ok::<(), uniquerun::GuardError>(())
//! ```
//!
//! Faults (invalid name, missing data directory, marker I/O failures) never
//! interrupt acquisition: `acquire()` reports `false` and the fault is
//! returned by `release()` after cleanup has run.

pub mod config;
pub mod context;
pub mod error;
pub mod exit_codes;
pub mod fs;
pub mod instance;
pub mod process;

#[cfg(test)]
mod test_support;

pub use config::GuardConfig;
pub use error::{GuardError, Result};
pub use instance::{
    GuardState, InstanceGuard, MarkerInfo, MarkerStatus, inspect_marker, run_guarded,
    run_guarded_with,
};
pub use process::{ProcessTable, SystemProcessTable};
