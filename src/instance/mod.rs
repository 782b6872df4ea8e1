//! Single-instance guard.
//!
//! This module implements the protocol that decides whether the current
//! process is the first instance of a named application on this host.
//!
//! # Marker File
//!
//! The marker lives at `<data-root>/<app>/<app>.pid` and holds the owner's
//! process identifier as plain decimal text. It is published with
//! **exclusive-create** semantics so that, of any number of concurrent
//! starters, only one becomes the owner.
//!
//! # Validation
//!
//! An existing marker blocks a new instance only if its identifier is in the
//! live process table and that process's image name matches the application
//! (or a generic host runtime). Anything else is a stale marker left by a
//! crash: it is deleted and creation is retried once.
//!
//! # RAII Guards
//!
//! The owner keeps a read-only handle on the marker for the whole scope and
//! deletes the marker on release or drop. Faults are recorded during
//! acquisition and surfaced only after that cleanup has run.

mod guard;
mod marker;
mod types;


// Re-export public API
pub use guard::{InstanceGuard, run_guarded, run_guarded_with};
pub use marker::{MARKER_READ_LIMIT, inspect_marker, read_recorded_pid};
pub use types::{GuardState, MarkerInfo, MarkerStatus};
