//! RAII instance guard implementation.

use super::marker::{self, MarkerOpener};
use super::types::{GuardState, MarkerStatus};
use crate::config::GuardConfig;
use crate::context::GuardContext;
use crate::error::{GuardError, Result};
use crate::process::{ProcessTable, SystemProcessTable};
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, info, warn};

/// Scoped single-instance guard for a named application.
///
/// Construction never fails: an invalid name or missing data root is
/// recorded and surfaced by [`release`](Self::release). `acquire()` answers
/// "is this the first instance?". On release, explicit or on drop, an owning
/// guard deletes its marker.
///
/// ```no_run
/// use uniquerun::InstanceGuard;
///
/// let mut guard = InstanceGuard::new("editor");
/// if guard.acquire() {
///     // only the first instance gets here
/// }
/// guard.release()?;
/// # Ok::<(), uniquerun::GuardError>(())
/// ```
#[derive(Debug)]
pub struct InstanceGuard {
    app_name: String,
    config: GuardConfig,
    table: Box<dyn ProcessTable>,

    /// `None` when construction recorded a fault.
    context: Option<GuardContext>,

    state: GuardState,

    /// Read-only handle on the marker, held while this guard is the owner.
    handle: Option<File>,

    /// The single deferred fault, surfaced after cleanup.
    fault: Option<GuardError>,

    /// Turns a freshly published marker into the ownership handle.
    opener: MarkerOpener,

    released: bool,
}

impl InstanceGuard {
    /// Create a guard using the platform user data directory.
    pub fn new(app_name: &str) -> Self {
        Self::with_config(app_name, GuardConfig::default())
    }

    /// Create a guard with an explicit configuration.
    pub fn with_config(app_name: &str, config: GuardConfig) -> Self {
        Self::with_process_table(app_name, config, SystemProcessTable)
    }

    /// Create a guard that validates markers against the given process table.
    pub fn with_process_table<T>(app_name: &str, config: GuardConfig, table: T) -> Self
    where
        T: ProcessTable + 'static,
    {
        let (context, fault) = match GuardContext::resolve(app_name, &config) {
            Ok(ctx) => (Some(ctx), None),
            Err(e) => {
                debug!(app = app_name, error = %e, "instance_guard.construction_fault");
                (None, Some(e))
            }
        };

        Self {
            app_name: app_name.to_string(),
            config,
            table: Box::new(table),
            context,
            state: GuardState::Unvalidated,
            handle: None,
            fault,
            opener: marker::open_ownership_handle,
            released: false,
        }
    }

    /// Replace how the published marker is reopened as the ownership handle.
    #[cfg(test)]
    pub(crate) fn with_marker_opener(mut self, opener: MarkerOpener) -> Self {
        self.opener = opener;
        self
    }

    /// Determine whether this is the first instance, claiming the marker if so.
    ///
    /// Only the first call does any work; later calls return the same answer.
    ///
    /// # Returns
    ///
    /// * `true` - This guard now owns the marker
    /// * `false` - Another live instance owns it, or a fault was recorded
    pub fn acquire(&mut self) -> bool {
        if self.state != GuardState::Unvalidated {
            return self.is_owner();
        }

        if self.fault.is_some() {
            self.state = GuardState::Failed;
            return false;
        }

        let outcome = match &self.context {
            Some(ctx) => self.try_acquire(ctx),
            None => Ok(None),
        };

        match outcome {
            Ok(Some(handle)) => {
                self.handle = Some(handle);
                self.state = GuardState::Owner;
                info!(
                    app = %self.app_name,
                    pid = std::process::id(),
                    "instance_guard.acquired"
                );
            }
            Ok(None) => {
                self.state = GuardState::NonOwner;
                info!(app = %self.app_name, "instance_guard.already_running");
            }
            Err(e) => {
                warn!(app = %self.app_name, error = %e, "instance_guard.acquire_failed");
                self.fault = Some(e);
                self.state = GuardState::Failed;
            }
        }

        self.is_owner()
    }

    /// The acquisition protocol. `Ok(Some(handle))` means ownership.
    fn try_acquire(&self, ctx: &GuardContext) -> Result<Option<File>> {
        ctx.ensure_marker_dir()?;

        // symlink_metadata, so a dangling link is validated (and removed) too.
        if marker::marker_present(&ctx.marker_path) {
            let (pid, status) = marker::classify(ctx, &self.config, self.table.as_ref());
            if status == MarkerStatus::Live {
                debug!(pid, path = %ctx.marker_path.display(), "instance_guard.live_marker");
                return Ok(None);
            }

            marker::remove_stale(&ctx.marker_path)?;
            info!(
                pid,
                status = status.as_str(),
                path = %ctx.marker_path.display(),
                "instance_guard.stale_marker_removed"
            );
        }

        // Losing an exclusive-create race means someone else is first: no retry.
        marker::create(ctx, self.opener)
    }

    /// Release the guard, surfacing any fault recorded along the way.
    ///
    /// Cleanup always runs before the fault is returned.
    pub fn release(mut self) -> Result<()> {
        self.cleanup();
        match self.fault.take() {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }

    /// Close the ownership handle and delete the marker, once.
    fn cleanup(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let Some(handle) = self.handle.take() else {
            return;
        };
        let Some(ctx) = &self.context else {
            return;
        };

        // Only the file this guard published may be removed; a marker replaced
        // behind our back belongs to whoever recreated it.
        let owned = marker::still_owned(&handle, &ctx.marker_path);
        drop(handle);
        if !owned {
            warn!(
                app = %self.app_name,
                path = %ctx.marker_path.display(),
                "instance_guard.marker_replaced"
            );
            return;
        }

        match fs::remove_file(&ctx.marker_path) {
            Ok(()) => info!(
                app = %self.app_name,
                path = %ctx.marker_path.display(),
                "instance_guard.released"
            ),
            // The next starter will find a dead owner and recover.
            Err(e) => warn!(
                app = %self.app_name,
                path = %ctx.marker_path.display(),
                error = %e,
                "instance_guard.marker_remove_failed"
            ),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Whether this guard owns the marker.
    pub fn is_owner(&self) -> bool {
        self.state == GuardState::Owner
    }

    /// The application name this guard was built with.
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Path to the marker file, if it could be derived.
    pub fn marker_path(&self) -> Option<&Path> {
        self.context.as_ref().map(|ctx| ctx.marker_path.as_path())
    }

    /// The fault that `release()` will surface, if any.
    pub fn fault(&self) -> Option<&GuardError> {
        self.fault.as_ref()
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        self.cleanup();
        if let Some(fault) = self.fault.take() {
            warn!(
                app = %self.app_name,
                error = %fault,
                "instance_guard.fault_dropped"
            );
        }
    }
}

/// Run `f` inside a guarded scope using the platform user data directory.
///
/// `f` receives whether this is the first instance. The guard is released
/// after `f` returns (or unwinds); a recorded fault replaces `f`'s result.
pub fn run_guarded<T, F>(app_name: &str, f: F) -> Result<T>
where
    F: FnOnce(bool) -> T,
{
    run_guarded_with(InstanceGuard::new(app_name), f)
}

/// Run `f` inside the scope of an already constructed guard.
pub fn run_guarded_with<T, F>(mut guard: InstanceGuard, f: F) -> Result<T>
where
    F: FnOnce(bool) -> T,
{
    let first = guard.acquire();
    let value = f(first);
    guard.release()?;
    Ok(value)
}
