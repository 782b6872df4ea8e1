//! Exit code constants for binaries gated by an instance guard.
//!
//! - 0: Success
//! - 1: Another instance is already running
//! - 2: Invalid application name
//! - 3: Filesystem unavailable
//! - 4: Marker could not be created or a stale marker could not be removed

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// `acquire()` returned false without a fault: another instance owns the marker.
pub const ALREADY_RUNNING: i32 = 1;

/// The application name was empty or contained a path separator.
pub const INVALID_NAME: i32 = 2;

/// The user data root is missing or the marker directory could not be created.
pub const FILESYSTEM_FAILURE: i32 = 3;

/// Marker creation or stale-marker removal failed.
pub const MARKER_FAILURE: i32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            SUCCESS,
            ALREADY_RUNNING,
            INVALID_NAME,
            FILESYSTEM_FAILURE,
            MARKER_FAILURE,
        ];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }
}
