//! Guard state and marker information structures.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Lifecycle state of an [`InstanceGuard`](super::InstanceGuard).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// Constructed; `acquire()` has not run yet.
    Unvalidated,
    /// This guard created the marker and holds its ownership handle.
    Owner,
    /// Another live instance owns the marker.
    NonOwner,
    /// A fault was recorded; it is surfaced on release.
    Failed,
}

/// Classification of an existing marker file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerStatus {
    /// Records a live process whose image matches the application.
    Live,
    /// Records a process that is gone, or whose image does not match.
    Stale,
    /// Unreadable, or not a decimal process identifier.
    Corrupt,
}

impl MarkerStatus {
    /// Lowercase name used in logs and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerStatus::Live => "live",
            MarkerStatus::Stale => "stale",
            MarkerStatus::Corrupt => "corrupt",
        }
    }
}

/// Information about an existing marker, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct MarkerInfo {
    /// The marker file path.
    pub path: PathBuf,

    /// The application name the marker belongs to.
    pub app_name: String,

    /// The recorded process identifier, if it could be parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    /// Whether the marker would block a new instance.
    pub status: MarkerStatus,

    /// Last modification time of the marker, if the filesystem reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl MarkerInfo {
    /// Age of the marker, if its modification time is known.
    pub fn age(&self) -> Option<Duration> {
        self.modified_at
            .map(|modified| Utc::now().signed_duration_since(modified))
    }

    /// Format the age as a human-readable string.
    pub fn age_string(&self) -> String {
        let Some(age) = self.age() else {
            return "unknown".to_string();
        };
        let minutes = age.num_minutes();
        let hours = age.num_hours();
        let days = age.num_days();

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else {
            format!("{}m", minutes)
        }
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Display for MarkerInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pid = match self.pid {
            Some(pid) => pid.to_string(),
            None => "?".to_string(),
        };
        write!(
            f,
            "{} (pid: {}, age: {}, {})",
            self.app_name,
            pid,
            self.age_string(),
            self.status.as_str().to_uppercase()
        )
    }
}
