//! Outcome envelope of one sync invocation

use serde::{Deserialize, Serialize};
use std::fmt;

use super::stats::SyncStats;

/// Which way records flow during a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncDirection {
    /// Cloud store is the source, local backup the destination
    CloudToLocal,
    /// Local backup is the source, cloud store the destination
    LocalToCloud,
    /// A pull pass followed by a push pass
    Bidirectional,
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CloudToLocal => "cloud -> local",
            Self::LocalToCloud => "local -> cloud",
            Self::Bidirectional => "cloud <-> local",
        })
    }
}

/// Result of a sync invocation, meant to be shown to a user.
///
/// `success` means the pass ran to completion. Errors confined to a single
/// entity type are collected in `errors` without clearing `success`; use
/// [`SyncResult::has_errors`] for the stricter reading.
#[derive(Debug, Clone, Serialize)]
pub struct SyncResult {
    success: bool,
    message: String,
    direction: SyncDirection,
    /// Pass start (Unix ms)
    started_at: i64,
    /// Pass end (Unix ms), `None` while running
    finished_at: Option<i64>,
    stats: SyncStats,
    errors: Vec<String>,
}

impl SyncResult {
    /// Start a new, still running result
    #[must_use]
    pub fn new(direction: SyncDirection) -> Self {
        Self {
            success: false,
            message: String::new(),
            direction,
            started_at: chrono::Utc::now().timestamp_millis(),
            finished_at: None,
            stats: SyncStats::new(),
            errors: Vec::new(),
        }
    }

    /// Append an error message
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Seal the result with its final flag and message
    pub fn finish(&mut self, success: bool, message: impl Into<String>) {
        self.success = success;
        self.message = message.into();
        self.finished_at = Some(chrono::Utc::now().timestamp_millis());
    }

    pub(crate) fn stats_mut(&mut self) -> &mut SyncStats {
        &mut self.stats
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        self.success
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn direction(&self) -> SyncDirection {
        self.direction
    }

    #[must_use]
    pub const fn started_at(&self) -> i64 {
        self.started_at
    }

    #[must_use]
    pub const fn finished_at(&self) -> Option<i64> {
        self.finished_at
    }

    #[must_use]
    pub const fn stats(&self) -> &SyncStats {
        &self.stats
    }

    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// True if any phase (or the pass itself) reported an error
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Wall-clock duration of the pass in milliseconds
    #[must_use]
    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| finished.saturating_sub(self.started_at).max(0))
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sync {} ({}): {} operations, {} errors",
            if self.success { "completed" } else { "failed" },
            self.direction,
            self.stats.total_operations(),
            self.errors.len()
        )
    }
}
