//! Persisted record types.
//!
//! Serialized field names follow the state file layout, which predates this
//! crate; Rust-side names describe what the fields mean.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle position of a match. Only `Future -> Assigned` exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    /// No court recorded yet.
    Future,
    /// A court has been recorded.
    Assigned,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Future => write!(f, "future"),
            MatchStatus::Assigned => write!(f, "assigned"),
        }
    }
}

/// One tracked match, keyed by its site identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(rename = "uuid")]
    pub id: String,
    #[serde(rename = "url")]
    pub source_url: String,
    #[serde(rename = "first_seen")]
    pub first_observed_at: DateTime<Utc>,
    #[serde(rename = "last_seen")]
    pub last_observed_at: DateTime<Utc>,
    pub status: MatchStatus,
    #[serde(rename = "last_checked", default)]
    pub last_checked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub court_assigned: bool,
    #[serde(rename = "court_title", default)]
    pub court_label: Option<String>,
    #[serde(rename = "match_completed", default)]
    pub completed_marker: Option<String>,
    #[serde(default)]
    pub notified: bool,
    #[serde(rename = "notification_timestamp", default)]
    pub notified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub partner_name: Option<String>,
    #[serde(default)]
    pub opponent_names: Option<Vec<String>>,
}

impl MatchRecord {
    /// A freshly observed match with no court information.
    pub fn observed(id: &str, url: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            source_url: url.to_string(),
            first_observed_at: now,
            last_observed_at: now,
            status: MatchStatus::Future,
            last_checked_at: None,
            court_assigned: false,
            court_label: None,
            completed_marker: None,
            notified: false,
            notified_at: None,
            partner_name: None,
            opponent_names: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_marker.is_some()
    }

    /// Court assigned, not yet notified, not completed.
    pub fn is_pending_notification(&self) -> bool {
        self.court_assigned && !self.notified && !self.is_completed()
    }

    pub(crate) fn mark_notified(&mut self, now: DateTime<Utc>) {
        if !self.notified {
            self.notified = true;
            self.notified_at = Some(now);
        } else if self.notified_at.is_none() {
            self.notified_at = Some(now);
        }
    }
}

/// Tallies of one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub matches_found: usize,
    #[serde(default)]
    pub new_matches: usize,
    #[serde(default)]
    pub future_matches: usize,
    #[serde(default)]
    pub assigned_matches: usize,
    #[serde(default)]
    pub court_assignments_checked: usize,
    #[serde(default)]
    pub court_checks_succeeded: usize,
    #[serde(default)]
    pub court_assignments_found: usize,
    #[serde(default)]
    pub notifications_sent: usize,
    #[serde(default)]
    pub notifications_failed: usize,
    #[serde(default)]
    pub stale_matches_removed: usize,
}

impl ExecutionRecord {
    /// Whether anything happened beyond a plain re-scan.
    pub fn is_active(&self) -> bool {
        self.court_assignments_found > 0
            || self.notifications_sent > 0
            || self.stale_matches_removed > 0
            || self.new_matches > 0
    }
}
