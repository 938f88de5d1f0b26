//! Read-only rollups over the store for status reporting.

use chrono::{Duration, Utc};
use serde::Serialize;

use super::{MatchStatus, MatchStore};

/// Point-in-time counts over tracked matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub total: usize,
    pub future: usize,
    pub assigned: usize,
    pub court_assigned: usize,
    pub notified: usize,
    pub pending_notifications: usize,
    pub history_records: usize,
}

/// Activity totals over a trailing time window of executions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecentActivity {
    pub hours: u64,
    pub total_executions: usize,
    pub active_executions: usize,
    pub court_assignments_found: usize,
    pub notifications_sent: usize,
    pub stale_removed: usize,
}

impl MatchStore {
    pub fn summary(&self) -> MatchSummary {
        let records: Vec<_> = self.records().collect();
        MatchSummary {
            total: records.len(),
            future: self.count_by_status(MatchStatus::Future),
            assigned: self.count_by_status(MatchStatus::Assigned),
            court_assigned: records.iter().filter(|m| m.court_assigned).count(),
            notified: records.iter().filter(|m| m.notified).count(),
            pending_notifications: records.iter().filter(|m| m.is_pending_notification()).count(),
            history_records: self.execution_history().len(),
        }
    }

    /// Totals over executions recorded in the last `hours` hours.
    pub fn recent_activity(&self, hours: u64) -> RecentActivity {
        // Clamped to a century so the duration cannot overflow.
        let cutoff = Utc::now() - Duration::hours(hours.min(876_000) as i64);
        let recent: Vec<_> = self
            .execution_history()
            .iter()
            .filter(|e| e.timestamp > cutoff)
            .collect();

        RecentActivity {
            hours,
            total_executions: recent.len(),
            active_executions: recent.iter().filter(|e| e.is_active()).count(),
            court_assignments_found: recent.iter().map(|e| e.court_assignments_found).sum(),
            notifications_sent: recent.iter().map(|e| e.notifications_sent).sum(),
            stale_removed: recent.iter().map(|e| e.stale_matches_removed).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ExecutionRecord, DEFAULT_HISTORY_LIMIT};
    use std::collections::HashSet;

    fn execution(age_hours: i64, found: usize, sent: usize) -> ExecutionRecord {
        ExecutionRecord {
            timestamp: Utc::now() - Duration::hours(age_hours),
            matches_found: 3,
            new_matches: 0,
            future_matches: 0,
            assigned_matches: 0,
            court_assignments_checked: 0,
            court_checks_succeeded: 0,
            court_assignments_found: found,
            notifications_sent: sent,
            notifications_failed: 0,
            stale_matches_removed: 0,
        }
    }

    #[test]
    fn test_summary_counts() {
        let mut store = MatchStore::new("unused.json", DEFAULT_HISTORY_LIMIT);
        let ids: HashSet<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        store.reconcile(&ids, |_| "u".to_string());
        store.apply_court_result("a", "SC1", true, None);
        store.apply_court_result("b", "CC", true, None);
        store.mark_notified("b");

        let summary = store.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.future, 1);
        assert_eq!(summary.assigned, 2);
        assert_eq!(summary.court_assigned, 2);
        assert_eq!(summary.notified, 1);
        assert_eq!(summary.pending_notifications, 1);
        assert_eq!(summary.history_records, 0);
    }

    #[test]
    fn test_recent_activity_window() {
        let mut store = MatchStore::new("unused.json", DEFAULT_HISTORY_LIMIT);
        store.append_execution(execution(48, 5, 5));
        store.append_execution(execution(2, 1, 1));
        store.append_execution(execution(1, 0, 0));

        let activity = store.recent_activity(24);
        assert_eq!(activity.total_executions, 2);
        assert_eq!(activity.active_executions, 1);
        assert_eq!(activity.court_assignments_found, 1);
        assert_eq!(activity.notifications_sent, 1);
        assert_eq!(activity.stale_removed, 0);
    }

    #[test]
    fn test_recent_activity_empty() {
        let store = MatchStore::new("unused.json", DEFAULT_HISTORY_LIMIT);
        assert_eq!(store.recent_activity(24), RecentActivity { hours: 24, ..Default::default() });
    }
}
