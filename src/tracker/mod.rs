//! Lifecycle tracker: one polling cycle over the match store.
//!
//! Order per cycle: prune stale ids, reconcile observed ids, refresh courts
//! for matches still waiting, dispatch due notifications, append the
//! execution record, persist. Court checks and notifications fail per record;
//! a failing match is left as-is and retried on the next cycle.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::discovery::ObservedMatch;
use crate::notify::message::compose;
use crate::notify::NotificationSink;
use crate::source::roster::extract_roster;
use crate::source::ResultSource;
use crate::storage::{ExecutionRecord, MatchStatus, MatchStore};
use crate::stream::StreamLookup;

/// Who is being tracked and how messages address them.
#[derive(Debug, Clone)]
pub struct TrackedPlayer {
    pub display_name: String,
    pub first_name: String,
}

/// Per-cycle knobs.
#[derive(Debug, Clone)]
pub struct TrackerSettings {
    /// Pause between consecutive result source calls.
    pub source_delay: Duration,
    /// Pause between consecutive stream lookups.
    pub stream_delay: Duration,
    /// Court whose broadcast is free to watch.
    pub free_court: String,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            source_delay: Duration::from_millis(500),
            stream_delay: Duration::from_secs(1),
            free_court: "CC".to_string(),
        }
    }
}

/// External collaborators, built once at startup.
pub struct Adapters {
    pub source: Box<dyn ResultSource>,
    pub stream: Box<dyn StreamLookup>,
    pub sink: Box<dyn NotificationSink>,
}

/// What one cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub observed_urls: Vec<String>,
    pub new_matches: usize,
    pub existing_matches: usize,
    pub stale_removed: usize,
    pub court_checks: usize,
    pub court_checks_succeeded: usize,
    pub court_checks_failed: usize,
    pub courts_found: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
    pub future_matches: usize,
    pub assigned_matches: usize,
}

pub struct Tracker {
    store: MatchStore,
    adapters: Adapters,
    player: TrackedPlayer,
    settings: TrackerSettings,
}

impl Tracker {
    pub fn new(store: MatchStore, adapters: Adapters, player: TrackedPlayer, settings: TrackerSettings) -> Self {
        Self {
            store,
            adapters,
            player,
            settings,
        }
    }

    pub fn store(&self) -> &MatchStore {
        &self.store
    }

    pub fn into_store(self) -> MatchStore {
        self.store
    }

    /// Run one full cycle against the currently listed matches.
    pub async fn run_cycle(&mut self, observed: &[ObservedMatch]) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        let mut urls: HashMap<&str, &str> = HashMap::new();
        for m in observed {
            urls.entry(m.id.as_str()).or_insert(m.url.as_str());
        }
        let observed_ids: HashSet<String> = urls.keys().map(|id| id.to_string()).collect();
        report.observed_urls = dedup_urls(observed);

        report.stale_removed = self.store.prune_stale(&observed_ids);

        let counts = self.store.reconcile(&observed_ids, |id| {
            urls.get(id).map(|u| u.to_string()).unwrap_or_default()
        });
        report.new_matches = counts.new_count;
        report.existing_matches = counts.existing_count;
        info!(
            observed = observed_ids.len(),
            new = counts.new_count,
            existing = counts.existing_count,
            stale = report.stale_removed,
            "match list reconciled"
        );

        self.refresh_courts(&observed_ids, &mut report).await;
        self.dispatch_notifications(&mut report).await;

        report.future_matches = self.store.count_by_status(MatchStatus::Future);
        report.assigned_matches = self.store.count_by_status(MatchStatus::Assigned);

        self.store.append_execution(ExecutionRecord {
            timestamp: Utc::now(),
            matches_found: report.observed_urls.len(),
            new_matches: report.new_matches,
            future_matches: report.future_matches,
            assigned_matches: report.assigned_matches,
            court_assignments_checked: report.court_checks,
            court_checks_succeeded: report.court_checks_succeeded,
            court_assignments_found: report.courts_found,
            notifications_sent: report.notifications_sent,
            notifications_failed: report.notifications_failed,
            stale_matches_removed: report.stale_removed,
        });

        self.store
            .persist()
            .with_context(|| format!("failed to persist state to {}", self.store.path().display()))?;

        info!(
            courts_found = report.courts_found,
            notifications = report.notifications_sent,
            failures = report.court_checks_failed + report.notifications_failed,
            "cycle complete"
        );
        Ok(report)
    }

    /// Query the result source for every observed match still waiting for a court.
    async fn refresh_courts(&mut self, observed_ids: &HashSet<String>, report: &mut CycleReport) {
        let waiting: Vec<String> = self
            .store
            .matches_awaiting_court_check()
            .into_iter()
            .map(|m| m.id)
            .filter(|id| observed_ids.contains(id))
            .collect();

        for (i, id) in waiting.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.settings.source_delay).await;
            }
            report.court_checks += 1;

            let check = match self.adapters.source.fetch(id).await {
                Ok(check) => check,
                Err(e) => {
                    warn!(match_id = %id, error = %e, "court check failed");
                    report.court_checks_failed += 1;
                    continue;
                }
            };
            report.court_checks_succeeded += 1;

            self.store
                .set_roster(id, extract_roster(&check.roster, &self.player.first_name));

            match &check.court_label {
                Some(court) => {
                    report.courts_found += 1;
                    info!(
                        match_id = %id,
                        %court,
                        completed = check.completed_marker.is_some(),
                        "court assigned"
                    );
                }
                None => info!(match_id = %id, "no court assigned yet"),
            }

            self.store.apply_court_result(
                id,
                check.court_label.as_deref().unwrap_or_default(),
                check.court_assigned(),
                check.completed_marker,
            );
        }
    }

    /// Send a message for every assigned, un-notified, uncompleted match.
    async fn dispatch_notifications(&mut self, report: &mut CycleReport) {
        let pending = self.store.pending_notifications();
        if pending.is_empty() {
            return;
        }
        info!(count = pending.len(), "processing pending notifications");

        for (i, record) in pending.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.settings.stream_delay).await;
            }
            let court = record.court_label.as_deref().unwrap_or_default();

            let stream = self.adapters.stream.lookup(court).await;
            let text = compose(&self.player.display_name, record, &stream, &self.settings.free_court);

            match self.adapters.sink.send(&text).await {
                Ok(()) => {
                    self.store.mark_notified(&record.id);
                    report.notifications_sent += 1;
                    info!(
                        match_id = %record.id,
                        %court,
                        url = %record.source_url,
                        "notification sent"
                    );
                    // Written immediately so a crash later in the cycle cannot re-send.
                    if let Err(e) = self.store.persist() {
                        error!(match_id = %record.id, error = %e, "failed to persist after notification");
                    }
                }
                Err(e) => {
                    report.notifications_failed += 1;
                    warn!(match_id = %record.id, error = %e, "notification failed, will retry next cycle");
                }
            }
        }
    }
}

/// Observed URLs with duplicate ids collapsed to their first occurrence.
fn dedup_urls(observed: &[ObservedMatch]) -> Vec<String> {
    let mut seen = HashSet::new();
    observed
        .iter()
        .filter(|m| seen.insert(m.id.as_str()))
        .map(|m| m.url.clone())
        .collect()
}
