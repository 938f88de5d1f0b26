//! Match lifecycle store: the durable record of every known match.
//!
//! The store is loaded once at process start, mutated in memory by the
//! tracker, and written back as a single JSON document. Writes go to a
//! sibling temp file first and are renamed into place, so a crash mid-write
//! leaves the previous state intact.

pub mod migrate;
pub mod model;
pub mod summary;

pub use model::{ExecutionRecord, MatchRecord, MatchStatus};
pub use summary::{MatchSummary, RecentActivity};

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::source::roster::Roster;

/// Default trailing window of execution records.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file {path} could not be accessed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result of folding one observation set into the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileCounts {
    pub new_count: usize,
    pub existing_count: usize,
}

/// On-disk layout.
#[derive(Serialize)]
struct StateFileRef<'a> {
    matches: &'a BTreeMap<String, MatchRecord>,
    execution_history: &'a [ExecutionRecord],
    last_updated: DateTime<Utc>,
}

#[derive(Deserialize)]
struct StateFile {
    #[serde(default)]
    matches: BTreeMap<String, MatchRecord>,
    #[serde(default)]
    execution_history: Vec<ExecutionRecord>,
}

pub struct MatchStore {
    path: PathBuf,
    matches: BTreeMap<String, MatchRecord>,
    history: Vec<ExecutionRecord>,
    history_limit: usize,
}

impl MatchStore {
    /// An empty store backed by `path`. Nothing is read or written.
    pub fn new(path: impl Into<PathBuf>, history_limit: usize) -> Self {
        Self {
            path: path.into(),
            matches: BTreeMap::new(),
            history: Vec::new(),
            history_limit: history_limit.max(1),
        }
    }

    /// Load the store from `path`.
    ///
    /// A missing file yields an empty store. A file that exists but cannot be
    /// decoded or parsed is logged and discarded: match history is rebuilt
    /// from the next page scan. Only an unreadable file is an error.
    pub fn load(path: impl Into<PathBuf>, history_limit: usize) -> Result<Self, StoreError> {
        let mut store = Self::new(path, history_limit);

        let bytes = match std::fs::read(&store.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %store.path.display(), "no state file yet, starting empty");
                return Ok(store);
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: store.path.clone(),
                    source,
                })
            }
        };
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    path = %store.path.display(),
                    error = %e,
                    "state file is not valid UTF-8, starting with empty state"
                );
                return Ok(store);
            }
        };

        match parse_state(&content) {
            Ok((state, migrated)) => {
                if migrated > 0 {
                    info!(path = %store.path.display(), fields = migrated, "migrated legacy state fields");
                }
                store.matches = state.matches;
                store.history = state.execution_history;
                store.normalize();
                store.trim_history();
                debug!(
                    matches = store.matches.len(),
                    history = store.history.len(),
                    "state loaded"
                );
            }
            Err(e) => {
                warn!(
                    path = %store.path.display(),
                    error = %e,
                    "state file is corrupt, starting with empty state"
                );
            }
        }

        Ok(store)
    }

    /// Write the full state to disk.
    pub fn persist(&self) -> Result<(), StoreError> {
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let tmp_path = tmp_path_for(&self.path);
        {
            let file = File::create(&tmp_path).map_err(io_err)?;
            let mut writer = BufWriter::new(file);
            let state = StateFileRef {
                matches: &self.matches,
                execution_history: &self.history,
                last_updated: Utc::now(),
            };
            serde_json::to_writer_pretty(&mut writer, &state)?;
            writer.write_all(b"\n").map_err(io_err)?;
            let file = writer.into_inner().map_err(|e| io_err(e.into_error()))?;
            file.sync_all().map_err(io_err)?;
        }
        std::fs::rename(&tmp_path, &self.path).map_err(io_err)?;

        debug!(path = %self.path.display(), matches = self.matches.len(), "state persisted");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // -----------------------------------------------------------------------
    // Lifecycle operations
    // -----------------------------------------------------------------------

    /// Create records for unseen ids and bump `last_observed_at` for known ones.
    /// Ids absent from `observed` are left alone.
    pub fn reconcile<F>(&mut self, observed: &HashSet<String>, url_of: F) -> ReconcileCounts
    where
        F: Fn(&str) -> String,
    {
        let now = Utc::now();
        let mut counts = ReconcileCounts::default();

        for id in observed {
            match self.matches.get_mut(id) {
                Some(record) => {
                    if now > record.last_observed_at {
                        record.last_observed_at = now;
                    }
                    counts.existing_count += 1;
                }
                None => {
                    let record = MatchRecord::observed(id, &url_of(id), now);
                    self.matches.insert(id.clone(), record);
                    counts.new_count += 1;
                }
            }
        }

        counts
    }

    /// Delete every record whose id is not in `observed`.
    pub fn prune_stale(&mut self, observed: &HashSet<String>) -> usize {
        let before = self.matches.len();
        self.matches.retain(|id, record| {
            let keep = observed.contains(id);
            if !keep {
                info!(
                    match_id = %id,
                    status = %record.status,
                    court = record.court_label.as_deref().unwrap_or("none"),
                    "removing stale match"
                );
            }
            keep
        });
        before - self.matches.len()
    }

    /// Records still waiting for a court.
    pub fn matches_awaiting_court_check(&self) -> Vec<MatchRecord> {
        self.matches
            .values()
            .filter(|m| m.status == MatchStatus::Future)
            .cloned()
            .collect()
    }

    /// Record the outcome of a court-status query.
    ///
    /// An assignment promotes `Future` to `Assigned`; nothing demotes. A
    /// completed marker is sticky and suppresses notification for good.
    pub fn apply_court_result(
        &mut self,
        id: &str,
        court_label: &str,
        assigned: bool,
        completed_marker: Option<String>,
    ) {
        let Some(record) = self.matches.get_mut(id) else {
            debug!(match_id = %id, "court result for unknown match ignored");
            return;
        };
        let now = Utc::now();
        let label = court_label.trim();
        let assigned = assigned && !label.is_empty();

        record.court_assigned = assigned;
        record.court_label = assigned.then(|| label.to_string());
        record.last_checked_at = Some(now);

        if let Some(marker) = completed_marker {
            record.completed_marker = Some(marker);
        }

        if assigned && record.status == MatchStatus::Future {
            record.status = MatchStatus::Assigned;
        }

        if record.is_completed() {
            record.mark_notified(now);
        }
    }

    /// Store roster details. `None` keeps whatever was recorded before.
    pub fn set_roster(&mut self, id: &str, roster: Option<Roster>) {
        let (Some(record), Some(roster)) = (self.matches.get_mut(id), roster) else {
            return;
        };
        record.partner_name = roster.partner;
        record.opponent_names = roster.opponents;
    }

    /// Records due for a notification.
    pub fn pending_notifications(&self) -> Vec<MatchRecord> {
        self.matches
            .values()
            .filter(|m| m.is_pending_notification())
            .cloned()
            .collect()
    }

    pub fn mark_notified(&mut self, id: &str) {
        if let Some(record) = self.matches.get_mut(id) {
            record.mark_notified(Utc::now());
        }
    }

    /// Append to the execution log, discarding the oldest beyond the window.
    pub fn append_execution(&mut self, record: ExecutionRecord) {
        self.history.push(record);
        self.trim_history();
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn get(&self, id: &str) -> Option<&MatchRecord> {
        self.matches.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.matches.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.matches.keys().map(String::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = &MatchRecord> {
        self.matches.values()
    }

    pub fn count_by_status(&self, status: MatchStatus) -> usize {
        self.matches.values().filter(|m| m.status == status).count()
    }

    pub fn execution_history(&self) -> &[ExecutionRecord] {
        &self.history
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn trim_history(&mut self) {
        if self.history.len() > self.history_limit {
            let excess = self.history.len() - self.history_limit;
            self.history.drain(..excess);
            debug!(removed = excess, "trimmed execution history");
        }
    }

    /// Repair records written by older versions so the invariants hold.
    fn normalize(&mut self) {
        let now = Utc::now();
        for (key, record) in self.matches.iter_mut() {
            if record.id != *key {
                record.id = key.clone();
            }
            let label_empty = record
                .court_label
                .as_deref()
                .map_or(true, |l| l.trim().is_empty());
            if record.court_assigned && label_empty {
                record.court_assigned = false;
                record.court_label = None;
            }
            if record.is_completed() || record.notified {
                record.mark_notified(now);
            }
        }
    }
}

fn parse_state(content: &str) -> Result<(StateFile, usize), serde_json::Error> {
    let mut doc: serde_json::Value = serde_json::from_str(content)?;
    let migrated = migrate::migrate(&mut doc);
    let state = serde_json::from_value(doc)?;
    Ok((state, migrated))
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
