//! Result source: court, completion and roster facts for a single match.

pub mod http;
pub mod payload;
pub mod roster;

use serde::Serialize;
use thiserror::Error;

use roster::RosterFields;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("results API answered {status}")]
    Status { status: u16 },

    #[error("response could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("no match data in response")]
    EmptyPayload,
}

/// Validated facts about one match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CourtCheck {
    /// Present iff a court has been assigned.
    pub court_label: Option<String>,
    /// Set once the source reports the match finished.
    pub completed_marker: Option<String>,
    pub roster: RosterFields,
}

impl CourtCheck {
    pub fn court_assigned(&self) -> bool {
        self.court_label.is_some()
    }
}

/// Trait for the court-status lookup.
#[async_trait::async_trait]
pub trait ResultSource: Send + Sync {
    /// Fetch the current facts for `match_id`.
    /// Network and payload problems are returned, never raised.
    async fn fetch(&self, match_id: &str) -> Result<CourtCheck, SourceError>;
}
