//! Typed parsing of the match-info API response.
//!
//! Shape: `{ "data": [ { "court_title": .., "match_completed": .., <roster fields> } ] }`.
//! Only the first element of `data` is meaningful.

use serde::Deserialize;
use serde_json::Value;

use super::roster::RosterFields;
use super::{CourtCheck, SourceError};
use crate::storage::migrate::normalize_completed_marker;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Vec<MatchInfo>,
}

#[derive(Debug, Deserialize)]
struct MatchInfo {
    #[serde(default)]
    court_title: Option<String>,
    #[serde(default)]
    match_completed: Value,
    #[serde(flatten)]
    roster: RosterFields,
}

/// Parse a raw response body. Anything unexpected is an error, never a panic.
pub fn parse_match_info(body: &str) -> Result<CourtCheck, SourceError> {
    let envelope: Envelope = serde_json::from_str(body).map_err(SourceError::Decode)?;
    let info = envelope
        .data
        .into_iter()
        .next()
        .ok_or(SourceError::EmptyPayload)?;

    let court_label = info
        .court_title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let completed_marker = match normalize_completed_marker(&info.match_completed) {
        Value::String(s) => Some(s),
        _ => None,
    };

    Ok(CourtCheck {
        court_label,
        completed_marker,
        roster: info.roster,
    })
}
