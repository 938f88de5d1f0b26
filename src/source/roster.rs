//! Partner/opponent extraction from the flat roster fields of a match.

use serde::{Deserialize, Serialize};

/// Up to two player names per side, as the results API reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterFields {
    #[serde(default)]
    pub team_one_player_one_name: Option<String>,
    #[serde(default)]
    pub team_one_player_two_name: Option<String>,
    #[serde(default)]
    pub team_two_player_one_name: Option<String>,
    #[serde(default)]
    pub team_two_player_two_name: Option<String>,
}

impl RosterFields {
    fn side(first: &Option<String>, second: &Option<String>) -> Vec<String> {
        [first, second]
            .into_iter()
            .filter_map(|name| name.as_deref().map(str::trim))
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn team_one(&self) -> Vec<String> {
        Self::side(&self.team_one_player_one_name, &self.team_one_player_two_name)
    }

    pub fn team_two(&self) -> Vec<String> {
        Self::side(&self.team_two_player_one_name, &self.team_two_player_two_name)
    }
}

/// Who the tracked player is playing with and against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Roster {
    pub partner: Option<String>,
    pub opponents: Option<Vec<String>>,
}

/// Locate the tracked player's side by a case-insensitive substring match on
/// `first_name` and split the roster into partner and opponents.
///
/// Returns `None` when neither side contains the player; that is an ordinary
/// outcome for matches whose roster is not yet published.
pub fn extract_roster(fields: &RosterFields, first_name: &str) -> Option<Roster> {
    let needle = first_name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    let is_tracked = |name: &String| name.to_lowercase().contains(&needle);

    let one = fields.team_one();
    let two = fields.team_two();

    let (own, other) = if one.iter().any(is_tracked) {
        (one, two)
    } else if two.iter().any(is_tracked) {
        (two, one)
    } else {
        return None;
    };

    let tracked_at = own.iter().position(is_tracked);
    let partner = own
        .iter()
        .enumerate()
        .find(|(i, _)| Some(*i) != tracked_at)
        .map(|(_, name)| name.clone());
    let opponents = (!other.is_empty()).then_some(other);

    Some(Roster { partner, opponents })
}
