//! Court-assignment message text.
//!
//! The wording is picked from a fixed template set by a checksum of the
//! match id, so a retried notification reads the same as the first attempt.

use crate::storage::MatchRecord;
use crate::stream::{fallback_line, StreamStatus};

const TEMPLATES: [&str; 8] = [
    "🏓 {player} has been assigned to Court {court} and will be starting soon!",
    "🎾 Court {court} is ready for {player} - match starting soon!",
    "⚡ {player} is heading to Court {court} - get ready for some action!",
    "🔥 {player} has been assigned to Court {court} - the match is about to begin!",
    "🏆 Court {court} awaits {player} - let's see what happens!",
    "💪 {player} is on Court {court} - time to show some skills!",
    "🚀 {player} has been assigned to Court {court} - the excitement begins now!",
    "⭐ Court {court} is {player}'s stage - the performance starts soon!",
];

/// 32-bit FNV-1a.
pub fn fnv1a_32(input: &str) -> u32 {
    const OFFSET: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;
    input
        .bytes()
        .fold(OFFSET, |hash, b| (hash ^ u32::from(b)).wrapping_mul(PRIME))
}

pub fn template_index(match_id: &str) -> usize {
    fnv1a_32(match_id) as usize % TEMPLATES.len()
}

/// `Partner: X | vs Y & Z`, or `None` when nothing is known.
pub fn roster_line(partner: Option<&str>, opponents: Option<&[String]>) -> Option<String> {
    let mut parts = Vec::new();

    if let Some(partner) = partner.filter(|p| !p.is_empty()) {
        parts.push(format!("Partner: {partner}"));
    }

    match opponents {
        Some([]) | None => {}
        Some([only]) => parts.push(format!("vs {only}")),
        Some([init @ .., last]) => parts.push(format!("vs {} & {}", init.join(", "), last)),
    }

    (!parts.is_empty()).then(|| parts.join(" | "))
}

/// Build the full notification text for an assigned match.
pub fn compose(player: &str, record: &MatchRecord, stream: &StreamStatus, free_court: &str) -> String {
    let court = record.court_label.as_deref().unwrap_or_default();
    let mut text = TEMPLATES[template_index(&record.id)]
        .replace("{player}", player)
        .replace("{court}", court);

    if let Some(line) = roster_line(record.partner_name.as_deref(), record.opponent_names.as_deref()) {
        text.push_str("\n\n👥 ");
        text.push_str(&line);
    }

    match stream.watch_url() {
        Some(url) => {
            text.push_str("\n\n📺 LIVE STREAM: ");
            text.push_str(url);
        }
        None => text.push_str(fallback_line(court, free_court)),
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn assigned(id: &str, court: &str) -> MatchRecord {
        let mut record = MatchRecord::observed(id, "https://pickleball.com/results/match/x", Utc::now());
        record.court_assigned = true;
        record.court_label = Some(court.to_string());
        record
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fnv1a_reference_values() {
        assert_eq!(fnv1a_32(""), 0x811c_9dc5);
        assert_eq!(fnv1a_32("a"), 0xe40c_292c);
        assert_eq!(fnv1a_32("foobar"), 0xbf9c_f968);
    }

    #[test]
    fn test_template_choice_is_stable() {
        let id = "0b8e7c5a-1f2d-4c3b-9a8e-7d6c5b4a3f21";
        let first = template_index(id);
        for _ in 0..10 {
            assert_eq!(template_index(id), first);
        }
        assert!(first < TEMPLATES.len());

        let record = assigned(id, "SC1");
        let stream = StreamStatus::offline();
        assert_eq!(
            compose("Adam Harvey", &record, &stream, "CC"),
            compose("Adam Harvey", &record, &stream, "CC")
        );
    }

    #[test]
    fn test_templates_spread_over_ids() {
        let used: std::collections::HashSet<usize> =
            (0..200).map(|n| template_index(&format!("match-{n}"))).collect();
        assert_eq!(used.len(), TEMPLATES.len());
    }

    #[test]
    fn test_roster_line_formats() {
        let two = names(&["Ann Lee", "Bo Diaz"]);
        let three = names(&["A", "B", "C"]);
        let one = names(&["Ann Lee"]);

        assert_eq!(
            roster_line(Some("Pat Smith"), Some(two.as_slice())).as_deref(),
            Some("Partner: Pat Smith | vs Ann Lee & Bo Diaz")
        );
        assert_eq!(roster_line(None, Some(one.as_slice())).as_deref(), Some("vs Ann Lee"));
        assert_eq!(roster_line(None, Some(three.as_slice())).as_deref(), Some("vs A, B & C"));
        assert_eq!(roster_line(Some("Pat Smith"), None).as_deref(), Some("Partner: Pat Smith"));
        assert_eq!(roster_line(None, None), None);
        assert_eq!(roster_line(Some(""), Some(&[][..])), None);
    }

    #[test]
    fn test_compose_with_live_stream_and_roster() {
        let mut record = assigned("m1", "SC1");
        record.partner_name = Some("Pat Smith".to_string());
        record.opponent_names = Some(names(&["Ann Lee", "Bo Diaz"]));
        let stream = StreamStatus::live("https://www.youtube.com/watch?v=abc");

        let text = compose("Adam Harvey", &record, &stream, "CC");

        assert!(text.contains("Adam Harvey"));
        assert!(text.contains("Court SC1"));
        assert!(text.contains("\n\n👥 Partner: Pat Smith | vs Ann Lee & Bo Diaz"));
        assert!(text.ends_with("\n\n📺 LIVE STREAM: https://www.youtube.com/watch?v=abc"));
        assert!(!text.contains("PickleballTV"));
    }

    #[test]
    fn test_compose_falls_back_when_offline() {
        let free = compose("Adam Harvey", &assigned("m2", "CC"), &StreamStatus::offline(), "CC");
        assert!(free.ends_with(" (free to watch on PickleballTV)"));
        assert!(!free.contains("👥"));

        let paid = compose("Adam Harvey", &assigned("m2", "SC2"), &StreamStatus::failed("timeout"), "CC");
        assert!(paid.ends_with(" (on PickleballTV - login required)"));
    }
}
