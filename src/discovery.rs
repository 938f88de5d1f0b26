//! Player page discovery: which matches the site currently lists.
//!
//! The player page has a "Tournament Results" heading followed by the
//! player's matches; each match carries a "Results" link to
//! `/results/match/<uuid>`.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::source::http::BROWSER_USER_AGENT;

pub const RESULTS_HEADING: &str = "Tournament Results";
const RESULTS_LINK_TEXT: &str = "Results";
const MATCH_PATH: &str = "/results/match/";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("player page request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("no \"{0}\" heading on the player page")]
    HeadingNotFound(&'static str),
}

/// A match currently listed for the tracked player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservedMatch {
    pub id: String,
    pub url: String,
}

/// An anchor found after the heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub text: String,
    pub href: String,
}

pub struct PlayerPage {
    client: Client,
    base_url: String,
}

impl PlayerPage {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DiscoveryError> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the player's page and return the matches it lists.
    pub async fn observed_matches(&self, slug: &str) -> Result<Vec<ObservedMatch>, DiscoveryError> {
        let url = format!("{}/players/{}", self.base_url, slug);
        info!(%url, "fetching player page");

        let html = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let links = extract_results_links(&html, RESULTS_HEADING)
            .ok_or(DiscoveryError::HeadingNotFound(RESULTS_HEADING))?;
        debug!(links = links.len(), "anchors after heading");

        Ok(observed_from_links(&links, &self.base_url))
    }
}

/// All anchors after the first `div` whose trimmed text equals `heading`,
/// in document order. `None` if the heading is absent.
pub fn extract_results_links(html: &str, heading: &str) -> Option<Vec<PageLink>> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("div, a").ok()?;

    let mut found_heading = false;
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let name = element.value().name();
        if !found_heading {
            if name == "div" && element.text().collect::<String>().trim() == heading {
                found_heading = true;
            }
            continue;
        }
        if name == "a" {
            links.push(PageLink {
                text: element.text().collect::<String>().trim().to_string(),
                href: element.value().attr("href").unwrap_or_default().to_string(),
            });
        }
    }

    found_heading.then_some(links)
}

/// Keep "Results" links that point at a well-formed match id. Duplicates
/// collapse to their first occurrence.
pub fn observed_from_links(links: &[PageLink], base_url: &str) -> Vec<ObservedMatch> {
    let base = base_url.trim_end_matches('/');
    let mut seen = HashSet::new();

    links
        .iter()
        .filter(|link| link.text == RESULTS_LINK_TEXT)
        .filter_map(|link| match_id_from_href(&link.href))
        .filter(|id| seen.insert(id.to_string()))
        .map(|id| ObservedMatch {
            id: id.to_string(),
            url: format!("{base}{MATCH_PATH}{id}"),
        })
        .collect()
}

/// The id after `/results/match/`, if it is a lowercase hyphenated UUID.
pub fn match_id_from_href(href: &str) -> Option<&str> {
    let (_, tail) = href.rsplit_once(MATCH_PATH)?;
    is_match_id(tail).then_some(tail)
}

fn is_match_id(candidate: &str) -> bool {
    candidate.len() == 36
        && candidate
            .chars()
            .all(|c| c == '-' || c.is_ascii_digit() || ('a'..='f').contains(&c))
        && uuid::Uuid::try_parse(candidate).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID_A: &str = "0b8e7c5a-1f2d-4c3b-9a8e-7d6c5b4a3f21";
    const ID_B: &str = "5f0c1d2e-3a4b-4c5d-8e9f-a0b1c2d3e4f5";

    fn page() -> String {
        format!(
            r#"<html><body>
            <nav><a href="/players">Players</a></nav>
            <div><a href="/results/match/ffffffff-ffff-4fff-8fff-ffffffffffff">Results</a></div>
            <section>
              <div class="header"><div>Tournament Results</div></div>
              <div class="row">
                <a href="/tournaments/ppa-open">PPA Open</a>
                <a href="/results/match/{ID_A}"> Results </a>
              </div>
              <div class="row">
                <a href="https://pickleball.com/results/match/{ID_B}">Results</a>
                <a href="/results/match/{ID_A}">Results</a>
                <a href="/results/match/NOT-A-UUID">Results</a>
                <a href="/results/match/{upper}">Results</a>
                <a href="/results/match/{ID_B}">Watch</a>
              </div>
            </section>
            </body></html>"#,
            upper = ID_A.to_uppercase()
        )
    }

    #[test]
    fn test_links_after_heading_only() {
        let links = extract_results_links(&page(), RESULTS_HEADING).unwrap();
        assert_eq!(links.len(), 7);
        assert_eq!(links[0].text, "PPA Open");
        assert_eq!(links[1].text, "Results");
        assert!(links.iter().all(|l| !l.href.contains("ffffffff")));
    }

    #[test]
    fn test_missing_heading_is_none() {
        let html = r#"<div>Upcoming</div><a href="/results/match/x">Results</a>"#;
        assert_eq!(extract_results_links(html, RESULTS_HEADING), None);
    }

    #[test]
    fn test_heading_with_no_links_is_empty() {
        let html = "<div>Tournament Results</div><p>No matches</p>";
        assert_eq!(extract_results_links(html, RESULTS_HEADING), Some(Vec::new()));
    }

    #[test]
    fn test_observed_filters_and_dedupes() {
        let links = extract_results_links(&page(), RESULTS_HEADING).unwrap();
        let observed = observed_from_links(&links, "https://pickleball.com/");

        assert_eq!(
            observed,
            vec![
                ObservedMatch {
                    id: ID_A.to_string(),
                    url: format!("https://pickleball.com/results/match/{ID_A}"),
                },
                ObservedMatch {
                    id: ID_B.to_string(),
                    url: format!("https://pickleball.com/results/match/{ID_B}"),
                },
            ]
        );
    }

    #[test]
    fn test_match_id_validation() {
        assert_eq!(match_id_from_href(&format!("/results/match/{ID_A}")), Some(ID_A));
        assert_eq!(match_id_from_href("/results/match/"), None);
        assert_eq!(match_id_from_href(&format!("/results/match/{ID_A}/stats")), None);
        assert_eq!(match_id_from_href(&format!("/results/match/{}", ID_A.replace('-', ""))), None);
        assert_eq!(match_id_from_href(&format!("/results/match/{}", ID_A.to_uppercase())), None);
        assert_eq!(match_id_from_href(&format!("/results/event/{ID_A}")), None);
    }
}
