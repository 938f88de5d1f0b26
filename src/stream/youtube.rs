//! Court stream lookup via the streamed-courts channel search page.
//!
//! Parsing cascades: the rendered result list is tried first; if the page
//! carries no rendered results (the usual case for a plain HTTP fetch), the
//! embedded initial-data JSON is scanned for a live view counter instead.

use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use super::{StreamLookup, StreamStatus};
use crate::source::http::BROWSER_USER_AGENT;

const WATCH_PREFIX: &str = "/watch?v=";
const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

pub struct YoutubeLookup {
    client: Client,
    search_url: String,
}

impl YoutubeLookup {
    pub fn new(search_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            search_url: search_url.to_string(),
        })
    }

    async fn fetch_page(&self, court_label: &str) -> Result<String, reqwest::Error> {
        self.client
            .get(&self.search_url)
            .query(&[("query", court_label)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[async_trait::async_trait]
impl StreamLookup for YoutubeLookup {
    async fn lookup(&self, court_label: &str) -> StreamStatus {
        debug!(court = %court_label, "searching for live stream");
        let page = match self.fetch_page(court_label).await {
            Ok(page) => page,
            Err(e) => {
                warn!(court = %court_label, error = %e, "stream search failed");
                return StreamStatus::failed(format!("network error checking stream: {e}"));
            }
        };

        let status = parse_search_page(&page);
        if let Some(url) = status.watch_url() {
            info!(court = %court_label, %url, "live stream found");
        } else if let Some(err) = &status.error {
            warn!(court = %court_label, error = %err, "live stream detected without link");
        } else {
            debug!(court = %court_label, "no live stream");
        }
        status
    }
}

/// Classify a search results page.
pub fn parse_search_page(html: &str) -> StreamStatus {
    parse_rendered(html).unwrap_or_else(|| parse_initial_data(html))
}

/// Rendered-DOM scan. `None` when the page has no rendered result section.
fn parse_rendered(html: &str) -> Option<StreamStatus> {
    let document = Html::parse_document(html);
    let section_sel = Selector::parse("ytd-item-section-renderer").ok()?;
    let metadata_sel = Selector::parse("div#metadata-line").ok()?;
    let thumb_sel = Selector::parse("a#thumbnail").ok()?;

    let section = document.select(&section_sel).next()?;

    let is_live = section.select(&metadata_sel).any(|line| {
        line.text()
            .collect::<String>()
            .to_lowercase()
            .contains("watching")
    });
    if !is_live {
        return Some(StreamStatus::offline());
    }

    let href = section
        .select(&thumb_sel)
        .find_map(|a| a.value().attr("href"));

    Some(match href {
        Some(href) => match video_id_from_href(href) {
            Some(id) => StreamStatus::live(format!("{WATCH_URL}{id}")),
            None => live_without_link(format!("unexpected href format: {href}")),
        },
        None => live_without_link("live stream detected but no thumbnail link found"),
    })
}

/// Raw-text scan of the embedded initial data: the first ` watching` view
/// counter marks a live result, and its video id is the nearest preceding
/// `"videoId":"…"`.
fn parse_initial_data(html: &str) -> StreamStatus {
    const VIDEO_KEY: &str = "\"videoId\":\"";

    let Some(marker) = html.find(" watching\"") else {
        return StreamStatus::offline();
    };
    let Some(key_at) = html[..marker].rfind(VIDEO_KEY) else {
        return live_without_link("live counter found without a video id");
    };

    let rest = &html[key_at + VIDEO_KEY.len()..];
    let id: String = rest.chars().take_while(|c| *c != '"').collect();
    if is_video_id(&id) {
        StreamStatus::live(format!("{WATCH_URL}{id}"))
    } else {
        live_without_link(format!("malformed video id: {id}"))
    }
}

fn live_without_link(error: impl Into<String>) -> StreamStatus {
    StreamStatus {
        is_live: true,
        stream_url: None,
        error: Some(error.into()),
    }
}

fn video_id_from_href(href: &str) -> Option<&str> {
    let id = href.strip_prefix(WATCH_PREFIX)?.split('&').next()?;
    is_video_id(id).then_some(id)
}

fn is_video_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 16
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
