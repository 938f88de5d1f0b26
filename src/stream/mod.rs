//! Live broadcast lookup for a court.
//!
//! A failed lookup degrades the notification text; it never blocks it.
//! Implementations therefore fold every error into [`StreamStatus`].

pub mod youtube;

use serde::Serialize;

/// Outcome of a stream lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreamStatus {
    pub is_live: bool,
    pub stream_url: Option<String>,
    pub error: Option<String>,
}

impl StreamStatus {
    pub fn live(url: impl Into<String>) -> Self {
        Self {
            is_live: true,
            stream_url: Some(url.into()),
            error: None,
        }
    }

    pub fn offline() -> Self {
        Self::default()
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            is_live: false,
            stream_url: None,
            error: Some(error.into()),
        }
    }

    /// The URL to advertise, if the court is live and the link was found.
    pub fn watch_url(&self) -> Option<&str> {
        if self.is_live {
            self.stream_url.as_deref()
        } else {
            None
        }
    }
}

/// Trait for live-stream lookups.
#[async_trait::async_trait]
pub trait StreamLookup: Send + Sync {
    async fn lookup(&self, court_label: &str) -> StreamStatus;
}

/// Static line used when no live stream link is available.
pub fn fallback_line(court_label: &str, free_court: &str) -> &'static str {
    if court_label == free_court {
        " (free to watch on PickleballTV)"
    } else {
        " (on PickleballTV - login required)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_line_depends_on_court() {
        assert_eq!(fallback_line("CC", "CC"), " (free to watch on PickleballTV)");
        assert_eq!(fallback_line("SC1", "CC"), " (on PickleballTV - login required)");
        assert_eq!(fallback_line("cc", "CC"), " (on PickleballTV - login required)");
    }

    #[test]
    fn test_watch_url_requires_live() {
        assert_eq!(StreamStatus::live("https://youtu.be/x").watch_url(), Some("https://youtu.be/x"));
        assert_eq!(StreamStatus::offline().watch_url(), None);
        assert_eq!(StreamStatus::failed("timeout").watch_url(), None);

        let live_without_link = StreamStatus {
            is_live: true,
            stream_url: None,
            error: Some("no thumbnail link".to_string()),
        };
        assert_eq!(live_without_link.watch_url(), None);
    }
}
