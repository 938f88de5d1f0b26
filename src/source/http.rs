use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use tracing::debug;

use super::payload::parse_match_info;
use super::{CourtCheck, ResultSource, SourceError};

/// Desktop browser UA; the site rejects obvious bot agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Results API client for pickleball.com.
pub struct PickleballApi {
    client: Client,
    base_url: String,
}

impl PickleballApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
        headers.insert("sec-fetch-site", HeaderValue::from_static("same-origin"));

        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn match_info_url(&self, match_id: &str) -> String {
        format!("{}/api/v1/results/getResultMatchInfos?id={}", self.base_url, match_id)
    }
}

#[async_trait::async_trait]
impl ResultSource for PickleballApi {
    async fn fetch(&self, match_id: &str) -> Result<CourtCheck, SourceError> {
        let url = self.match_info_url(match_id);
        debug!(%url, "querying match info");

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        parse_match_info(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_info_url() {
        let api = PickleballApi::new("https://pickleball.com/", Duration::from_secs(10)).unwrap();
        assert_eq!(
            api.match_info_url("0b8e7c5a-1f2d-4c3b-9a8e-7d6c5b4a3f21"),
            "https://pickleball.com/api/v1/results/getResultMatchInfos?id=0b8e7c5a-1f2d-4c3b-9a8e-7d6c5b4a3f21"
        );
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_unknown_match() {
        let api = PickleballApi::new("https://pickleball.com", Duration::from_secs(10)).unwrap();
        let result = api.fetch("00000000-0000-0000-0000-000000000000").await;
        assert!(result.is_err());
    }
}
