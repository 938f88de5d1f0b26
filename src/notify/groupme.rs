use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::{NotificationSink, NotifyError};

#[derive(Serialize)]
struct BotPost<'a> {
    bot_id: &'a str,
    text: &'a str,
}

/// GroupMe bot poster.
pub struct GroupMeBot {
    client: Client,
    endpoint: String,
    bot_id: String,
}

impl GroupMeBot {
    pub fn new(endpoint: &str, bot_id: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .user_agent(concat!("CourtWatch/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            bot_id: bot_id.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl NotificationSink for GroupMeBot {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let body = BotPost {
            bot_id: &self.bot_id,
            text,
        };
        let resp = self.client.post(&self.endpoint).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        debug!(status = status.as_u16(), "chat message accepted");
        Ok(())
    }
}
