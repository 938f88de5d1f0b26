//! Notification sink: delivers message text to the chat channel.

pub mod groupme;
pub mod message;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("chat request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("chat endpoint answered {status}: {body}")]
    Status { status: u16, body: String },
}

/// Trait for chat delivery. `Ok` means the channel accepted the message.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}
