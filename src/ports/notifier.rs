//! Outbound messaging port

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Messaging API rejected message: {0}")]
    Rejected(String),

    #[error("Messaging sink is not configured: {0}")]
    NotConfigured(String),
}

/// Inline URL button attached under a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkButton {
    pub text: String,
    pub url: String,
}

/// A fully formatted message ready for the sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// MarkdownV2 body, already escaped
    pub text: String,
    pub link_button: Option<LinkButton>,
}

impl OutboundMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link_button: None,
        }
    }

    pub fn with_button(mut self, text: impl Into<String>, url: impl Into<String>) -> Self {
        self.link_button = Some(LinkButton {
            text: text.into(),
            url: url.into(),
        });
        self
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NotifyError>;
}
