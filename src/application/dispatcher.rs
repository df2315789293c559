//! Formats scored candidates and hands them to the notification sink.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::adapters::telegram::format_discovery_message;
use crate::domain::ScoredToken;
use crate::ports::notifier::{NotificationSink, NotifyError};

#[derive(Clone)]
pub struct NotificationDispatcher {
    sink: Arc<dyn NotificationSink>,
    bot_username: Option<String>,
}

impl NotificationDispatcher {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            sink,
            bot_username: None,
        }
    }

    /// Attach a "Go Bot" button linking to this bot
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        let username = username.into();
        self.bot_username = (!username.trim().is_empty()).then_some(username);
        self
    }

    pub async fn dispatch(
        &self,
        scored: &ScoredToken,
        detected_at: DateTime<Utc>,
    ) -> Result<(), NotifyError> {
        let message = format_discovery_message(scored, detected_at, self.bot_username.as_deref());
        self.sink.send(&message).await?;

        tracing::info!(
            mint = %scored.token.mint,
            score = scored.result.score,
            "Notification sent for {}",
            scored.token.symbol
        );
        Ok(())
    }
}
