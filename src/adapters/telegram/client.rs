//! Telegram Bot API client (`sendMessage` only)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::notifier::{NotificationSink, NotifyError, OutboundMessage};

pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub api_base_url: String,
    pub bot_token: String,
    pub chat_id: String,
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
struct InlineButton<'a> {
    text: &'a str,
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct ReplyMarkup<'a> {
    inline_keyboard: Vec<Vec<InlineButton<'a>>>,
}

#[derive(Debug, Serialize)]
struct SendMessageBody<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<ReplyMarkup<'a>>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    config: TelegramConfig,
    http: Client,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self, NotifyError> {
        if config.bot_token.trim().is_empty() {
            return Err(NotifyError::NotConfigured("bot token".to_string()));
        }
        if config.chat_id.trim().is_empty() {
            return Err(NotifyError::NotConfigured("chat id".to_string()));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotifyError::Http(e.to_string()))?;

        Ok(Self { config, http })
    }

    fn body<'a>(&'a self, message: &'a OutboundMessage) -> SendMessageBody<'a> {
        SendMessageBody {
            chat_id: &self.config.chat_id,
            text: &message.text,
            parse_mode: "MarkdownV2",
            disable_web_page_preview: true,
            reply_markup: message.link_button.as_ref().map(|button| ReplyMarkup {
                inline_keyboard: vec![vec![InlineButton {
                    text: &button.text,
                    url: &button.url,
                }]],
            }),
        }
    }
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.bot_token
        );

        // without_url keeps the bot token out of error messages
        let response = self
            .http
            .post(&url)
            .json(&self.body(message))
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.without_url().to_string()))?;

        let status = response.status();
        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| NotifyError::Http(format!("{} ({})", e.without_url(), status)))?;

        if !parsed.ok {
            return Err(NotifyError::Rejected(
                parsed.description.unwrap_or_else(|| status.to_string()),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TelegramConfig {
        TelegramConfig {
            api_base_url: DEFAULT_TELEGRAM_API.to_string(),
            bot_token: "123:abc".to_string(),
            chat_id: "-100123".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_body_with_button() {
        let notifier = TelegramNotifier::new(config()).unwrap();
        let message = OutboundMessage::new("hello").with_button("🤖 Go Bot", "https://t.me/bot");
        let json = serde_json::to_value(notifier.body(&message)).unwrap();

        assert_eq!(json["chat_id"], "-100123");
        assert_eq!(json["parse_mode"], "MarkdownV2");
        assert_eq!(json["disable_web_page_preview"], true);
        assert_eq!(json["reply_markup"]["inline_keyboard"][0][0]["url"], "https://t.me/bot");
    }

    #[test]
    fn test_body_without_button() {
        let notifier = TelegramNotifier::new(config()).unwrap();
        let json = serde_json::to_value(notifier.body(&OutboundMessage::new("x"))).unwrap();
        assert!(json.get("reply_markup").is_none());
    }

    #[test]
    fn test_missing_token_rejected() {
        let mut cfg = config();
        cfg.bot_token = String::new();
        assert!(matches!(TelegramNotifier::new(cfg), Err(NotifyError::NotConfigured(_))));
    }

    #[test]
    fn test_api_response_parsing() {
        let rejected: ApiResponse =
            serde_json::from_str(r#"{"ok":false,"error_code":400,"description":"Bad Request: can't parse entities"}"#)
                .unwrap();
        assert!(!rejected.ok);
        assert!(rejected.description.unwrap().contains("parse entities"));
    }
}
