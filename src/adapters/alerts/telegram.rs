use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::ports::{Notification, Notifier, NotifyError, Perspective};

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Telegram Bot API notifier
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self, NotifyError> {
        let bot_token = bot_token.into();
        let chat_id = chat_id.into();
        if bot_token.is_empty() || chat_id.is_empty() {
            return Err(NotifyError::Config("Telegram bot token and chat id are required".to_string()));
        }
        Ok(Self {
            client: Client::new(),
            api_base: TELEGRAM_API.to_string(),
            bot_token,
            chat_id,
        })
    }

    /// Markdown message body
    pub fn format(notification: &Notification) -> String {
        let emoji = match notification.perspective {
            Perspective::Tracked => "👀",
            Perspective::Bot => "🤖",
        };
        let mut text = format!(
            "{} *{}*\n{}\n\nToken: `{}`",
            emoji,
            notification.title(),
            notification.summary(),
            notification.mint
        );
        if let Some(venue) = &notification.venue {
            text.push_str(&format!("\nVenue: {}", venue));
        }
        if let Some(latency) = notification.latency_ms {
            text.push_str(&format!("\nLatency: {} ms", latency));
        }
        if let Some(signature) = &notification.signature {
            text.push_str(&format!("\n[Transaction](https://solscan.io/tx/{})", signature));
        }
        text
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let text = Self::format(notification);
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text: &text,
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        if response.status().is_success() {
            debug!("Telegram alert sent: {}", notification.title());
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(NotifyError::Delivery(format!("Telegram API error {}: {}", status, body)))
        }
    }
}
