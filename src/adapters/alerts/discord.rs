use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::ports::{Notification, NotificationDetail, Notifier, NotifyError, Perspective};

const GREEN: u32 = 0x2ecc71;
const RED: u32 = 0xe74c3c;
const BLUE: u32 = 0x3498db;
const ORANGE: u32 = 0xe67e22;

/// Discord webhook notifier posting one embed per alert
pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
}

impl DiscordNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Result<Self, NotifyError> {
        let webhook_url = webhook_url.into();
        if webhook_url.is_empty() {
            return Err(NotifyError::Config("empty Discord webhook URL".to_string()));
        }
        Ok(Self {
            client: Client::new(),
            webhook_url,
        })
    }

    pub fn embed(notification: &Notification) -> Value {
        let color = match &notification.detail {
            NotificationDetail::NewPosition { .. } | NotificationDetail::BotBuy { .. } => GREEN,
            NotificationDetail::Increase { .. } => BLUE,
            NotificationDetail::PartialDecrease { .. } | NotificationDetail::BotSell { .. } => ORANGE,
            NotificationDetail::FullExit { .. } | NotificationDetail::BotTradeFailed { .. } => RED,
        };
        let who = match notification.perspective {
            Perspective::Tracked => "Tracked wallet",
            Perspective::Bot => "Bot wallet",
        };

        let mut fields = vec![
            json!({"name": "Token", "value": format!("`{}`", notification.mint), "inline": false}),
            json!({"name": who, "value": format!("`{}`", notification.wallet), "inline": false}),
        ];
        if let Some(venue) = &notification.venue {
            fields.push(json!({"name": "Venue", "value": venue, "inline": true}));
        }
        if let Some(latency) = notification.latency_ms {
            fields.push(json!({"name": "Latency", "value": format!("{} ms", latency), "inline": true}));
        }
        if let Some(signature) = &notification.signature {
            fields.push(json!({
                "name": "Transaction",
                "value": format!("[{}…](https://solscan.io/tx/{})", &signature[..signature.len().min(12)], signature),
                "inline": false
            }));
        }

        json!({
            "title": notification.title(),
            "description": notification.summary(),
            "color": color,
            "fields": fields,
        })
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let body = json!({ "embeds": [Self::embed(notification)] });
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(NotifyError::Delivery(format!("Discord {}: {}", status, text)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_url() {
        assert!(DiscordNotifier::new("").is_err());
    }

    #[test]
    fn test_embed_fields() {
        let n = Notification::for_bot(
            "Bot111",
            "TKN",
            NotificationDetail::BotTradeFailed {
                action: "BUY".to_string(),
                error: "no route".to_string(),
            },
        )
        .with_latency(80)
        .with_signature(Some("5xYzabcdefghijklmnop".to_string()));

        let embed = DiscordNotifier::embed(&n);
        assert_eq!(embed["title"], "BOT TRADE FAILED");
        assert_eq!(embed["color"], RED);
        let fields = embed["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[2]["value"], "80 ms");
        assert!(fields[3]["value"].as_str().unwrap().contains("solscan.io/tx/5xYz"));
    }
}
