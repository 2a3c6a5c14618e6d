//! Notifier port
//!
//! Data contract for human-readable alerts. Formatting and delivery belong to
//! the adapters; callers treat delivery as fire-and-forget.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{TransitionEvent, TransitionKind};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
    #[error("Notifier misconfigured: {0}")]
    Config(String),
}

/// Which wallet an alert is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Perspective {
    Tracked,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationDetail {
    NewPosition { amount: f64 },
    Increase { old_balance: f64, new_balance: f64, amount: f64 },
    PartialDecrease { old_balance: f64, new_balance: f64, percent: f64 },
    FullExit { old_balance: f64 },
    /// Bot bought `out_amount` tokens for `in_amount` of the base asset
    BotBuy { in_amount: f64, out_amount: f64 },
    /// Bot sold `percent` of its holding for `out_amount` of the base asset
    BotSell { percent: f64, sold_amount: f64, out_amount: f64 },
    BotTradeFailed { action: String, error: String },
}

/// One alert. Amounts are UI units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub perspective: Perspective,
    pub wallet: String,
    pub mint: String,
    pub signature: Option<String>,
    pub venue: Option<String>,
    pub latency_ms: Option<u64>,
    pub detail: NotificationDetail,
}

impl Notification {
    /// Alert describing a tracked-wallet transition
    pub fn for_transition(wallet: &str, event: &TransitionEvent, signature: Option<String>) -> Self {
        let detail = match event.kind {
            TransitionKind::NewPosition => NotificationDetail::NewPosition {
                amount: event.new_balance,
            },
            TransitionKind::Increase => NotificationDetail::Increase {
                old_balance: event.old_balance,
                new_balance: event.new_balance,
                amount: event.amount(),
            },
            TransitionKind::PartialDecrease => NotificationDetail::PartialDecrease {
                old_balance: event.old_balance,
                new_balance: event.new_balance,
                percent: event.decrease_percent().unwrap_or(0.0),
            },
            TransitionKind::FullExit => NotificationDetail::FullExit {
                old_balance: event.old_balance,
            },
        };

        Self {
            perspective: Perspective::Tracked,
            wallet: wallet.to_string(),
            mint: event.mint.clone(),
            signature,
            venue: None,
            latency_ms: None,
            detail,
        }
    }

    /// Alert describing a bot-wallet fill or failure
    pub fn for_bot(wallet: &str, mint: &str, detail: NotificationDetail) -> Self {
        Self {
            perspective: Perspective::Bot,
            wallet: wallet.to_string(),
            mint: mint.to_string(),
            signature: None,
            venue: None,
            latency_ms: None,
            detail,
        }
    }

    pub fn with_signature(mut self, signature: Option<String>) -> Self {
        self.signature = signature;
        self
    }

    pub fn with_venue(mut self, venue: Option<String>) -> Self {
        self.venue = venue;
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }

    /// Short title, e.g. "NEW POSITION" or "BOT SELL"
    pub fn title(&self) -> &'static str {
        match self.detail {
            NotificationDetail::NewPosition { .. } => "NEW POSITION",
            NotificationDetail::Increase { .. } => "POSITION INCREASED",
            NotificationDetail::PartialDecrease { .. } => "PARTIAL SELL",
            NotificationDetail::FullExit { .. } => "FULL EXIT",
            NotificationDetail::BotBuy { .. } => "BOT BUY",
            NotificationDetail::BotSell { .. } => "BOT SELL",
            NotificationDetail::BotTradeFailed { .. } => "BOT TRADE FAILED",
        }
    }

    /// One-line plain-text body
    pub fn summary(&self) -> String {
        match &self.detail {
            NotificationDetail::NewPosition { amount } => {
                format!("Bought {:.4} of {}", amount, self.mint)
            }
            NotificationDetail::Increase { old_balance, new_balance, amount } => format!(
                "Added {:.4} of {} ({:.4} -> {:.4})",
                amount, self.mint, old_balance, new_balance
            ),
            NotificationDetail::PartialDecrease { old_balance, new_balance, percent } => format!(
                "Sold {:.2}% of {} ({:.4} -> {:.4})",
                percent, self.mint, old_balance, new_balance
            ),
            NotificationDetail::FullExit { old_balance } => {
                format!("Exited {} (was {:.4})", self.mint, old_balance)
            }
            NotificationDetail::BotBuy { in_amount, out_amount } => format!(
                "Bot bought {:.4} of {} for {:.4}",
                out_amount, self.mint, in_amount
            ),
            NotificationDetail::BotSell { percent, sold_amount, out_amount } => format!(
                "Bot sold {:.2}% ({:.4}) of {} for {:.4}",
                percent, sold_amount, self.mint, out_amount
            ),
            NotificationDetail::BotTradeFailed { action, error } => {
                format!("Bot {} of {} failed: {}", action, self.mint, error)
            }
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}
