//! Alert delivery adapters for the `Notifier` port

pub mod discord;
pub mod telegram;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::ports::{Notification, Notifier, NotifyError};

pub use discord::DiscordNotifier;
pub use telegram::TelegramNotifier;

/// Writes every alert to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            "[{}] {}{}",
            notification.title(),
            notification.summary(),
            notification
                .signature
                .as_ref()
                .map(|s| format!(" | tx {}", s))
                .unwrap_or_default()
        );
        Ok(())
    }
}

/// Delivers to every inner notifier; fails if any of them fails
#[derive(Default)]
pub struct FanoutNotifier {
    targets: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, target: Arc<dyn Notifier>) -> Self {
        self.targets.push(target);
        self
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[async_trait]
impl Notifier for FanoutNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let results = futures::future::join_all(self.targets.iter().map(|t| t.notify(notification))).await;

        let failures: Vec<String> = results
            .into_iter()
            .filter_map(|r| r.err())
            .map(|e| e.to_string())
            .collect();
        if failures.is_empty() {
            return Ok(());
        }
        warn!("{} of {} alert target(s) failed", failures.len(), self.targets.len());
        Err(NotifyError::Delivery(failures.join("; ")))
    }
}
