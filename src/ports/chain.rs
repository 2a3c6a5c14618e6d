use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Chain access error type
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Subscription error: {0}")]
    SubscriptionError(String),

    #[error("Data parsing error: {0}")]
    ParseError(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// One ledger activity notice for a watched wallet.
///
/// Delivery is at-least-once; the same signature may arrive more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityNotification {
    pub signature: String,
    pub slot: u64,
    /// Set when the transaction failed on-chain
    pub err: Option<String>,
}

impl ActivityNotification {
    pub fn new(signature: impl Into<String>, slot: u64) -> Self {
        Self {
            signature: signature.into(),
            slot,
            err: None,
        }
    }

    pub fn failed(signature: impl Into<String>, slot: u64, err: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            slot,
            err: Some(err.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.err.is_some()
    }
}

/// Read access to wallet balances and wallet activity
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current token balances of `wallet`, mint -> UI amount
    async fn fetch_balances(&self, wallet: &str) -> Result<HashMap<String, f64>, ChainError>;

    /// Subscribe to activity touching `wallet`.
    /// The receiver closes when the underlying feed ends.
    async fn subscribe_activity(
        &self,
        wallet: &str,
    ) -> Result<mpsc::Receiver<ActivityNotification>, ChainError>;
}
