//! Balance Snapshot
//!
//! Point-in-time view of a wallet's token holdings in UI units.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token balances of one wallet, keyed by mint, captured at a single instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Wallet the balances belong to
    pub wallet: String,
    /// When the balances were read
    pub captured_at: DateTime<Utc>,
    /// Mint -> UI amount (decimals already applied)
    pub balances: HashMap<String, f64>,
    /// Set when the read failed and `balances` is a stand-in empty map
    #[serde(default)]
    pub degraded: bool,
}

impl BalanceSnapshot {
    pub fn new(wallet: impl Into<String>, balances: HashMap<String, f64>) -> Self {
        Self {
            wallet: wallet.into(),
            captured_at: Utc::now(),
            balances,
            degraded: false,
        }
    }

    /// Empty snapshot standing in for a failed read
    pub fn degraded(wallet: impl Into<String>) -> Self {
        Self {
            wallet: wallet.into(),
            captured_at: Utc::now(),
            balances: HashMap::new(),
            degraded: true,
        }
    }

    /// Balance for `mint`, zero when absent
    pub fn balance(&self, mint: &str) -> f64 {
        self.balances.get(mint).copied().unwrap_or(0.0)
    }

    pub fn token_count(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Build from `(mint, amount)` pairs, useful for fixtures
    pub fn from_pairs<I, S>(wallet: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let balances = pairs.into_iter().map(|(m, a)| (m.into(), a)).collect();
        Self::new(wallet, balances)
    }
}
