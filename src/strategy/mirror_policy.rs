//! Mirror Policy
//!
//! Maps a tracked-wallet transition plus the bot's current holdings to at most
//! one swap command. Each event is judged on its own.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::{PositionLedger, SwapCommand, TransitionEvent, TransitionKind};

/// Wrapped SOL, the default base asset
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("Trade size must be positive")]
    ZeroTradeSize,
    #[error("Increase fraction must be in (0, 1], got {0}")]
    InvalidFraction(f64),
    #[error("Base mint must not be empty")]
    EmptyBaseMint,
}

/// What to do when the tracked wallet adds to an existing position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum IncreasePolicy {
    /// Alert only
    #[default]
    ObserveOnly,
    /// Buy `trade_size * fraction`
    FractionalBuy { fraction: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeDecisionPolicy {
    base_mint: String,
    trade_size_lamports: u64,
    increase_policy: IncreasePolicy,
}

impl Default for TradeDecisionPolicy {
    fn default() -> Self {
        Self {
            base_mint: SOL_MINT.to_string(),
            trade_size_lamports: 50_000_000, // 0.05 SOL
            increase_policy: IncreasePolicy::ObserveOnly,
        }
    }
}

impl TradeDecisionPolicy {
    pub fn new(base_mint: impl Into<String>, trade_size_lamports: u64) -> Self {
        Self {
            base_mint: base_mint.into(),
            trade_size_lamports,
            increase_policy: IncreasePolicy::ObserveOnly,
        }
    }

    pub fn with_increase_policy(mut self, policy: IncreasePolicy) -> Self {
        self.increase_policy = policy;
        self
    }

    pub fn base_mint(&self) -> &str {
        &self.base_mint
    }

    pub fn trade_size_lamports(&self) -> u64 {
        self.trade_size_lamports
    }

    pub fn increase_policy(&self) -> IncreasePolicy {
        self.increase_policy
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.base_mint.is_empty() {
            return Err(PolicyError::EmptyBaseMint);
        }
        if self.trade_size_lamports == 0 {
            return Err(PolicyError::ZeroTradeSize);
        }
        if let IncreasePolicy::FractionalBuy { fraction } = self.increase_policy {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(PolicyError::InvalidFraction(fraction));
            }
        }
        Ok(())
    }

    /// Decide the mirrored action for one event, if any
    pub fn decide(&self, event: &TransitionEvent, ledger: &PositionLedger) -> Option<SwapCommand> {
        // the base asset moves with every mirrored trade
        if event.mint == self.base_mint {
            return None;
        }

        match event.kind {
            TransitionKind::NewPosition => Some(SwapCommand::buy(
                &self.base_mint,
                &event.mint,
                self.trade_size_lamports,
            )),
            TransitionKind::Increase => match self.increase_policy {
                IncreasePolicy::ObserveOnly => {
                    debug!("Increase in {} observed, no buy", event.mint);
                    None
                }
                IncreasePolicy::FractionalBuy { fraction } => {
                    if !ledger.holds(&event.mint) {
                        debug!("Increase in {} ignored, bot holds none", event.mint);
                        return None;
                    }
                    let lamports = (self.trade_size_lamports as f64 * fraction).floor() as u64;
                    if lamports == 0 {
                        return None;
                    }
                    Some(SwapCommand::buy(&self.base_mint, &event.mint, lamports))
                }
            },
            TransitionKind::PartialDecrease => {
                if !ledger.holds(&event.mint) {
                    debug!("Partial sell of {} ignored, bot holds none", event.mint);
                    return None;
                }
                let percent = event.decrease_percent()?;
                Some(SwapCommand::sell_percent(&event.mint, &self.base_mint, percent))
            }
            TransitionKind::FullExit => {
                if !ledger.holds(&event.mint) {
                    return None;
                }
                Some(SwapCommand::sell_percent(&event.mint, &self.base_mint, 100.0))
            }
        }
    }
}
