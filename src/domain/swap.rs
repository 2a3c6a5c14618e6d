//! Swap commands and their outcomes

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapDirection {
    Buy,
    Sell,
}

impl fmt::Display for SwapDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapDirection::Buy => write!(f, "BUY"),
            SwapDirection::Sell => write!(f, "SELL"),
        }
    }
}

/// How much of the input asset to swap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapAmount {
    /// Fixed amount of the base asset in lamports
    Lamports(u64),
    /// Share of the bot's current holding of the input token
    Percent(f64),
}

impl fmt::Display for SwapAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapAmount::Lamports(lamports) => {
                write!(f, "{:.4} SOL", *lamports as f64 / 1_000_000_000.0)
            }
            SwapAmount::Percent(pct) => write!(f, "{:.2}%", pct),
        }
    }
}

/// A mirrored trade to run against the bot wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapCommand {
    pub direction: SwapDirection,
    pub input_mint: String,
    pub output_mint: String,
    pub amount: SwapAmount,
}

impl SwapCommand {
    /// Spend `lamports` of the base asset on `mint`
    pub fn buy(base_mint: &str, mint: &str, lamports: u64) -> Self {
        Self {
            direction: SwapDirection::Buy,
            input_mint: base_mint.to_string(),
            output_mint: mint.to_string(),
            amount: SwapAmount::Lamports(lamports),
        }
    }

    /// Sell `percent` of the bot's `mint` holding back into the base asset
    pub fn sell_percent(mint: &str, base_mint: &str, percent: f64) -> Self {
        Self {
            direction: SwapDirection::Sell,
            input_mint: mint.to_string(),
            output_mint: base_mint.to_string(),
            amount: SwapAmount::Percent(percent),
        }
    }

    /// The non-base side of the swap
    pub fn token_mint(&self) -> &str {
        match self.direction {
            SwapDirection::Buy => &self.output_mint,
            SwapDirection::Sell => &self.input_mint,
        }
    }

    /// Sell percent, if this is a percentage sell
    pub fn sell_percent_value(&self) -> Option<f64> {
        match (self.direction, self.amount) {
            (SwapDirection::Sell, SwapAmount::Percent(pct)) => Some(pct),
            _ => None,
        }
    }
}

/// What a swap executor reports for a confirmed swap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapFill {
    /// Input spent, UI units of the input asset
    pub in_amount: f64,
    /// Output received, UI units of the output asset
    pub out_amount: f64,
    pub signature: Option<String>,
    /// Venue label of the first route hop (e.g. "Raydium")
    pub dex: Option<String>,
}

/// Result of one dispatched swap command, success or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub success: bool,
    pub out_amount: f64,
    pub signature: Option<String>,
    pub dex: Option<String>,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TradeOutcome {
    pub fn filled(fill: &SwapFill, latency_ms: u64) -> Self {
        Self {
            success: true,
            out_amount: fill.out_amount,
            signature: fill.signature.clone(),
            dex: fill.dex.clone(),
            latency_ms,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            success: false,
            out_amount: 0.0,
            signature: None,
            dex: None,
            latency_ms,
            error: Some(error.into()),
        }
    }
}
