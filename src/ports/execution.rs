use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{SwapAmount, SwapFill};

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("API request failed: {0}")]
    ApiError(String),
    #[error("Transaction signing failed: {0}")]
    SigningError(String),
    #[error("Transaction execution failed: {0}")]
    ExecutionError(String),
    #[error("Slippage tolerance exceeded")]
    SlippageExceeded,
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("Nothing to sell: no {0} balance in the bot wallet")]
    EmptyBalance(String),
}

/// Quote-and-swap service acting on the bot wallet
#[async_trait]
pub trait SwapExecutor: Send + Sync {
    /// Spend `lamports` of `input_mint` on `output_mint`
    async fn buy(
        &self,
        input_mint: &str,
        output_mint: &str,
        lamports: u64,
    ) -> Result<SwapFill, ExecutionError>;

    /// Sell `amount` of the bot's `input_mint` holding into `output_mint`
    async fn sell(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: SwapAmount,
    ) -> Result<SwapFill, ExecutionError>;

    /// Name shown in logs
    fn name(&self) -> &str {
        "swap-executor"
    }
}
