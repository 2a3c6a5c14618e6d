//! Jupiter Swap Executor
//!
//! Live `SwapExecutor`: quote, build, sign with the bot keypair, send and
//! confirm. Reported amounts are the quoted amounts converted to UI units.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::adapters::solana::{SolanaClient, WalletManager};
use crate::domain::{SwapAmount, SwapFill};
use crate::ports::{ExecutionError, SwapExecutor};
use super::client::JupiterClient;
use super::quote::{QuoteRequest, QuoteResponse};
use super::swap::SwapRequest;

/// Base units to sell for `amount` of a `held_raw` balance
pub fn resolve_sell_amount(held_raw: u64, amount: SwapAmount, mint: &str) -> Result<u64, ExecutionError> {
    if held_raw == 0 {
        return Err(ExecutionError::EmptyBalance(mint.to_string()));
    }
    let raw = match amount {
        SwapAmount::Percent(pct) => {
            if pct.is_nan() || pct <= 0.0 || pct > 100.0 {
                return Err(ExecutionError::InvalidParameters(format!("sell percent {}", pct)));
            }
            if pct >= 100.0 {
                held_raw
            } else {
                (held_raw as f64 * pct / 100.0).floor() as u64
            }
        }
        SwapAmount::Lamports(units) => units.min(held_raw),
    };
    if raw == 0 {
        return Err(ExecutionError::InvalidParameters(format!(
            "sell of {} rounds to zero base units",
            mint
        )));
    }
    Ok(raw)
}

/// Convert a quote into a fill using the mints' decimals
pub(crate) async fn fill_from_quote(
    solana: &SolanaClient,
    quote: &QuoteResponse,
    signature: Option<String>,
) -> Result<SwapFill, ExecutionError> {
    let in_decimals = solana
        .get_decimals(&quote.input_mint)
        .await
        .map_err(|e| ExecutionError::ApiError(e.to_string()))?;
    let out_decimals = solana
        .get_decimals(&quote.output_mint)
        .await
        .map_err(|e| ExecutionError::ApiError(e.to_string()))?;

    Ok(SwapFill {
        in_amount: spl_token::amount_to_ui_amount(quote.input_amount(), in_decimals),
        out_amount: spl_token::amount_to_ui_amount(quote.output_amount(), out_decimals),
        signature,
        dex: quote.venue(),
    })
}

pub struct JupiterExecutor {
    jupiter: JupiterClient,
    solana: SolanaClient,
    wallet: Arc<WalletManager>,
    slippage_bps: u16,
    priority_fee_lamports: u64,
}

impl JupiterExecutor {
    pub fn new(jupiter: JupiterClient, solana: SolanaClient, wallet: Arc<WalletManager>, slippage_bps: u16) -> Self {
        Self {
            jupiter,
            solana,
            wallet,
            slippage_bps,
            priority_fee_lamports: 0,
        }
    }

    pub fn with_priority_fee(mut self, lamports: u64) -> Self {
        self.priority_fee_lamports = lamports;
        self
    }

    async fn swap(&self, input_mint: &str, output_mint: &str, amount: u64) -> Result<SwapFill, ExecutionError> {
        let quote = self
            .jupiter
            .get_quote(&QuoteRequest::new(input_mint, output_mint, amount, self.slippage_bps))
            .await?;
        debug!(
            "Quote {} -> {}: {} in, {} out via {} (impact {}%)",
            input_mint,
            output_mint,
            quote.in_amount,
            quote.out_amount,
            quote.route_labels(),
            quote.price_impact_pct
        );

        let quote_json = serde_json::to_value(&quote)
            .map_err(|e| ExecutionError::InvalidParameters(e.to_string()))?;
        let request = SwapRequest::new(self.wallet.public_key(), quote_json)
            .with_priority_fee(self.priority_fee_lamports);
        let swap = self.jupiter.get_swap_transaction(&request).await?;

        let signed = self
            .wallet
            .sign_serialized(&swap.swap_transaction)
            .map_err(|e| ExecutionError::SigningError(e.to_string()))?;
        let signature = self
            .solana
            .send_and_confirm_transaction(&signed)
            .await
            .map_err(|e| ExecutionError::ExecutionError(e.to_string()))?;
        info!("Swap {} -> {} confirmed: {}", input_mint, output_mint, signature);

        fill_from_quote(&self.solana, &quote, Some(signature)).await
    }
}

#[async_trait]
impl SwapExecutor for JupiterExecutor {
    async fn buy(&self, input_mint: &str, output_mint: &str, lamports: u64) -> Result<SwapFill, ExecutionError> {
        if lamports == 0 {
            return Err(ExecutionError::InvalidParameters("buy size is zero".into()));
        }
        self.swap(input_mint, output_mint, lamports).await
    }

    async fn sell(&self, input_mint: &str, output_mint: &str, amount: SwapAmount) -> Result<SwapFill, ExecutionError> {
        let holding = self
            .solana
            .get_token_holding(&self.wallet.public_key(), input_mint)
            .await
            .map_err(|e| ExecutionError::ApiError(e.to_string()))?;
        let raw = resolve_sell_amount(holding.raw_amount, amount, input_mint)?;

        self.swap(input_mint, output_mint, raw).await
    }

    fn name(&self) -> &str {
        "jupiter"
    }
}
