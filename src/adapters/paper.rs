//! Paper Execution
//!
//! `SwapExecutor` that prices every swap with a live Jupiter quote but never
//! signs or sends. Simulated holdings are kept in base units so percentage
//! sells resolve the same way as live ones.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use crate::adapters::jupiter::{fill_from_quote, resolve_sell_amount, JupiterClient, QuoteRequest};
use crate::adapters::solana::SolanaClient;
use crate::domain::{SwapAmount, SwapFill};
use crate::ports::{ExecutionError, SwapExecutor};

/// Simulated base-unit holdings per mint
#[derive(Debug, Default)]
pub struct PaperBook {
    holdings: Mutex<HashMap<String, u64>>,
}

impl PaperBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held(&self, mint: &str) -> u64 {
        self.holdings
            .lock()
            .ok()
            .and_then(|h| h.get(mint).copied())
            .unwrap_or(0)
    }

    pub fn credit(&self, mint: &str, raw: u64) {
        if let Ok(mut holdings) = self.holdings.lock() {
            let entry = holdings.entry(mint.to_string()).or_insert(0);
            *entry = entry.saturating_add(raw);
        }
    }

    pub fn debit(&self, mint: &str, raw: u64) {
        if let Ok(mut holdings) = self.holdings.lock() {
            if let Some(entry) = holdings.get_mut(mint) {
                *entry = entry.saturating_sub(raw);
                if *entry == 0 {
                    holdings.remove(mint);
                }
            }
        }
    }
}

pub struct PaperExecutor {
    jupiter: JupiterClient,
    solana: SolanaClient,
    slippage_bps: u16,
    book: PaperBook,
    trade_seq: AtomicU64,
}

impl PaperExecutor {
    pub fn new(jupiter: JupiterClient, solana: SolanaClient, slippage_bps: u16) -> Self {
        Self {
            jupiter,
            solana,
            slippage_bps,
            book: PaperBook::new(),
            trade_seq: AtomicU64::new(0),
        }
    }

    pub fn book(&self) -> &PaperBook {
        &self.book
    }

    async fn simulate(&self, input_mint: &str, output_mint: &str, amount: u64) -> Result<SwapFill, ExecutionError> {
        let quote = self
            .jupiter
            .get_quote(&QuoteRequest::new(input_mint, output_mint, amount, self.slippage_bps))
            .await?;

        self.book.debit(input_mint, quote.input_amount());
        self.book.credit(output_mint, quote.output_amount());

        let id = self.trade_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let fill = fill_from_quote(&self.solana, &quote, Some(format!("paper-{}", id))).await?;
        info!(
            "[PAPER] #{} {} -> {}: {:.6} in, {:.6} out via {}",
            id,
            input_mint,
            output_mint,
            fill.in_amount,
            fill.out_amount,
            quote.route_labels()
        );
        Ok(fill)
    }
}

#[async_trait]
impl SwapExecutor for PaperExecutor {
    async fn buy(&self, input_mint: &str, output_mint: &str, lamports: u64) -> Result<SwapFill, ExecutionError> {
        if lamports == 0 {
            return Err(ExecutionError::InvalidParameters("buy size is zero".into()));
        }
        self.simulate(input_mint, output_mint, lamports).await
    }

    async fn sell(&self, input_mint: &str, output_mint: &str, amount: SwapAmount) -> Result<SwapFill, ExecutionError> {
        let raw = resolve_sell_amount(self.book.held(input_mint), amount, input_mint)?;
        self.simulate(input_mint, output_mint, raw).await
    }

    fn name(&self) -> &str {
        "paper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_credit_and_debit() {
        let book = PaperBook::new();
        book.credit("TKN", 1_000);
        book.credit("TKN", 500);
        assert_eq!(book.held("TKN"), 1_500);

        book.debit("TKN", 600);
        assert_eq!(book.held("TKN"), 900);

        book.debit("TKN", 5_000);
        assert_eq!(book.held("TKN"), 0);
        // debiting an unknown mint is a no-op
        book.debit("SOL", 10);
        assert_eq!(book.held("SOL"), 0);
    }

    #[test]
    fn test_sell_amount_follows_book() {
        let book = PaperBook::new();
        book.credit("TKN", 1_000);
        assert_eq!(resolve_sell_amount(book.held("TKN"), SwapAmount::Percent(25.0), "TKN").unwrap(), 250);
        assert!(resolve_sell_amount(book.held("NONE"), SwapAmount::Percent(25.0), "NONE").is_err());
    }
}
