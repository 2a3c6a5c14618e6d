//! Position Ledger
//!
//! Shadow copy of the bot wallet's per-token holdings (UI units). Seeded from an
//! on-chain read at startup and afterwards changed only by confirmed swap fills.

use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("Invalid fill amount: {0}")]
    InvalidAmount(f64),
    #[error("Invalid sell percent: {0}")]
    InvalidPercent(f64),
    #[error("No position held in {0}")]
    NoPosition(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionLedger {
    holdings: HashMap<String, f64>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from an on-chain balance read, dropping zero balances
    pub fn from_balances(balances: HashMap<String, f64>) -> Self {
        let holdings = balances.into_iter().filter(|(_, amount)| *amount > 0.0).collect();
        Self { holdings }
    }

    /// Held amount, zero when the mint is unknown
    pub fn held(&self, mint: &str) -> f64 {
        self.holdings.get(mint).copied().unwrap_or(0.0)
    }

    pub fn holds(&self, mint: &str) -> bool {
        self.held(mint) > 0.0
    }

    /// Record a confirmed buy. The first fill sets the position, later fills add to it.
    pub fn apply_buy(&mut self, mint: &str, out_amount: f64) -> Result<f64, LedgerError> {
        if !out_amount.is_finite() || out_amount <= 0.0 {
            return Err(LedgerError::InvalidAmount(out_amount));
        }
        let entry = self.holdings.entry(mint.to_string()).or_insert(0.0);
        *entry += out_amount;
        Ok(*entry)
    }

    /// Record a confirmed sell of `percent` of the current holding.
    ///
    /// Returns the amount removed. At 100% the entry is removed outright.
    pub fn apply_sell(&mut self, mint: &str, percent: f64) -> Result<f64, LedgerError> {
        if percent.is_nan() || percent <= 0.0 || percent > 100.0 {
            return Err(LedgerError::InvalidPercent(percent));
        }
        let held = self.held(mint);
        if held <= 0.0 {
            return Err(LedgerError::NoPosition(mint.to_string()));
        }

        if percent >= 100.0 {
            self.holdings.remove(mint);
            return Ok(held);
        }

        let sold = held * percent / 100.0;
        self.holdings.insert(mint.to_string(), held - sold);
        Ok(sold)
    }

    /// Mints with a positive holding
    pub fn open_positions(&self) -> Vec<(String, f64)> {
        let mut positions: Vec<(String, f64)> = self
            .holdings
            .iter()
            .filter(|(_, amount)| **amount > 0.0)
            .map(|(mint, amount)| (mint.clone(), *amount))
            .collect();
        positions.sort_by(|a, b| a.0.cmp(&b.0));
        positions
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_first_buy_sets_position() {
        let mut ledger = PositionLedger::new();
        ledger.apply_buy("TKN", 1234.5).unwrap();
        assert_eq!(ledger.held("TKN"), 1234.5);
        assert!(ledger.holds("TKN"));
    }

    #[test]
    fn test_later_buys_accumulate() {
        let mut ledger = PositionLedger::new();
        ledger.apply_buy("TKN", 10.0).unwrap();
        ledger.apply_buy("TKN", 5.0).unwrap();
        assert_eq!(ledger.held("TKN"), 15.0);
    }

    #[test]
    fn test_full_sell_clears_position() {
        let mut ledger = PositionLedger::new();
        ledger.apply_buy("TKN", 10.0).unwrap();
        let sold = ledger.apply_sell("TKN", 100.0).unwrap();
        assert_eq!(sold, 10.0);
        assert_eq!(ledger.held("TKN"), 0.0);
        assert!(!ledger.holds("TKN"));
    }

    #[test]
    fn test_partial_sell_reduces_proportionally() {
        let mut ledger = PositionLedger::new();
        ledger.apply_buy("TKN", 1000.0).unwrap();
        let sold = ledger.apply_sell("TKN", 40.0).unwrap();
        assert_relative_eq!(sold, 400.0, epsilon = 1e-9);
        assert_relative_eq!(ledger.held("TKN"), 600.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sell_without_position_fails() {
        let mut ledger = PositionLedger::new();
        assert_eq!(
            ledger.apply_sell("TKN", 50.0),
            Err(LedgerError::NoPosition("TKN".to_string()))
        );
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let mut ledger = PositionLedger::new();
        assert!(matches!(ledger.apply_buy("TKN", 0.0), Err(LedgerError::InvalidAmount(_))));
        assert!(matches!(ledger.apply_buy("TKN", f64::NAN), Err(LedgerError::InvalidAmount(_))));
        ledger.apply_buy("TKN", 1.0).unwrap();
        assert!(matches!(ledger.apply_sell("TKN", 0.0), Err(LedgerError::InvalidPercent(_))));
        assert!(matches!(ledger.apply_sell("TKN", 150.0), Err(LedgerError::InvalidPercent(_))));
    }

    #[test]
    fn test_seed_drops_empty_accounts() {
        let mut balances = HashMap::new();
        balances.insert("AAA".to_string(), 5.0);
        balances.insert("BBB".to_string(), 0.0);
        let ledger = PositionLedger::from_balances(balances);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.open_positions(), vec![("AAA".to_string(), 5.0)]);
    }
}
