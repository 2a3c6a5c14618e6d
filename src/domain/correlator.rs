//! Signature Correlator
//!
//! Remembers, per mint, the latest activity signature seen right before the
//! mint's balance changed. Used only to attribute alerts to a transaction.
//!
//! Attribution is best-effort: one fetched snapshot can cover several
//! notifications and only the most recent signature per mint is kept.

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct SignatureCorrelator {
    latest: Mutex<HashMap<String, String>>,
}

impl SignatureCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `signature` with the latest balance change of `mint`
    pub fn record(&self, mint: &str, signature: &str) {
        if let Ok(mut latest) = self.latest.lock() {
            latest.insert(mint.to_string(), signature.to_string());
        }
    }

    pub fn lookup(&self, mint: &str) -> Option<String> {
        self.latest.lock().ok().and_then(|latest| latest.get(mint).cloned())
    }

    pub fn forget(&self, mint: &str) {
        if let Ok(mut latest) = self.latest.lock() {
            latest.remove(mint);
        }
    }

    pub fn len(&self) -> usize {
        self.latest.lock().map(|latest| latest.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
