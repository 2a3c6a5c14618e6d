//! Performance Metrics
//!
//! Latency and success counters for mirrored trades within one session.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Swap latencies in milliseconds, in dispatch-completion order
    pub latencies: Vec<u64>,
    pub successful_trades: u64,
    pub total_trades: u64,
    pub api_call_count: u64,
}

/// Derived figures for reporting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub avg_ms: f64,
    pub min_ms: u64,
    pub max_ms: u64,
    pub p95_ms: u64,
    pub success_rate_pct: f64,
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_trade(&mut self, latency_ms: u64, success: bool) {
        self.total_trades += 1;
        if success {
            self.successful_trades += 1;
        }
        self.latencies.push(latency_ms);
    }

    pub fn record_api_call(&mut self) {
        self.api_call_count += 1;
    }

    pub fn failed_trades(&self) -> u64 {
        self.total_trades.saturating_sub(self.successful_trades)
    }

    /// `None` until at least one trade has been recorded
    pub fn summary(&self) -> Option<LatencySummary> {
        if self.latencies.is_empty() {
            return None;
        }

        let mut sorted = self.latencies.clone();
        sorted.sort_unstable();
        let sum: u64 = sorted.iter().sum();
        let p95_index = ((sorted.len() as f64 * 0.95).ceil() as usize).saturating_sub(1);

        Some(LatencySummary {
            avg_ms: sum as f64 / sorted.len() as f64,
            min_ms: sorted[0],
            max_ms: sorted[sorted.len() - 1],
            p95_ms: sorted[p95_index.min(sorted.len() - 1)],
            success_rate_pct: self.successful_trades as f64 / self.total_trades as f64 * 100.0,
        })
    }
}
