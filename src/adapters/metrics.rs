use std::sync::{Mutex, MutexGuard};

use tracing::info;

use crate::domain::PerformanceMetrics;
use crate::ports::MetricsSink;

/// Process-local metrics sink. Logs a latency summary every `report_every` trades.
///
/// All counters sit behind one lock so a snapshot never sees a trade half-recorded.
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    inner: Mutex<PerformanceMetrics>,
    report_every: u64,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a summary after every `n` trades, 0 disables
    pub fn with_report_every(mut self, n: u64) -> Self {
        self.report_every = n;
        self
    }

    fn lock(&self) -> MutexGuard<'_, PerformanceMetrics> {
        // counters stay usable after a panicking writer
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn log_summary(&self) {
        Self::log(&self.snapshot());
    }

    fn log(metrics: &PerformanceMetrics) {
        match metrics.summary() {
            Some(s) => info!(
                "Trades: {} ({} ok, {:.1}%) | latency avg {:.0}ms min {}ms max {}ms p95 {}ms | API calls: {}",
                metrics.total_trades,
                metrics.successful_trades,
                s.success_rate_pct,
                s.avg_ms,
                s.min_ms,
                s.max_ms,
                s.p95_ms,
                metrics.api_call_count
            ),
            None => info!("No trades yet | API calls: {}", metrics.api_call_count),
        }
    }
}

impl MetricsSink for InMemoryMetrics {
    fn record_trade(&self, latency_ms: u64, success: bool) {
        let due = {
            let mut metrics = self.lock();
            metrics.record_trade(latency_ms, success);
            (self.report_every > 0 && metrics.total_trades % self.report_every == 0).then(|| metrics.clone())
        };

        if let Some(metrics) = due {
            Self::log(&metrics);
        }
    }

    fn record_api_call(&self) {
        self.lock().record_api_call();
    }

    fn snapshot(&self) -> PerformanceMetrics {
        self.lock().clone()
    }

    fn reset(&self) {
        *self.lock() = PerformanceMetrics::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_counts_and_reset() {
        let metrics = InMemoryMetrics::new().with_report_every(2);
        metrics.record_trade(120, true);
        metrics.record_trade(80, false);
        metrics.record_api_call();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_trades, 2);
        assert_eq!(snapshot.successful_trades, 1);
        assert_eq!(snapshot.latencies, vec![120, 80]);
        assert_eq!(snapshot.api_call_count, 1);

        metrics.reset();
        assert_eq!(metrics.snapshot(), PerformanceMetrics::default());
    }

    #[tokio::test]
    async fn test_concurrent_updates() {
        let metrics = Arc::new(InMemoryMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let metrics = metrics.clone();
                tokio::spawn(async move { metrics.record_trade(i, i % 2 == 0) })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_trades, 8);
        assert_eq!(snapshot.successful_trades, 4);
        assert!(snapshot.successful_trades <= snapshot.total_trades);
        assert_eq!(snapshot.latencies.len(), 8);
    }

    #[test]
    fn test_snapshot_never_sees_partial_trade() {
        let metrics = Arc::new(InMemoryMetrics::new());
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let metrics = metrics.clone();
                std::thread::spawn(move || {
                    for _ in 0..5_000 {
                        metrics.record_trade(1, true);
                    }
                })
            })
            .collect();

        let reader = {
            let metrics = metrics.clone();
            std::thread::spawn(move || {
                for _ in 0..2_000 {
                    let snapshot = metrics.snapshot();
                    assert!(snapshot.successful_trades <= snapshot.total_trades);
                    assert_eq!(snapshot.latencies.len() as u64, snapshot.total_trades);
                    assert_eq!(snapshot.failed_trades(), 0);
                }
            })
        };

        for writer in writers {
            writer.join().unwrap();
        }
        reader.join().unwrap();
        assert_eq!(metrics.snapshot().total_trades, 20_000);
    }
}
