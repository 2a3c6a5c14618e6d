use crate::domain::PerformanceMetrics;

/// Aggregates trade latency and throughput. Implementations synchronise internally.
pub trait MetricsSink: Send + Sync {
    fn record_trade(&self, latency_ms: u64, success: bool);

    fn record_api_call(&self);

    /// Copy of the counters as of now
    fn snapshot(&self) -> PerformanceMetrics;

    /// Start a new session
    fn reset(&self);
}
