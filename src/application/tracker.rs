//! Mirror Tracker
//!
//! Drives one pass per snapshot: classify against the previous baseline,
//! decide per event, then fan the commands out to the coordinator and wait
//! for all of them before the next pass starts.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::domain::{DiffClassifier, SignatureCorrelator, TrackerState, TradeOutcome, TransitionEvent};
use crate::strategy::TradeDecisionPolicy;

use super::coordinator::ExecutionCoordinator;
use super::snapshot_source::{SnapshotSource, TriggeredSnapshot};

/// What one pass did
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    pub events: Vec<TransitionEvent>,
    pub outcomes: Vec<TradeOutcome>,
    /// Set when the snapshot was degraded and the baseline was kept
    pub skipped: bool,
}

pub struct MirrorTracker {
    source: SnapshotSource,
    classifier: DiffClassifier,
    policy: TradeDecisionPolicy,
    coordinator: Arc<ExecutionCoordinator>,
    correlator: Arc<SignatureCorrelator>,
    state: TrackerState,
    shutdown: Arc<Notify>,
    passes: u64,
}

impl MirrorTracker {
    pub fn new(
        source: SnapshotSource,
        classifier: DiffClassifier,
        policy: TradeDecisionPolicy,
        coordinator: Arc<ExecutionCoordinator>,
    ) -> Self {
        let correlator = coordinator.correlator();
        Self {
            source,
            classifier,
            policy,
            coordinator,
            correlator,
            state: TrackerState::new(),
            shutdown: Arc::new(Notify::new()),
            passes: 0,
        }
    }

    /// Handle that stops `run` between passes
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    pub fn source_mut(&mut self) -> &mut SnapshotSource {
        &mut self.source
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Capture the baseline, then process snapshots until the source ends or shutdown is requested
    pub async fn run(&mut self) {
        info!(
            "Mirroring {} into {} | dust {} | trade size {} lamports",
            self.source.wallet(),
            self.coordinator.bot_wallet(),
            self.classifier.dust_threshold(),
            self.policy.trade_size_lamports()
        );

        let initial = self.source.fetch_now().await;
        self.process_pass(initial).await;

        let shutdown = self.shutdown.clone();
        loop {
            tokio::select! {
                next = self.source.next(&mut self.state) => match next {
                    Some(triggered) => {
                        self.process_pass(triggered).await;
                    }
                    None => {
                        info!("Snapshot source ended");
                        break;
                    }
                },
                _ = shutdown.notified() => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        info!("Tracker stopped after {} pass(es)", self.passes);
    }

    /// Process one snapshot against the current baseline
    pub async fn process_pass(&mut self, triggered: TriggeredSnapshot) -> PassReport {
        self.passes += 1;
        let latest_signature = triggered.latest_signature().map(str::to_string);
        let new = triggered.snapshot;

        let old = match self.state.advance(new.clone()) {
            Err(_) => {
                warn!("Degraded snapshot of {}, keeping previous baseline", new.wallet);
                return PassReport {
                    skipped: true,
                    ..PassReport::default()
                };
            }
            Ok(None) => {
                info!("Baseline captured: {} token(s)", new.token_count());
                return PassReport::default();
            }
            Ok(Some(old)) => old,
        };

        let ledger = self.coordinator.ledger_view().await;
        let events = self.classifier.classify(&old, &new, |mint| ledger.holds(mint));
        if events.is_empty() {
            debug!("No balance changes in pass {}", self.passes);
            return PassReport::default();
        }

        // an untriggered change must not inherit an older transaction
        for event in &events {
            match &latest_signature {
                Some(signature) => self.correlator.record(&event.mint, signature),
                None => self.correlator.forget(&event.mint),
            }
        }

        let jobs = events.iter().map(|event| {
            let command = self.policy.decide(event, &ledger);
            let coordinator = self.coordinator.clone();
            async move { coordinator.handle(event, command.as_ref()).await }
        });
        let outcomes: Vec<TradeOutcome> = join_all(jobs).await.into_iter().flatten().collect();

        info!(
            "Pass {}: {} event(s), {} trade(s), {} filled",
            self.passes,
            events.len(),
            outcomes.len(),
            outcomes.iter().filter(|o| o.success).count()
        );

        PassReport {
            events,
            outcomes,
            skipped: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::metrics::InMemoryMetrics;
    use crate::domain::{BalanceSnapshot, TransitionKind};
    use crate::ports::mocks::{MockChain, MockSwapExecutor, RecordingNotifier};
    use crate::ports::{ActivityNotification, MetricsSink};
    use crate::strategy::SOL_MINT;

    const TRACKED: &str = "Tracked111";

    struct Harness {
        tracker: MirrorTracker,
        coordinator: Arc<ExecutionCoordinator>,
        metrics: Arc<InMemoryMetrics>,
    }

    fn harness(executor: MockSwapExecutor) -> Harness {
        let chain = Arc::new(MockChain::new().with_balances(TRACKED, &[]));
        let metrics = Arc::new(InMemoryMetrics::new());
        let coordinator = Arc::new(ExecutionCoordinator::new(
            Arc::new(executor),
            Arc::new(RecordingNotifier::new()),
            metrics.clone(),
            TRACKED,
            "Bot111",
        ));
        let source = SnapshotSource::new(chain, metrics.clone(), TRACKED);
        let tracker = MirrorTracker::new(
            source,
            DiffClassifier::default(),
            TradeDecisionPolicy::new(SOL_MINT, 50_000_000),
            coordinator.clone(),
        );
        Harness { tracker, coordinator, metrics }
    }

    fn triggered(pairs: &[(&str, f64)], sigs: &[&str]) -> TriggeredSnapshot {
        TriggeredSnapshot {
            snapshot: BalanceSnapshot::from_pairs(TRACKED, pairs.iter().map(|(m, a)| (*m, *a))),
            triggers: sigs.iter().map(|s| ActivityNotification::new(*s, 1)).collect(),
        }
    }

    #[tokio::test]
    async fn test_first_snapshot_is_baseline() {
        let mut h = harness(MockSwapExecutor::new());
        let report = h.tracker.process_pass(triggered(&[("TKN", 50.0)], &[])).await;
        assert!(report.events.is_empty());
        assert!(h.tracker.state().previous().is_some());
    }

    #[tokio::test]
    async fn test_new_position_then_exit() {
        let mut h = harness(
            MockSwapExecutor::new()
                .with_fill("TKN", 1000.0)
                .with_fill("TKN", 0.05),
        );
        h.tracker.process_pass(triggered(&[], &[])).await;

        let report = h.tracker.process_pass(triggered(&[("TKN", 50.0)], &["buy-sig"])).await;
        assert_eq!(report.events[0].kind, TransitionKind::NewPosition);
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(h.coordinator.ledger_view().await.held("TKN"), 1000.0);
        assert_eq!(h.coordinator.correlator().lookup("TKN").as_deref(), Some("buy-sig"));

        let report = h.tracker.process_pass(triggered(&[], &["sell-sig"])).await;
        assert_eq!(report.events[0].kind, TransitionKind::FullExit);
        assert!(h.coordinator.ledger_view().await.is_empty());
        assert_eq!(h.metrics.snapshot().total_trades, 2);
    }

    #[tokio::test]
    async fn test_untriggered_change_drops_stale_signature() {
        let mut h = harness(MockSwapExecutor::new().with_default_fill(100.0));
        h.tracker.process_pass(triggered(&[], &[])).await;
        h.tracker.process_pass(triggered(&[("TKN", 50.0)], &["buy-sig"])).await;
        assert_eq!(h.coordinator.correlator().lookup("TKN").as_deref(), Some("buy-sig"));

        // fallback poll picks up an increase with no activity notification
        let report = h.tracker.process_pass(triggered(&[("TKN", 80.0)], &[])).await;
        assert_eq!(report.events[0].kind, TransitionKind::Increase);
        assert!(h.coordinator.correlator().lookup("TKN").is_none());
    }

    #[tokio::test]
    async fn test_degraded_snapshot_keeps_baseline() {
        let mut h = harness(MockSwapExecutor::new().with_default_fill(10.0));
        h.tracker.process_pass(triggered(&[], &[])).await;
        h.tracker.process_pass(triggered(&[("TKN", 30.0)], &[])).await;

        let degraded = TriggeredSnapshot {
            snapshot: BalanceSnapshot::degraded(TRACKED),
            triggers: Vec::new(),
        };
        let report = h.tracker.process_pass(degraded).await;
        assert!(report.skipped);
        assert!(report.events.is_empty());
        assert!(h.coordinator.ledger_view().await.holds("TKN"));
        assert_eq!(h.tracker.state().previous().unwrap().balance("TKN"), 30.0);
    }

    #[tokio::test]
    async fn test_fan_out_one_command_per_mint() {
        let mut h = harness(MockSwapExecutor::new().with_default_fill(5.0));
        h.tracker.process_pass(triggered(&[("OLD", 1.0)], &[])).await;

        let report = h
            .tracker
            .process_pass(triggered(&[("OLD", 2.0), ("AAA", 1.0), ("BBB", 1.0)], &[]))
            .await;

        // OLD is an observe-only increase
        assert_eq!(report.events.len(), 3);
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(h.metrics.snapshot().total_trades, 2);
        let ledger = h.coordinator.ledger_view().await;
        assert!(ledger.holds("AAA") && ledger.holds("BBB") && !ledger.holds("OLD"));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let mut h = harness(MockSwapExecutor::new());
        let shutdown = h.tracker.shutdown_handle();
        shutdown.notify_one();

        tokio::time::timeout(std::time::Duration::from_secs(2), h.tracker.run())
            .await
            .unwrap();
        assert_eq!(h.tracker.passes(), 1);
    }
}
