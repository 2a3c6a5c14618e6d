//! Snapshot Source
//!
//! Turns the chain client's activity feed into a stream of balance snapshots
//! for the tracked wallet. Duplicate signatures are dropped, failed
//! transactions are ignored and bursts inside the minimum check interval are
//! coalesced into a single fetch.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::{BalanceSnapshot, SeenSignatures, TrackerState};
use crate::ports::{ActivityNotification, ChainClient, ChainError, MetricsSink};

/// Default minimum time between two balance fetches
pub const DEFAULT_MIN_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// A fetched snapshot and the notifications that caused the fetch, in arrival order.
/// `triggers` is empty for the initial read and fallback polls.
#[derive(Debug, Clone)]
pub struct TriggeredSnapshot {
    pub snapshot: BalanceSnapshot,
    pub triggers: Vec<ActivityNotification>,
}

impl TriggeredSnapshot {
    /// Signature of the most recent trigger
    pub fn latest_signature(&self) -> Option<&str> {
        self.triggers.last().map(|n| n.signature.as_str())
    }
}

pub struct SnapshotSource {
    chain: Arc<dyn ChainClient>,
    metrics: Arc<dyn MetricsSink>,
    wallet: String,
    min_check_interval: Duration,
    fallback_poll: Option<Duration>,
    activity: Option<mpsc::Receiver<ActivityNotification>>,
    pending: Vec<ActivityNotification>,
    started_at: Instant,
    last_fetch: Option<Instant>,
}

impl SnapshotSource {
    pub fn new(chain: Arc<dyn ChainClient>, metrics: Arc<dyn MetricsSink>, wallet: impl Into<String>) -> Self {
        Self {
            chain,
            metrics,
            wallet: wallet.into(),
            min_check_interval: DEFAULT_MIN_CHECK_INTERVAL,
            fallback_poll: None,
            activity: None,
            pending: Vec::new(),
            started_at: Instant::now(),
            last_fetch: None,
        }
    }

    pub fn with_min_check_interval(mut self, interval: Duration) -> Self {
        self.min_check_interval = interval;
        self
    }

    /// Fetch at least this often even without activity
    pub fn with_fallback_poll(mut self, interval: Option<Duration>) -> Self {
        self.fallback_poll = interval.filter(|d| !d.is_zero());
        self
    }

    pub fn wallet(&self) -> &str {
        &self.wallet
    }

    /// Open the activity feed for the tracked wallet
    pub async fn subscribe(&mut self) -> Result<(), ChainError> {
        let rx = self.chain.subscribe_activity(&self.wallet).await?;
        info!("Subscribed to activity of {}", self.wallet);
        self.activity = Some(rx);
        Ok(())
    }

    /// Read the tracked wallet now. Never fails: a read error yields a degraded snapshot.
    pub async fn poll(&self) -> BalanceSnapshot {
        self.poll_wallet(&self.wallet).await
    }

    /// Read any wallet now, degrading on error
    pub async fn poll_wallet(&self, wallet: &str) -> BalanceSnapshot {
        self.metrics.record_api_call();
        match self.chain.fetch_balances(wallet).await {
            Ok(balances) => BalanceSnapshot::new(wallet, balances),
            Err(e) => {
                warn!("Balance read for {} failed, using degraded snapshot: {}", wallet, e);
                BalanceSnapshot::degraded(wallet)
            }
        }
    }

    /// Fetch immediately, consuming any pending triggers
    pub async fn fetch_now(&mut self) -> TriggeredSnapshot {
        self.last_fetch = Some(Instant::now());
        let triggers = std::mem::take(&mut self.pending);
        let snapshot = self.poll().await;
        TriggeredSnapshot { snapshot, triggers }
    }

    /// Register an incoming notification.
    ///
    /// Returns `true` if it now waits for a fetch. Duplicates are dropped
    /// without side effects; failed transactions are marked seen only.
    pub fn accept(&mut self, notification: ActivityNotification, seen: &mut SeenSignatures) -> bool {
        if !seen.insert(&notification.signature) {
            debug!("Duplicate signature {} dropped", notification.signature);
            return false;
        }
        if notification.is_failed() {
            debug!(
                "Failed transaction {} ignored: {}",
                notification.signature,
                notification.err.as_deref().unwrap_or_default()
            );
            return false;
        }
        self.pending.push(notification);
        true
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Whether the minimum check interval has elapsed since the last fetch
    pub fn should_fetch(&self, now: Instant) -> bool {
        match self.last_fetch {
            Some(last) => now.saturating_duration_since(last) >= self.min_check_interval,
            None => true,
        }
    }

    fn debounce_deadline(&self) -> Option<Instant> {
        if self.pending.is_empty() {
            return None;
        }
        Some(
            self.last_fetch
                .map(|last| last + self.min_check_interval)
                .unwrap_or_else(Instant::now),
        )
    }

    fn fallback_deadline(&self) -> Option<Instant> {
        self.fallback_poll
            .map(|every| self.last_fetch.unwrap_or(self.started_at) + every)
    }

    /// Wait for the next snapshot worth classifying.
    ///
    /// Returns `None` once the activity feed has closed, nothing is pending
    /// and no fallback poll is configured.
    pub async fn next(&mut self, state: &mut TrackerState) -> Option<TriggeredSnapshot> {
        loop {
            if !self.pending.is_empty() && self.should_fetch(Instant::now()) {
                debug!("Fetching after {} notification(s)", self.pending.len());
                return Some(self.fetch_now().await);
            }

            let debounce = self.debounce_deadline();
            let fallback = self.fallback_deadline();
            if self.activity.is_none() && debounce.is_none() && fallback.is_none() {
                return None;
            }

            tokio::select! {
                received = recv_from(&mut self.activity) => match received {
                    Some(notification) => {
                        self.accept(notification, &mut state.signatures);
                    }
                    None => {
                        warn!("Activity feed for {} closed", self.wallet);
                        self.activity = None;
                    }
                },
                _ = sleep_until(debounce) => {}
                _ = sleep_until(fallback) => {
                    debug!("Fallback poll of {}", self.wallet);
                    return Some(self.fetch_now().await);
                }
            }
        }
    }
}

async fn recv_from(
    activity: &mut Option<mpsc::Receiver<ActivityNotification>>,
) -> Option<ActivityNotification> {
    match activity {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::metrics::InMemoryMetrics;
    use crate::ports::mocks::MockChain;

    const WALLET: &str = "Tracked111";

    fn source(chain: Arc<MockChain>) -> SnapshotSource {
        SnapshotSource::new(chain, Arc::new(InMemoryMetrics::new()), WALLET)
            .with_min_check_interval(Duration::from_millis(30))
    }

    #[tokio::test]
    async fn test_poll_degrades_on_failure() {
        let chain = Arc::new(MockChain::new().with_failure(WALLET));
        let metrics = Arc::new(InMemoryMetrics::new());
        let source = SnapshotSource::new(chain, metrics.clone(), WALLET);

        let snapshot = source.poll().await;
        assert!(snapshot.degraded);
        assert!(snapshot.is_empty());
        assert_eq!(metrics.snapshot().api_call_count, 1);
    }

    #[tokio::test]
    async fn test_accept_dedups_and_skips_failed() {
        let chain = Arc::new(MockChain::new().with_balances(WALLET, &[]));
        let mut source = source(chain);
        let mut seen = SeenSignatures::default();

        assert!(source.accept(ActivityNotification::new("sig1", 1), &mut seen));
        assert!(!source.accept(ActivityNotification::new("sig1", 1), &mut seen));
        assert!(!source.accept(ActivityNotification::failed("sig2", 2, "InstructionError"), &mut seen));
        assert!(seen.contains("sig2"));
        assert_eq!(source.pending(), 1);
    }

    #[tokio::test]
    async fn test_should_fetch_respects_interval() {
        let chain = Arc::new(MockChain::new().with_balances(WALLET, &[]));
        let mut source = source(chain);
        assert!(source.should_fetch(Instant::now()));

        source.fetch_now().await;
        let now = Instant::now();
        assert!(!source.should_fetch(now));
        assert!(source.should_fetch(now + Duration::from_millis(30)));
    }

    #[tokio::test]
    async fn test_burst_is_coalesced_into_one_fetch() {
        let chain = Arc::new(MockChain::new().with_balances(WALLET, &[("TKN", 5.0)]));
        let tx = chain.activity_sender();
        let mut source = source(chain.clone());
        source.subscribe().await.unwrap();
        let mut state = TrackerState::new();

        source.fetch_now().await;
        for sig in ["a", "b", "a", "c"] {
            tx.send(ActivityNotification::new(sig, 1)).await.unwrap();
        }

        let triggered = source.next(&mut state).await.unwrap();
        let sigs: Vec<&str> = triggered.triggers.iter().map(|n| n.signature.as_str()).collect();
        assert_eq!(sigs, vec!["a", "b", "c"]);
        assert_eq!(triggered.latest_signature(), Some("c"));
        assert_eq!(triggered.snapshot.balance("TKN"), 5.0);
        assert_eq!(chain.get_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_transactions_never_fetch() {
        let chain = Arc::new(MockChain::new().with_balances(WALLET, &[]));
        let tx = chain.activity_sender();
        let mut source = source(chain.clone());
        source.subscribe().await.unwrap();
        let mut state = TrackerState::new();

        tx.send(ActivityNotification::failed("bad", 1, "err")).await.unwrap();

        // the feed stays open, so stop waiting after a short while
        let next = tokio::time::timeout(Duration::from_millis(100), source.next(&mut state)).await;
        assert!(next.is_err());
        assert!(state.signatures.contains("bad"));
        assert_eq!(source.pending(), 0);
    }

    #[tokio::test]
    async fn test_fallback_poll_without_activity() {
        let chain = Arc::new(MockChain::new().with_balances(WALLET, &[("TKN", 1.0)]));
        let mut source = source(chain).with_fallback_poll(Some(Duration::from_millis(20)));
        let mut state = TrackerState::new();

        let triggered = tokio::time::timeout(Duration::from_secs(2), source.next(&mut state))
            .await
            .unwrap()
            .unwrap();
        assert!(triggered.triggers.is_empty());
        assert_eq!(triggered.snapshot.balance("TKN"), 1.0);
    }

    #[tokio::test]
    async fn test_ends_without_feed_or_fallback() {
        let chain = Arc::new(MockChain::new().with_balances(WALLET, &[]));
        let mut source = source(chain);
        let mut state = TrackerState::new();
        assert!(source.next(&mut state).await.is_none());
    }
}
