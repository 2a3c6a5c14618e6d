//! Execution Coordinator
//!
//! Dispatches swap commands against the bot wallet, times them, and folds the
//! outcome into the position ledger, the metrics sink and the alert stream.
//! The ledger is written here and nowhere else.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::domain::{
    PositionLedger, SignatureCorrelator, SwapAmount, SwapCommand, SwapDirection, SwapFill,
    TradeOutcome, TransitionEvent,
};
use crate::ports::{
    ChainClient, ChainError, ExecutionError, MetricsSink, Notification, NotificationDetail,
    Notifier, SwapExecutor,
};

pub struct ExecutionCoordinator {
    ledger: Arc<RwLock<PositionLedger>>,
    executor: Arc<dyn SwapExecutor>,
    notifier: Arc<dyn Notifier>,
    metrics: Arc<dyn MetricsSink>,
    correlator: Arc<SignatureCorrelator>,
    tracked_wallet: String,
    bot_wallet: String,
}

impl ExecutionCoordinator {
    pub fn new(
        executor: Arc<dyn SwapExecutor>,
        notifier: Arc<dyn Notifier>,
        metrics: Arc<dyn MetricsSink>,
        tracked_wallet: impl Into<String>,
        bot_wallet: impl Into<String>,
    ) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(PositionLedger::new())),
            executor,
            notifier,
            metrics,
            correlator: Arc::new(SignatureCorrelator::new()),
            tracked_wallet: tracked_wallet.into(),
            bot_wallet: bot_wallet.into(),
        }
    }

    /// Start from a known ledger instead of an empty one
    pub fn with_ledger(mut self, ledger: PositionLedger) -> Self {
        self.ledger = Arc::new(RwLock::new(ledger));
        self
    }

    /// Share a correlator with the tracker
    pub fn with_correlator(mut self, correlator: Arc<SignatureCorrelator>) -> Self {
        self.correlator = correlator;
        self
    }

    pub fn correlator(&self) -> Arc<SignatureCorrelator> {
        self.correlator.clone()
    }

    pub fn metrics(&self) -> Arc<dyn MetricsSink> {
        self.metrics.clone()
    }

    pub fn bot_wallet(&self) -> &str {
        &self.bot_wallet
    }

    /// Seed the ledger from the bot wallet's on-chain balances.
    /// Returns the number of open positions.
    pub async fn bootstrap(&self, chain: &dyn ChainClient) -> Result<usize, ChainError> {
        let balances = chain.fetch_balances(&self.bot_wallet).await?;
        let ledger = PositionLedger::from_balances(balances);
        let open = ledger.open_positions().len();

        *self.ledger.write().await = ledger;
        info!("Ledger seeded from {} with {} open position(s)", self.bot_wallet, open);
        Ok(open)
    }

    /// Consistent copy of the ledger
    pub async fn ledger_view(&self) -> PositionLedger {
        self.ledger.read().await.clone()
    }

    /// Alert on `event` and run `command`, if any.
    /// Never fails: swap and delivery errors end up in the outcome, the logs and the metrics.
    pub async fn handle(&self, event: &TransitionEvent, command: Option<&SwapCommand>) -> Option<TradeOutcome> {
        info!(
            "{} {} ({:.4} -> {:.4})",
            event.kind, event.mint, event.old_balance, event.new_balance
        );
        let tracked = Notification::for_transition(
            &self.tracked_wallet,
            event,
            self.correlator.lookup(&event.mint),
        );
        self.deliver(&tracked).await;

        let command = command?;
        let mint = command.token_mint().to_string();

        let started = Instant::now();
        let result = self.dispatch(command).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let (outcome, detail) = match result {
            Ok(fill) => {
                let detail = self.apply_fill(command, &fill).await;
                self.metrics.record_trade(latency_ms, true);
                info!(
                    "{} {} filled in {}ms via {}",
                    command.direction,
                    mint,
                    latency_ms,
                    fill.dex.as_deref().unwrap_or("unknown")
                );
                (TradeOutcome::filled(&fill, latency_ms), detail)
            }
            Err(e) => {
                self.metrics.record_trade(latency_ms, false);
                warn!("{} {} failed after {}ms: {}", command.direction, mint, latency_ms, e);
                let detail = NotificationDetail::BotTradeFailed {
                    action: command.direction.to_string(),
                    error: e.to_string(),
                };
                (TradeOutcome::failed(e.to_string(), latency_ms), detail)
            }
        };

        let bot = Notification::for_bot(&self.bot_wallet, &mint, detail)
            .with_signature(outcome.signature.clone())
            .with_venue(outcome.dex.clone())
            .with_latency(latency_ms);
        self.deliver(&bot).await;

        Some(outcome)
    }

    async fn dispatch(&self, command: &SwapCommand) -> Result<SwapFill, ExecutionError> {
        match (command.direction, command.amount) {
            (SwapDirection::Buy, SwapAmount::Lamports(lamports)) => {
                self.executor
                    .buy(&command.input_mint, &command.output_mint, lamports)
                    .await
            }
            (SwapDirection::Sell, amount) => {
                self.executor
                    .sell(&command.input_mint, &command.output_mint, amount)
                    .await
            }
            (SwapDirection::Buy, SwapAmount::Percent(_)) => Err(ExecutionError::InvalidParameters(
                "buys are sized in lamports".to_string(),
            )),
        }
    }

    async fn apply_fill(&self, command: &SwapCommand, fill: &SwapFill) -> NotificationDetail {
        let mint = command.token_mint();
        let mut ledger = self.ledger.write().await;

        match command.direction {
            SwapDirection::Buy => {
                if let Err(e) = ledger.apply_buy(mint, fill.out_amount) {
                    warn!("Ledger not updated for buy of {}: {}", mint, e);
                }
                NotificationDetail::BotBuy {
                    in_amount: fill.in_amount,
                    out_amount: fill.out_amount,
                }
            }
            SwapDirection::Sell => {
                let percent = command.sell_percent_value().unwrap_or(100.0);
                let sold_amount = match ledger.apply_sell(mint, percent) {
                    Ok(sold) => sold,
                    Err(e) => {
                        warn!("Ledger not updated for sell of {}: {}", mint, e);
                        fill.in_amount
                    }
                };
                NotificationDetail::BotSell {
                    percent,
                    sold_amount,
                    out_amount: fill.out_amount,
                }
            }
        }
    }

    async fn deliver(&self, notification: &Notification) {
        if let Err(e) = self.notifier.notify(notification).await {
            error!("Failed to deliver {} alert for {}: {}", notification.title(), notification.mint, e);
        }
    }
}
