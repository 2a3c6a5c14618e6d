//! Recording mocks for the ports, shared by unit and integration tests

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{SwapAmount, SwapCommand, SwapFill};
use super::chain::{ActivityNotification, ChainClient, ChainError};
use super::execution::{ExecutionError, SwapExecutor};
use super::notifier::{Notification, Notifier, NotifyError};

/// Mock chain client with scripted balance reads and a manual activity feed
#[derive(Debug)]
pub struct MockChain {
    calls: Arc<Mutex<Vec<String>>>,
    responses: Arc<Mutex<HashMap<String, VecDeque<Option<HashMap<String, f64>>>>>>,
    activity_tx: mpsc::Sender<ActivityNotification>,
    activity_rx: Mutex<Option<mpsc::Receiver<ActivityNotification>>>,
}

impl Default for MockChain {
    fn default() -> Self {
        let (activity_tx, activity_rx) = mpsc::channel(64);
        Self {
            calls: Arc::default(),
            responses: Arc::default(),
            activity_tx,
            activity_rx: Mutex::new(Some(activity_rx)),
        }
    }
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to queue a balance read for `wallet`.
    /// The last queued read repeats once the queue is drained.
    pub fn with_balances(self, wallet: &str, balances: &[(&str, f64)]) -> Self {
        self.push_balances(wallet, balances);
        self
    }

    /// Builder method to queue a failing read for `wallet`
    pub fn with_failure(self, wallet: &str) -> Self {
        self.push_failure(wallet);
        self
    }

    pub fn push_balances(&self, wallet: &str, balances: &[(&str, f64)]) {
        let map = balances.iter().map(|(m, a)| (m.to_string(), *a)).collect();
        self.responses
            .lock()
            .unwrap()
            .entry(wallet.to_string())
            .or_default()
            .push_back(Some(map));
    }

    pub fn push_failure(&self, wallet: &str) {
        self.responses
            .lock()
            .unwrap()
            .entry(wallet.to_string())
            .or_default()
            .push_back(None);
    }

    /// Sender feeding the receiver handed out by `subscribe_activity`
    pub fn activity_sender(&self) -> mpsc::Sender<ActivityNotification> {
        self.activity_tx.clone()
    }

    /// Get all recorded balance reads
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn fetch_balances(&self, wallet: &str) -> Result<HashMap<String, f64>, ChainError> {
        self.calls.lock().unwrap().push(wallet.to_string());

        let mut responses = self.responses.lock().unwrap();
        let queue = responses
            .get_mut(wallet)
            .ok_or_else(|| ChainError::RpcError(format!("No response configured for {}", wallet)))?;
        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };

        match next.flatten() {
            Some(balances) => Ok(balances),
            None => Err(ChainError::RpcError("scripted failure".to_string())),
        }
    }

    async fn subscribe_activity(
        &self,
        _wallet: &str,
    ) -> Result<mpsc::Receiver<ActivityNotification>, ChainError> {
        self.activity_rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| ChainError::SubscriptionError("already subscribed".to_string()))
    }
}

/// Mock swap executor that records commands and replays scripted fills
#[derive(Debug, Default)]
pub struct MockSwapExecutor {
    calls: Arc<Mutex<Vec<SwapCommand>>>,
    responses: Arc<Mutex<HashMap<String, VecDeque<Result<f64, String>>>>>,
    default_out: Option<f64>,
}

impl MockSwapExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: fill every unscripted swap with `out_amount`
    pub fn with_default_fill(mut self, out_amount: f64) -> Self {
        self.default_out = Some(out_amount);
        self
    }

    /// Builder method to script the next fill for swaps touching `mint`
    pub fn with_fill(self, mint: &str, out_amount: f64) -> Self {
        self.script(mint, Ok(out_amount));
        self
    }

    /// Builder method to script the next swap touching `mint` to fail
    pub fn with_failure(self, mint: &str, error: &str) -> Self {
        self.script(mint, Err(error.to_string()));
        self
    }

    fn script(&self, mint: &str, response: Result<f64, String>) {
        self.responses
            .lock()
            .unwrap()
            .entry(mint.to_string())
            .or_default()
            .push_back(response);
    }

    /// Get all recorded swap commands
    pub fn get_calls(&self) -> Vec<SwapCommand> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, command: SwapCommand, in_amount: f64) -> Result<SwapFill, ExecutionError> {
        let mint = command.token_mint().to_string();
        let call_no = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(command);
            calls.len()
        };

        let scripted = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&mint)
            .and_then(|queue| queue.pop_front());

        let out_amount = match scripted {
            Some(Ok(out)) => out,
            Some(Err(e)) => return Err(ExecutionError::ExecutionError(e)),
            None => self
                .default_out
                .ok_or_else(|| ExecutionError::ApiError("No response configured".to_string()))?,
        };

        Ok(SwapFill {
            in_amount,
            out_amount,
            signature: Some(format!("mock-swap-{}", call_no)),
            dex: Some("MockDex".to_string()),
        })
    }
}

#[async_trait]
impl SwapExecutor for MockSwapExecutor {
    async fn buy(
        &self,
        input_mint: &str,
        output_mint: &str,
        lamports: u64,
    ) -> Result<SwapFill, ExecutionError> {
        let command = SwapCommand::buy(input_mint, output_mint, lamports);
        self.respond(command, lamports as f64 / 1_000_000_000.0)
    }

    async fn sell(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: SwapAmount,
    ) -> Result<SwapFill, ExecutionError> {
        let percent = match amount {
            SwapAmount::Percent(pct) => pct,
            SwapAmount::Lamports(_) => {
                return Err(ExecutionError::InvalidParameters(
                    "sell takes a percentage".to_string(),
                ))
            }
        };
        let command = SwapCommand::sell_percent(input_mint, output_mint, percent);
        self.respond(command, 0.0)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Notifier that keeps every delivered notification
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    delivered: Arc<Mutex<Vec<Notification>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: record, then report every delivery as failed
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.delivered.lock().unwrap().push(notification.clone());
        if self.fail {
            return Err(NotifyError::Delivery("scripted failure".to_string()));
        }
        Ok(())
    }
}
