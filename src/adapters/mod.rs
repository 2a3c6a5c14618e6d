//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Solana: RPC balance reads, activity feed and wallet management
//! - Jupiter: DEX aggregator swap execution
//! - Paper: quote-only execution
//! - Alerts: Discord, Telegram and log notifiers
//! - Metrics: in-memory latency and success counters
//! - CLI: Command-line interface definitions

pub mod jupiter;
pub mod solana;
pub mod paper;
pub mod alerts;
pub mod metrics;
pub mod cli;

pub use jupiter::{JupiterClient, JupiterExecutor};
pub use solana::{SolanaClient, WalletManager};
pub use paper::PaperExecutor;
pub use alerts::{DiscordNotifier, FanoutNotifier, LogNotifier, TelegramNotifier};
pub use metrics::InMemoryMetrics;
pub use cli::CliApp;
