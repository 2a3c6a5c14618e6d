//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Wallet balance reads and activity feeds (Solana RPC)
//! - Swap execution (Jupiter)
//! - Alert delivery
//! - Trade metrics

pub mod chain;
pub mod execution;
pub mod notifier;
pub mod metrics;
pub mod mocks;

// Re-export main traits and types
pub use chain::{ActivityNotification, ChainClient, ChainError};
pub use execution::{ExecutionError, SwapExecutor};
pub use notifier::{Notification, NotificationDetail, Notifier, NotifyError, Perspective};
pub use metrics::MetricsSink;
