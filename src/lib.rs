//! Wallet Mirror - Solana copy-trading library
//!
//! Watches a tracked wallet's token balances, classifies each change and
//! mirrors it into a bot wallet through Jupiter.
//!
//! # Modules
//!
//! - `domain`: Core logic (BalanceSnapshot, DiffClassifier, PositionLedger, TrackerState)
//! - `ports`: Trait abstractions (ChainClient, SwapExecutor, Notifier, MetricsSink)
//! - `strategy`: Trade decisions (TradeDecisionPolicy, IncreasePolicy)
//! - `adapters`: External implementations (Solana, Jupiter, paper, alerts, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Snapshot source, execution coordinator and tracker loop

pub mod domain;
pub mod ports;
pub mod strategy;
pub mod adapters;
pub mod config;
pub mod application;
