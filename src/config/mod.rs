//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    derive_ws_url, load_config, AlertsSection, Config, ConfigError, JupiterSection, LoggingSection,
    SolanaSection, TrackingSection, TradingSection,
};
