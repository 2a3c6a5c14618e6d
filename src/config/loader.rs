//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config.toml structure.

use serde::Deserialize;
use solana_sdk::commitment_config::CommitmentConfig;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::adapters::jupiter::{JupiterConfig, DEFAULT_JUPITER_API_URL};
use crate::domain::DEFAULT_DUST_THRESHOLD;
use crate::strategy::{IncreasePolicy, TradeDecisionPolicy, SOL_MINT};

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub tracking: TrackingSection,
    #[serde(default)]
    pub trading: TradingSection,
    #[serde(default)]
    pub jupiter: JupiterSection,
    pub solana: SolanaSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub alerts: AlertsSection,
}

/// Tracked wallet and change detection
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingSection {
    /// Wallet whose balance changes are mirrored
    pub target_wallet: String,
    /// Minimum spacing between balance reads triggered by activity
    #[serde(default = "default_min_check_interval_ms")]
    pub min_check_interval_ms: u64,
    /// Balances at or below this are treated as zero
    #[serde(default = "default_dust_threshold")]
    pub dust_threshold: f64,
    /// Periodic read when the activity feed is quiet (0 disables)
    #[serde(default)]
    pub fallback_poll_secs: u64,
    /// Capacity of the activity channel
    #[serde(default = "default_activity_buffer")]
    pub activity_buffer: usize,
}

impl TrackingSection {
    pub fn min_check_interval(&self) -> Duration {
        Duration::from_millis(self.min_check_interval_ms)
    }

    pub fn fallback_poll(&self) -> Option<Duration> {
        (self.fallback_poll_secs > 0).then(|| Duration::from_secs(self.fallback_poll_secs))
    }
}

/// Mirrored trade sizing and execution mode
#[derive(Debug, Clone, Deserialize)]
pub struct TradingSection {
    /// Asset spent on buys and received on sells
    #[serde(default = "default_base_mint")]
    pub base_mint: String,
    /// Fixed buy size in lamports (0.05 SOL default)
    #[serde(default = "default_trade_size_lamports")]
    pub trade_size_lamports: u64,
    /// Slippage tolerance in basis points (1% = 100 bps)
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u16,
    /// "observe_only" or "fractional_buy"
    #[serde(default = "default_increase_policy")]
    pub increase_policy: String,
    /// Share of `trade_size_lamports` bought on an increase under fractional_buy
    #[serde(default = "default_increase_fraction")]
    pub increase_fraction: f64,
    /// Quote but never sign
    #[serde(default)]
    pub paper_mode: bool,
    /// Priority fee in lamports attached to swaps (0 = none)
    #[serde(default)]
    pub priority_fee_lamports: u64,
}

impl Default for TradingSection {
    fn default() -> Self {
        Self {
            base_mint: default_base_mint(),
            trade_size_lamports: default_trade_size_lamports(),
            slippage_bps: default_slippage_bps(),
            increase_policy: default_increase_policy(),
            increase_fraction: default_increase_fraction(),
            paper_mode: false,
            priority_fee_lamports: 0,
        }
    }
}

impl TradingSection {
    pub fn parsed_increase_policy(&self) -> Result<IncreasePolicy, ConfigError> {
        match self.increase_policy.as_str() {
            "observe_only" => Ok(IncreasePolicy::ObserveOnly),
            "fractional_buy" => Ok(IncreasePolicy::FractionalBuy {
                fraction: self.increase_fraction,
            }),
            other => Err(ConfigError::ValidationError(format!(
                "increase_policy must be \"observe_only\" or \"fractional_buy\", got \"{}\"",
                other
            ))),
        }
    }
}

/// Jupiter API configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct JupiterSection {
    #[serde(default = "default_jupiter_url")]
    pub api_base_url: String,
    /// Optional API key for higher rate limits (get from jup.ag)
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for JupiterSection {
    fn default() -> Self {
        Self {
            api_base_url: default_jupiter_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl JupiterSection {
    /// Get API key with environment variable fallback
    /// Checks JUPITER_API_KEY env var if config value is empty/None
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var("JUPITER_API_KEY").ok().filter(|k| !k.is_empty())
    }

    pub fn client_config(&self) -> JupiterConfig {
        JupiterConfig {
            api_base_url: self.api_base_url.clone(),
            api_key: self.get_api_key(),
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
        }
    }
}

/// Solana RPC configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct SolanaSection {
    /// RPC endpoint (use private RPC for production)
    pub rpc_url: String,
    /// Websocket endpoint for the activity feed; derived from rpc_url when empty
    #[serde(default)]
    pub ws_url: String,
    /// Commitment level: "processed", "confirmed", "finalized"
    #[serde(default = "default_commitment")]
    pub commitment: String,
    /// Bot wallet keypair path (NEVER commit this file!)
    pub keypair_path: String,
}

impl SolanaSection {
    /// Get RPC URL with environment variable override
    /// Checks SOLANA_RPC_URL env var first, falls back to config value
    pub fn get_rpc_url(&self) -> String {
        std::env::var("SOLANA_RPC_URL").unwrap_or_else(|_| self.rpc_url.clone())
    }

    /// Checks SOLANA_WS_URL, then the config value, then rewrites the RPC scheme
    pub fn get_ws_url(&self) -> String {
        if let Ok(url) = std::env::var("SOLANA_WS_URL") {
            return url;
        }
        if !self.ws_url.is_empty() {
            return self.ws_url.clone();
        }
        derive_ws_url(&self.get_rpc_url())
    }

    /// Get keypair path with environment variable override
    /// Checks SOLANA_KEYPAIR_PATH env var first, falls back to config value
    pub fn get_keypair_path(&self) -> String {
        std::env::var("SOLANA_KEYPAIR_PATH").unwrap_or_else(|_| self.keypair_path.clone())
    }

    pub fn commitment_config(&self) -> Result<CommitmentConfig, ConfigError> {
        match self.commitment.as_str() {
            "processed" => Ok(CommitmentConfig::processed()),
            "confirmed" => Ok(CommitmentConfig::confirmed()),
            "finalized" => Ok(CommitmentConfig::finalized()),
            other => Err(ConfigError::ValidationError(format!(
                "commitment must be processed, confirmed or finalized, got \"{}\"",
                other
            ))),
        }
    }
}

/// `https://` -> `wss://`, `http://` -> `ws://`
pub fn derive_ws_url(rpc_url: &str) -> String {
    if let Some(rest) = rpc_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = rpc_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        rpc_url.to_string()
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Alerts configuration section (optional)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AlertsSection {
    /// Enable Discord webhook notifications
    #[serde(default)]
    pub discord_enabled: bool,
    /// Discord webhook URL
    #[serde(default)]
    pub discord_webhook_url: String,
    /// Enable Telegram notifications
    #[serde(default)]
    pub telegram_enabled: bool,
    /// Telegram bot token
    #[serde(default)]
    pub telegram_bot_token: String,
    /// Telegram chat ID
    #[serde(default)]
    pub telegram_chat_id: String,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

fn default_min_check_interval_ms() -> u64 {
    50
}

fn default_dust_threshold() -> f64 {
    DEFAULT_DUST_THRESHOLD
}

fn default_activity_buffer() -> usize {
    1024
}

fn default_base_mint() -> String {
    SOL_MINT.to_string()
}

fn default_trade_size_lamports() -> u64 {
    50_000_000
}

fn default_slippage_bps() -> u16 {
    100
}

fn default_increase_policy() -> String {
    "observe_only".to_string()
}

fn default_increase_fraction() -> f64 {
    0.5
}

fn default_jupiter_url() -> String {
    DEFAULT_JUPITER_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracking.target_wallet.is_empty() {
            return Err(ConfigError::ValidationError(
                "target_wallet cannot be empty".to_string(),
            ));
        }

        if self.tracking.dust_threshold.is_nan() || self.tracking.dust_threshold < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "dust_threshold must be >= 0, got {}",
                self.tracking.dust_threshold
            )));
        }

        if self.tracking.activity_buffer == 0 {
            return Err(ConfigError::ValidationError(
                "activity_buffer must be > 0".to_string(),
            ));
        }

        if self.trading.slippage_bps == 0 || self.trading.slippage_bps > 10_000 {
            return Err(ConfigError::ValidationError(format!(
                "slippage_bps must be 1-10000, got {}",
                self.trading.slippage_bps
            )));
        }

        self.decision_policy()?
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.jupiter.api_base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "api_base_url cannot be empty".to_string(),
            ));
        }

        if self.solana.rpc_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "rpc_url cannot be empty".to_string(),
            ));
        }

        if self.solana.keypair_path.is_empty() {
            return Err(ConfigError::ValidationError(
                "keypair_path cannot be empty".to_string(),
            ));
        }

        self.solana.commitment_config()?;

        if self.alerts.discord_enabled && self.alerts.discord_webhook_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "discord_enabled requires discord_webhook_url".to_string(),
            ));
        }

        if self.alerts.telegram_enabled
            && (self.alerts.telegram_bot_token.is_empty() || self.alerts.telegram_chat_id.is_empty())
        {
            return Err(ConfigError::ValidationError(
                "telegram_enabled requires telegram_bot_token and telegram_chat_id".to_string(),
            ));
        }

        Ok(())
    }

    /// Trade decision policy described by the `[trading]` section
    pub fn decision_policy(&self) -> Result<TradeDecisionPolicy, ConfigError> {
        Ok(
            TradeDecisionPolicy::new(&self.trading.base_mint, self.trading.trade_size_lamports)
                .with_increase_policy(self.trading.parsed_increase_policy()?),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[tracking]
target_wallet = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU"
min_check_interval_ms = 100
dust_threshold = 0.001
fallback_poll_secs = 30

[trading]
base_mint = "So11111111111111111111111111111111111111112"
trade_size_lamports = 50000000
slippage_bps = 100
increase_policy = "observe_only"
paper_mode = true

[jupiter]
api_base_url = "https://api.jup.ag/swap/v1"
timeout_secs = 10
max_retries = 5

[solana]
rpc_url = "https://api.mainnet-beta.solana.com"
commitment = "confirmed"
keypair_path = "~/.config/solana/id.json"

[logging]
level = "info"

[alerts]
discord_enabled = false
discord_webhook_url = ""
telegram_enabled = false
telegram_bot_token = ""
telegram_chat_id = ""
"#
        .to_string()
    }

    fn load_str(content: &str) -> Result<Config, ConfigError> {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        load_config(file.path())
    }

    #[test]
    fn test_load_valid_config() {
        let config = load_str(&create_valid_config()).unwrap();

        assert_eq!(config.tracking.min_check_interval(), Duration::from_millis(100));
        assert_eq!(config.tracking.fallback_poll(), Some(Duration::from_secs(30)));
        assert_eq!(config.tracking.activity_buffer, 1024);
        assert_eq!(config.trading.trade_size_lamports, 50_000_000);
        assert!(config.trading.paper_mode);
        assert_eq!(config.jupiter.client_config().max_retries, 5);
        assert_eq!(config.jupiter.client_config().timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let minimal = r#"
[tracking]
target_wallet = "Tracked111"

[solana]
rpc_url = "http://localhost:8899"
keypair_path = "/tmp/id.json"
"#;
        let config = load_str(minimal).unwrap();

        assert_eq!(config.tracking.min_check_interval_ms, 50);
        assert_eq!(config.tracking.fallback_poll(), None);
        assert_eq!(config.trading.base_mint, SOL_MINT);
        assert_eq!(config.trading.slippage_bps, 100);
        assert_eq!(config.jupiter.api_base_url, DEFAULT_JUPITER_API_URL);
        assert_eq!(config.logging.level, "info");
        assert!(!config.alerts.discord_enabled);

        let policy = config.decision_policy().unwrap();
        assert_eq!(policy.increase_policy(), IncreasePolicy::ObserveOnly);
        assert_eq!(policy.trade_size_lamports(), 50_000_000);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let result = load_str("[tracking\ntarget_wallet = 1");
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_fractional_buy_policy() {
        let config = load_str(&create_valid_config().replace(
            "increase_policy = \"observe_only\"",
            "increase_policy = \"fractional_buy\"\nincrease_fraction = 0.25",
        ))
        .unwrap();

        assert_eq!(
            config.decision_policy().unwrap().increase_policy(),
            IncreasePolicy::FractionalBuy { fraction: 0.25 }
        );
    }

    #[test]
    fn test_invalid_increase_fraction() {
        let result = load_str(&create_valid_config().replace(
            "increase_policy = \"observe_only\"",
            "increase_policy = \"fractional_buy\"\nincrease_fraction = 1.5",
        ));
        assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_unknown_increase_policy() {
        let result = load_str(&create_valid_config().replace("observe_only", "double_down"));
        assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_invalid_trade_size() {
        let result = load_str(
            &create_valid_config().replace("trade_size_lamports = 50000000", "trade_size_lamports = 0"),
        );
        assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_invalid_slippage() {
        let result = load_str(&create_valid_config().replace("slippage_bps = 100", "slippage_bps = 20000"));
        assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_empty_target_wallet() {
        let result = load_str(&create_valid_config().replace(
            "target_wallet = \"7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU\"",
            "target_wallet = \"\"",
        ));
        assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_invalid_commitment() {
        let result = load_str(&create_valid_config().replace("commitment = \"confirmed\"", "commitment = \"max\""));
        assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_enabled_alert_requires_credentials() {
        let result = load_str(&create_valid_config().replace("discord_enabled = false", "discord_enabled = true"));
        assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));

        let result = load_str(&create_valid_config().replace("telegram_enabled = false", "telegram_enabled = true"));
        assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_shipped_config_is_valid() {
        let config = load_config(concat!(env!("CARGO_MANIFEST_DIR"), "/config/mainnet.toml")).unwrap();
        assert!(config.trading.paper_mode);
        assert_eq!(config.tracking.fallback_poll(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_derive_ws_url() {
        assert_eq!(derive_ws_url("https://api.mainnet-beta.solana.com"), "wss://api.mainnet-beta.solana.com");
        assert_eq!(derive_ws_url("http://localhost:8899"), "ws://localhost:8899");
        assert_eq!(derive_ws_url("wss://already"), "wss://already");
    }
}
