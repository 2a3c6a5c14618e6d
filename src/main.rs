//! Wallet Mirror - Solana copy-trading bot
//!
//! Mirrors a tracked wallet's token positions into a bot wallet via Jupiter.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use wallet_mirror::adapters::cli::{self, Command, RunCmd, SnapshotCmd, StatusCmd};
use wallet_mirror::adapters::{
    DiscordNotifier, FanoutNotifier, InMemoryMetrics, JupiterClient, JupiterExecutor, LogNotifier,
    PaperExecutor, SolanaClient, TelegramNotifier, WalletManager,
};
use wallet_mirror::application::{ExecutionCoordinator, MirrorTracker, SnapshotSource};
use wallet_mirror::config::{load_config, Config};
use wallet_mirror::domain::{DiffClassifier, PositionLedger};
use wallet_mirror::ports::{ChainClient, MetricsSink, Notifier, SwapExecutor};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in config.toml)
    dotenvy::dotenv().ok();

    let app = cli::init();
    let config = load_config(&app.config)
        .with_context(|| format!("Failed to load configuration from {}", app.config.display()))?;

    let level = if app.debug {
        "debug"
    } else if app.verbose {
        "info"
    } else {
        config.logging.level.as_str()
    };
    init_logging(level);

    match app.command {
        Command::Run(cmd) => run_command(config, cmd).await,
        Command::Snapshot(cmd) => snapshot_command(config, cmd).await,
        Command::Status(cmd) => status_command(config, cmd).await,
    }
}

/// RUST_LOG wins over the CLI flags and the config level
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter).with_target(false).init();
}

fn solana_client(config: &Config) -> Result<SolanaClient> {
    let commitment = config.solana.commitment_config()?;
    Ok(
        SolanaClient::with_commitment(config.solana.get_rpc_url(), config.solana.get_ws_url(), commitment)
            .with_activity_buffer(config.tracking.activity_buffer),
    )
}

async fn run_command(config: Config, cmd: RunCmd) -> Result<()> {
    let paper = cmd.paper || config.trading.paper_mode;
    tracing::info!("Starting wallet mirror...");

    let solana = solana_client(&config)?;
    let chain: Arc<dyn ChainClient> = Arc::new(solana.clone());
    let jupiter = JupiterClient::with_config(config.jupiter.client_config())
        .context("Failed to create Jupiter client")?;

    let keypair_path = config.solana.get_keypair_path();
    let wallet = match load_wallet_with_context(&keypair_path, paper) {
        Ok(w) => w,
        Err(e) => {
            if paper {
                tracing::warn!("Wallet not found at '{}' - using random wallet for paper trading", keypair_path);
                WalletManager::new_random()
            } else {
                return Err(e);
            }
        }
    };
    let bot_wallet = wallet.public_key();

    let executor: Arc<dyn SwapExecutor> = if paper {
        tracing::warn!("PAPER TRADING MODE - swaps are quoted, never sent");
        Arc::new(PaperExecutor::new(jupiter, solana.clone(), config.trading.slippage_bps))
    } else {
        Arc::new(
            JupiterExecutor::new(jupiter, solana.clone(), Arc::new(wallet), config.trading.slippage_bps)
                .with_priority_fee(config.trading.priority_fee_lamports),
        )
    };

    let metrics = Arc::new(InMemoryMetrics::new().with_report_every(10));
    let notifier = build_notifier(&config)?;
    let policy = config.decision_policy()?;

    let coordinator = ExecutionCoordinator::new(
        executor,
        notifier,
        metrics.clone(),
        config.tracking.target_wallet.clone(),
        bot_wallet,
    );
    if !paper {
        coordinator
            .bootstrap(chain.as_ref())
            .await
            .context("Failed to read bot wallet positions")?;
    }

    let mut source = SnapshotSource::new(chain, metrics.clone(), config.tracking.target_wallet.clone())
        .with_min_check_interval(config.tracking.min_check_interval())
        .with_fallback_poll(config.tracking.fallback_poll());
    source
        .subscribe()
        .await
        .context("Failed to subscribe to tracked wallet activity")?;

    let mut tracker = MirrorTracker::new(
        source,
        DiffClassifier::new(config.tracking.dust_threshold),
        policy,
        Arc::new(coordinator),
    );

    let shutdown = tracker.shutdown_handle();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        shutdown.notify_one();
    });

    tracker.run().await;

    metrics.log_summary();
    let totals = metrics.snapshot();
    tracing::info!(
        "Wallet mirror stopped: {} trade(s), {} failed, {} API call(s)",
        totals.total_trades,
        totals.failed_trades(),
        totals.api_call_count
    );
    Ok(())
}

fn build_notifier(config: &Config) -> Result<Arc<dyn Notifier>> {
    let mut fanout = FanoutNotifier::new().with(Arc::new(LogNotifier));

    if config.alerts.discord_enabled {
        fanout = fanout.with(Arc::new(
            DiscordNotifier::new(config.alerts.discord_webhook_url.clone())
                .context("Invalid Discord alert settings")?,
        ));
    }
    if config.alerts.telegram_enabled {
        fanout = fanout.with(Arc::new(
            TelegramNotifier::new(
                config.alerts.telegram_bot_token.clone(),
                config.alerts.telegram_chat_id.clone(),
            )
            .context("Invalid Telegram alert settings")?,
        ));
    }

    tracing::info!("{} alert target(s) configured", fanout.len());
    Ok(Arc::new(fanout))
}

async fn snapshot_command(config: Config, cmd: SnapshotCmd) -> Result<()> {
    let wallet = cmd.wallet.unwrap_or_else(|| config.tracking.target_wallet.clone());
    let solana = solana_client(&config)?;

    let balances = solana
        .fetch_balances(&wallet)
        .await
        .with_context(|| format!("Failed to read balances of {}", wallet))?;

    let mut rows: Vec<_> = balances.into_iter().collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));

    println!("Wallet: {}", wallet);
    println!("Tokens: {}", rows.len());
    for (mint, amount) in rows {
        println!("  {:<44} {:>20.6}", mint, amount);
    }
    Ok(())
}

async fn status_command(config: Config, cmd: StatusCmd) -> Result<()> {
    let solana = solana_client(&config)?;
    let wallet = load_wallet_with_context(&config.solana.get_keypair_path(), false)?;

    let balances = solana
        .fetch_balances(&wallet.public_key())
        .await
        .context("Failed to read bot wallet balances")?;
    let ledger = PositionLedger::from_balances(balances);
    let lamports = solana
        .get_balance(&wallet.public_key())
        .await
        .context("Failed to get balance")?;

    match cmd.format.as_str() {
        "json" => {
            let positions: serde_json::Map<String, serde_json::Value> = ledger
                .open_positions()
                .into_iter()
                .map(|(mint, amount)| (mint, serde_json::json!(amount)))
                .collect();
            let out = serde_json::json!({
                "wallet": wallet.public_key(),
                "lamports": lamports,
                "positions": positions,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        _ => {
            println!("Wallet: {}", wallet.public_key());
            println!("Balance: {} lamports ({:.4} SOL)", lamports, lamports as f64 / 1e9);
            println!("Open positions: {}", ledger.len());
            for (mint, amount) in ledger.open_positions() {
                println!("  {:<44} {:>20.6}", mint, amount);
            }
        }
    }
    Ok(())
}

/// Load wallet with helpful error messages
fn load_wallet_with_context(keypair_path: &str, is_paper_mode: bool) -> Result<WalletManager> {
    let expanded = shellexpand::tilde(keypair_path).to_string();
    let path = Path::new(&expanded);

    if !path.exists() {
        let mode_hint = if is_paper_mode {
            "In paper mode, a random wallet will be used instead."
        } else {
            "A wallet is required for live mirroring."
        };

        bail!(
            "Wallet file not found: {}\n\n\
             {}\n\n\
             To create a new wallet, run:\n  \
             solana-keygen new --outfile {}",
            keypair_path,
            mode_hint,
            keypair_path
        );
    }

    WalletManager::from_file(&expanded).map_err(|e| {
        anyhow::anyhow!(
            "Failed to load wallet from '{}': {}\n\n\
             Expected format: JSON array of bytes (e.g., [1,2,3,...])",
            keypair_path,
            e
        )
    })
}
