//! CLI Command Definitions
//!
//! Argument parsing for the wallet-mirror binary. Handlers live in `main`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Wallet Mirror - copy a tracked Solana wallet's trades through Jupiter
#[derive(Parser, Debug)]
#[command(
    name = "wallet-mirror",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Mirror a tracked Solana wallet's token positions into a bot wallet",
    long_about = "Wallet Mirror watches a target wallet's token balances, classifies every \
                  change (new position, increase, partial sell, full exit) and mirrors it \
                  into the bot wallet with Jupiter swaps."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/mainnet.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start mirroring the tracked wallet
    Run(RunCmd),

    /// Print a wallet's current token balances
    Snapshot(SnapshotCmd),

    /// Print the bot wallet's open positions
    Status(StatusCmd),
}

#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Quote swaps but never sign or send them
    #[arg(short, long)]
    pub paper: bool,
}

#[derive(Parser, Debug)]
pub struct SnapshotCmd {
    /// Wallet to read (defaults to the configured target wallet)
    #[arg(value_name = "WALLET")]
    pub wallet: Option<String>,
}

#[derive(Parser, Debug)]
pub struct StatusCmd {
    /// Output format (text, json)
    #[arg(short, long, value_name = "FORMAT", default_value = "text")]
    pub format: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_paper() {
        let app = CliApp::try_parse_from(["wallet-mirror", "run", "--paper", "-c", "my.toml"]).unwrap();
        assert_eq!(app.config, PathBuf::from("my.toml"));
        assert!(matches!(app.command, Command::Run(RunCmd { paper: true })));
    }

    #[test]
    fn test_parse_snapshot_wallet() {
        let app = CliApp::try_parse_from(["wallet-mirror", "--debug", "snapshot", "Wallet111"]).unwrap();
        assert!(app.debug);
        match app.command {
            Command::Snapshot(cmd) => assert_eq!(cmd.wallet.as_deref(), Some("Wallet111")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let app = CliApp::try_parse_from(["wallet-mirror", "status"]).unwrap();
        assert_eq!(app.config, PathBuf::from("config/mainnet.toml"));
        assert!(!app.verbose);
        match app.command {
            Command::Status(cmd) => assert_eq!(cmd.format, "text"),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(CliApp::try_parse_from(["wallet-mirror", "backtest"]).is_err());
    }
}
