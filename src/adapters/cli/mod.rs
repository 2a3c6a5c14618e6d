//! CLI Adapter
//!
//! Command-line interface for the wallet mirror bot.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{CliApp, Command, RunCmd, SnapshotCmd, StatusCmd};

/// Parse process arguments
pub fn init() -> CliApp {
    use clap::Parser;
    CliApp::parse()
}
