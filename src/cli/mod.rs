//! CLI module for pennybot
//!
//! Argument parsing with clap and a structured command pattern: each
//! subcommand owns its args struct and an `execute` entry point. Logging is
//! initialized here, once, before any command runs.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod args;
pub mod commands;

pub use args::parse_mode;

use crate::data_paths::{DataPaths, DEFAULT_DATA_DIR};
use crate::logging::{init_logging, LogMode, LoggingConfig};

use commands::book::{BookArgs, BookCommand};
use commands::orders::{OrdersArgs, OrdersCommand};
use commands::run::{RunArgs, RunCommand};

#[derive(Parser)]
#[command(name = "pennybot")]
#[command(version)]
#[command(about = "Automated penny quoting bot for binary-outcome markets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory path (default: ./data)
    #[arg(long, global = true, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log to the session file only, keeping the console quiet
    #[arg(long, global = true)]
    pub log_file_only: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the automation engine
    Run(RunArgs),

    /// Show the normalized order book for an instrument
    Book(BookArgs),

    /// List the account's resting orders
    Orders(OrdersArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let data_paths = DataPaths::new(&self.data_dir);
        data_paths.ensure_directories()?;

        if self.verbose > 0 && std::env::var_os("RUST_LOG").is_none() {
            std::env::set_var("RUST_LOG", "pennybot=debug");
        }
        let log_mode = if self.log_file_only {
            LogMode::FileOnly
        } else {
            LogMode::ConsoleAndFile
        };
        init_logging(LoggingConfig::new(log_mode, data_paths.clone()))?;

        match self.command {
            Commands::Run(args) => RunCommand::new(args).execute(data_paths).await,
            Commands::Book(args) => BookCommand::new(args).execute(data_paths).await,
            Commands::Orders(args) => OrdersCommand::new(args).execute(data_paths).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_only_flag_parses_globally() {
        let cli = Cli::try_parse_from(["pennybot", "orders", "--log-file-only"]).unwrap();
        assert!(cli.log_file_only);

        let cli = Cli::try_parse_from(["pennybot", "orders"]).unwrap();
        assert!(!cli.log_file_only);
    }
}
