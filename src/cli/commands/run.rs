//! Run command for the long-lived automation engine

use anyhow::{bail, Context, Result};
use clap::Args;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use crate::backend::HttpBackend;
use crate::cli::parse_mode;
use crate::config::BotConfig;
use crate::data_paths::DataPaths;
use crate::engine::AutomationController;
use crate::types::{QuoteMode, Ticker};

#[derive(Args, Clone)]
pub struct RunArgs {
    /// Config file path (default: <data-dir>/pennybot.yaml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Tickers to enable at startup (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub enable: Vec<String>,

    /// Quote mode for tickers enabled at startup
    #[arg(long, default_value = "both", value_parser = parse_mode)]
    pub mode: QuoteMode,
}

pub struct RunCommand {
    args: RunArgs,
}

impl RunCommand {
    pub fn new(args: RunArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, data_paths: DataPaths) -> Result<()> {
        let config_path = self
            .args
            .config
            .clone()
            .unwrap_or_else(|| data_paths.config_file());
        let config = BotConfig::load(&config_path)?;
        if config.instruments.is_empty() {
            bail!(
                "No instruments configured in {}; nothing to quote",
                config_path.display()
            );
        }

        // Reject unknown --enable tickers before the engine starts
        let registry = config.tickers();
        for ticker in &self.args.enable {
            if !registry.iter().any(|t| t.as_str() == ticker.as_str()) {
                bail!(
                    "Unknown instrument in --enable: {} (not in {})",
                    ticker,
                    config_path.display()
                );
            }
        }

        println!("{}", "Pennybot starting...".bright_blue());
        println!(
            "{}",
            format!(
                "{} instruments registered, backend {}",
                config.instruments.len(),
                config.backend_url
            )
            .bright_cyan()
        );

        let backend = Arc::new(HttpBackend::new(&config.backend_url)?);
        let (handle, join) = AutomationController::spawn(config, backend);

        for ticker in &self.args.enable {
            handle
                .set_mode(Ticker::from(ticker.as_str()), self.args.mode)
                .await
                .with_context(|| format!("Failed to enable {}", ticker))?;
            println!(
                "{}",
                format!("Enabled {} ({})", ticker, self.args.mode).bright_green()
            );
        }
        if self.args.enable.is_empty() {
            info!("No instruments enabled at startup; engine is idle until modes are set");
        }

        signal::ctrl_c()
            .await
            .context("Failed to listen for shutdown signal")?;
        info!("Shutdown signal received, disabling automation");
        // Stop quoting before the loop exits so nothing dispatches mid-teardown
        let _ = handle.disable_all().await;
        handle.shutdown().await;
        let _ = join.await;

        println!("{}", "Pennybot stopped".bright_yellow());
        Ok(())
    }
}
