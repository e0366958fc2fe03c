//! Orders command: list the account's resting orders

use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;
use std::path::PathBuf;

use crate::backend::{HttpBackend, TradingBackend};
use crate::config::BotConfig;
use crate::data_paths::DataPaths;
use crate::feed::normalize_order;

#[derive(Args)]
pub struct OrdersArgs {
    /// Config file path (default: <data-dir>/pennybot.yaml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub struct OrdersCommand {
    args: OrdersArgs,
}

impl OrdersCommand {
    pub fn new(args: OrdersArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, data_paths: DataPaths) -> Result<()> {
        let config_path = self
            .args
            .config
            .clone()
            .unwrap_or_else(|| data_paths.config_file());
        let config = BotConfig::load(&config_path)?;
        let backend = HttpBackend::new(&config.backend_url)?;

        let raw = backend.resting_orders().await?;
        let orders: Vec<_> = raw.iter().filter_map(normalize_order).collect();

        if orders.is_empty() {
            println!("{}", "No resting orders".bright_yellow());
            return Ok(());
        }

        println!("{}", format!("{} resting orders", orders.len()).bright_blue());
        for order in &orders {
            println!(
                "  {} {} {} {} @ {}c",
                order.order_id,
                order.ticker,
                order.side,
                order.quantity_remaining,
                order.price
            );
        }

        Ok(())
    }
}
