//! Book command: print one instrument's normalized order book

use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;
use std::path::PathBuf;

use crate::backend::{HttpBackend, TradingBackend};
use crate::config::BotConfig;
use crate::data_paths::DataPaths;
use crate::feed::normalize_orderbook;
use crate::types::{MarketSide, Ticker};

#[derive(Args)]
pub struct BookArgs {
    /// Market ticker
    pub ticker: String,

    /// Number of levels to show per side
    #[arg(long, default_value = "5")]
    pub depth: usize,

    /// Config file path (default: <data-dir>/pennybot.yaml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub struct BookCommand {
    args: BookArgs,
}

impl BookCommand {
    pub fn new(args: BookArgs) -> Self {
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

        let ticker = Ticker::from(self.args.ticker.as_str());
        let raw = backend.orderbook(&ticker).await?;
        let book = normalize_orderbook(&raw);

        println!("{}", format!("Order book: {}", ticker).bright_blue());
        for side in [MarketSide::Yes, MarketSide::No] {
            let mut ladder = book.bids(side).to_vec();
            ladder.sort_by(|a, b| b.price.cmp(&a.price));

            match book.best_bid(side) {
                Some(best) => println!(
                    "{}",
                    format!(
                        "  {}: best bid {}c, implied ask {}c",
                        side,
                        best,
                        book.implied_ask(side)
                    )
                    .bright_cyan()
                ),
                None => println!("{}", format!("  {}: no bids", side).bright_yellow()),
            }

            for level in ladder.iter().take(self.args.depth) {
                println!("    {:>3}c x {}", level.price, level.quantity);
            }
        }

        Ok(())
    }
}
