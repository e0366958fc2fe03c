//! Bot configuration: instrument registry and quoting policy
//!
//! Loaded from a YAML file; every field has a default so a minimal config only
//! needs the backend URL and the instruments to quote. Policy values default
//! to the production constants and exist in the file mainly so paper-trading
//! setups can loosen them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::types::{Cents, Qty, Ticker};

/// One instrument the bot is allowed to quote. The display title feeds the
/// exclusion filter (hazardous/illiquid markets are keyed off their titles).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub ticker: String,
    #[serde(default)]
    pub title: String,
}

/// Quoting policy thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Never quote when the best bid is at or above this price
    pub price_ceiling: Cents,
    /// Minimum third-party quantity at the best bid for a pair to qualify
    pub min_qualifying_depth: Qty,
    /// Fixed per-order size in contracts
    pub clip_size: Qty,
    /// Maximum net exposure per instrument side, in contracts
    pub position_cap: i64,
    /// Guard release delay after a cancel acknowledgment
    pub cancel_settle_ms: u64,
    /// Guard release delay after a placement acknowledgment
    pub place_settle_ms: u64,
    /// Title keywords that exclude an instrument from quoting entirely
    pub excluded_keywords: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            price_ceiling: 90,
            min_qualifying_depth: 125,
            clip_size: 50,
            position_cap: 50,
            cancel_settle_ms: 500,
            place_settle_ms: 2000,
            excluded_keywords: vec!["injury".to_string()],
        }
    }
}

impl PolicyConfig {
    pub fn cancel_settle(&self) -> Duration {
        Duration::from_millis(self.cancel_settle_ms)
    }

    pub fn place_settle(&self) -> Duration {
        Duration::from_millis(self.place_settle_ms)
    }
}

/// Top-level bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Base URL of the dashboard backend (the Kalshi proxy)
    pub backend_url: String,
    /// Feed poll interval in milliseconds
    pub poll_interval_ms: u64,
    /// Instruments the bot may quote
    pub instruments: Vec<InstrumentConfig>,
    pub policy: PolicyConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:8000".to_string(),
            poll_interval_ms: 1000,
            instruments: Vec::new(),
            policy: PolicyConfig::default(),
        }
    }
}

impl BotConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn tickers(&self) -> Vec<Ticker> {
        self.instruments
            .iter()
            .map(|i| Ticker::from(i.ticker.as_str()))
            .collect()
    }

    pub fn instrument_title(&self, ticker: &Ticker) -> Option<&str> {
        self.instruments
            .iter()
            .find(|i| i.ticker == ticker.as_str())
            .map(|i| i.title.as_str())
    }
}
