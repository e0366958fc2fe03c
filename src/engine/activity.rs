//! Bounded activity log for operator visibility
//!
//! Every dispatched action is recorded most-recent-first; the log is capped so
//! a long-running bot cannot grow it without bound.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

use crate::types::{Cents, MarketSide, Qty, Ticker};

pub const ACTIVITY_LOG_CAP: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Place,
    Cancel,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    pub ticker: Ticker,
    pub side: MarketSide,
    pub kind: ActivityKind,
    pub detail: String,
}

#[derive(Debug)]
pub struct ActivityLog {
    entries: VecDeque<ActivityEntry>,
    cap: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_cap(ACTIVITY_LOG_CAP)
    }
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cap(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn record_place(&mut self, ticker: Ticker, side: MarketSide, price: Cents, quantity: Qty) {
        self.push(ActivityEntry {
            timestamp: Utc::now(),
            ticker,
            side,
            kind: ActivityKind::Place,
            detail: format!("place {} @ {}c", quantity, price),
        });
    }

    pub fn record_cancel(&mut self, ticker: Ticker, side: MarketSide, order_id: &str, reason: &str) {
        self.push(ActivityEntry {
            timestamp: Utc::now(),
            ticker,
            side,
            kind: ActivityKind::Cancel,
            detail: format!("cancel {} ({})", order_id, reason),
        });
    }

    fn push(&mut self, entry: ActivityEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.cap);
    }

    /// Entries most-recent-first
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
