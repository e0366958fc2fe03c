//! Common type definitions used across the pennybot system
//!
//! Kalshi markets quote both sides of a binary outcome in integer cents; the
//! two sides of one instrument always sum to the 100-cent denomination.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Price in cents of the 100-cent denomination
pub type Cents = u32;

/// Contract quantity
pub type Qty = u32;

/// Full denomination of a binary market: yes price + no price = 100
pub const DENOMINATION: Cents = 100;

/// Market ticker (e.g. `KXNFLGAME-SEA`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticker(pub String);

impl Ticker {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Ticker {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of a binary market an order or quote is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketSide {
    Yes,
    No,
}

impl<'de> serde::Deserialize<'de> for MarketSide {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_lowercase().as_str() {
            "yes" => Ok(MarketSide::Yes),
            "no" => Ok(MarketSide::No),
            _ => Err(serde::de::Error::unknown_variant(&s, &["yes", "no"])),
        }
    }
}

impl MarketSide {
    pub fn opposite(self) -> Self {
        match self {
            MarketSide::Yes => MarketSide::No,
            MarketSide::No => MarketSide::Yes,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MarketSide::Yes => "yes",
            MarketSide::No => "no",
        }
    }
}

impl std::fmt::Display for MarketSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Key identifying one quoting pair: everything the engine tracks is per
/// (instrument, side)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey {
    pub ticker: Ticker,
    pub side: MarketSide,
}

impl PairKey {
    pub fn new(ticker: Ticker, side: MarketSide) -> Self {
        Self { ticker, side }
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.ticker, self.side)
    }
}

/// One aggregated bid level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidLevel {
    pub price: Cents,
    pub quantity: Qty,
}

impl BidLevel {
    pub fn new(price: Cents, quantity: Qty) -> Self {
        Self { price, quantity }
    }
}

/// Snapshot of one instrument's book: a bid ladder per side. Asks are implied
/// by the opposing ladder (`ask(yes) = 100 - best_bid(no)`), so only bids are
/// stored. Snapshots are wholesale-replaced on every feed update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub yes_bids: Vec<BidLevel>,
    pub no_bids: Vec<BidLevel>,
}

impl OrderBookSnapshot {
    pub fn bids(&self, side: MarketSide) -> &[BidLevel] {
        match side {
            MarketSide::Yes => &self.yes_bids,
            MarketSide::No => &self.no_bids,
        }
    }

    /// Best (highest) bid price on a side, if the ladder is non-empty
    pub fn best_bid(&self, side: MarketSide) -> Option<Cents> {
        self.bids(side).iter().map(|l| l.price).max()
    }

    /// Total quantity resting at `price` on a side
    pub fn depth_at(&self, side: MarketSide, price: Cents) -> Qty {
        self.bids(side)
            .iter()
            .filter(|l| l.price == price)
            .map(|l| l.quantity)
            .sum()
    }

    /// Implied ask on a side: the denomination minus the best opposing bid.
    /// With no opposing bids nothing can be lifted, so the implied ask is the
    /// full denomination.
    pub fn implied_ask(&self, side: MarketSide) -> Cents {
        match self.best_bid(side.opposite()) {
            Some(opp_bid) => DENOMINATION.saturating_sub(opp_bid),
            None => DENOMINATION,
        }
    }
}

/// Order status as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Resting,
    Canceled,
    Executed,
    Pending,
}

/// A limit order of ours sitting in the book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestingOrder {
    pub order_id: String,
    pub ticker: Ticker,
    pub side: MarketSide,
    pub price: Cents,
    pub quantity_remaining: Qty,
    pub status: OrderStatus,
}

impl RestingOrder {
    pub fn key(&self) -> PairKey {
        PairKey::new(self.ticker.clone(), self.side)
    }
}

/// Per-instrument quoting mode, mutated only by explicit operator action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteMode {
    #[default]
    Off,
    YesOnly,
    NoOnly,
    Both,
}

impl QuoteMode {
    pub fn allows(self, side: MarketSide) -> bool {
        match self {
            QuoteMode::Off => false,
            QuoteMode::YesOnly => side == MarketSide::Yes,
            QuoteMode::NoOnly => side == MarketSide::No,
            QuoteMode::Both => true,
        }
    }

    pub fn is_off(self) -> bool {
        self == QuoteMode::Off
    }
}

impl std::fmt::Display for QuoteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QuoteMode::Off => "off",
            QuoteMode::YesOnly => "yes_only",
            QuoteMode::NoOnly => "no_only",
            QuoteMode::Both => "both",
        };
        write!(f, "{}", s)
    }
}

/// Signed net positions per instrument: positive = net long Yes, negative =
/// net long No. Sourced from the backend, read-only to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionBook {
    positions: HashMap<Ticker, i64>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, ticker: Ticker, position: i64) {
        self.positions.insert(ticker, position);
    }

    pub fn get(&self, ticker: &Ticker) -> i64 {
        self.positions.get(ticker).copied().unwrap_or(0)
    }

    /// Exposure in the direction a buy on `side` would increase: buying Yes
    /// pushes the signed position up, buying No pushes it down.
    pub fn position_toward(&self, ticker: &Ticker, side: MarketSide) -> i64 {
        let pos = self.get(ticker);
        match side {
            MarketSide::Yes => pos,
            MarketSide::No => -pos,
        }
    }
}

impl FromIterator<(Ticker, i64)> for PositionBook {
    fn from_iter<I: IntoIterator<Item = (Ticker, i64)>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(yes: &[(Cents, Qty)], no: &[(Cents, Qty)]) -> OrderBookSnapshot {
        OrderBookSnapshot {
            yes_bids: yes.iter().map(|&(p, q)| BidLevel::new(p, q)).collect(),
            no_bids: no.iter().map(|&(p, q)| BidLevel::new(p, q)).collect(),
        }
    }

    #[test]
    fn best_bid_picks_highest_price() {
        let b = book(&[(60, 10), (70, 5), (65, 20)], &[]);
        assert_eq!(b.best_bid(MarketSide::Yes), Some(70));
        assert_eq!(b.best_bid(MarketSide::No), None);
    }

    #[test]
    fn depth_sums_levels_at_price() {
        let b = book(&[(70, 50), (70, 75), (69, 500)], &[]);
        assert_eq!(b.depth_at(MarketSide::Yes, 70), 125);
        assert_eq!(b.depth_at(MarketSide::Yes, 68), 0);
    }

    #[test]
    fn implied_ask_from_opposing_bid() {
        let b = book(&[(70, 100)], &[(25, 100)]);
        // Yes ask = 100 - best No bid
        assert_eq!(b.implied_ask(MarketSide::Yes), 75);
        // No ask = 100 - best Yes bid
        assert_eq!(b.implied_ask(MarketSide::No), 30);
    }

    #[test]
    fn implied_ask_defaults_to_denomination_on_one_sided_book() {
        let b = book(&[(70, 100)], &[]);
        assert_eq!(b.implied_ask(MarketSide::Yes), DENOMINATION);
    }

    #[test]
    fn mode_allows() {
        assert!(QuoteMode::Both.allows(MarketSide::Yes));
        assert!(QuoteMode::Both.allows(MarketSide::No));
        assert!(QuoteMode::YesOnly.allows(MarketSide::Yes));
        assert!(!QuoteMode::YesOnly.allows(MarketSide::No));
        assert!(!QuoteMode::Off.allows(MarketSide::Yes));
    }

    #[test]
    fn position_toward_flips_sign_for_no() {
        let positions: PositionBook = [(Ticker::from("A"), 30i64), (Ticker::from("B"), -10i64)]
            .into_iter()
            .collect();
        assert_eq!(positions.position_toward(&Ticker::from("A"), MarketSide::Yes), 30);
        assert_eq!(positions.position_toward(&Ticker::from("A"), MarketSide::No), -30);
        assert_eq!(positions.position_toward(&Ticker::from("B"), MarketSide::No), 10);
        assert_eq!(positions.position_toward(&Ticker::from("C"), MarketSide::Yes), 0);
    }

    #[test]
    fn side_deserializes_case_insensitively() {
        let side: MarketSide = serde_json::from_str("\"YES\"").unwrap();
        assert_eq!(side, MarketSide::Yes);
        let side: MarketSide = serde_json::from_str("\"no\"").unwrap();
        assert_eq!(side, MarketSide::No);
        assert!(serde_json::from_str::<MarketSide>("\"maybe\"").is_err());
    }
}
