//! Market feed adapter
//!
//! Normalizes the raw payloads the dashboard backend serves (Kalshi
//! pass-through JSON) into the engine's data model, and runs the background
//! poller that snapshots books, resting orders, and positions for every
//! enabled instrument. Pure translation; no decision logic lives here.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::backend::TradingBackend;
use crate::types::{
    BidLevel, MarketSide, OrderBookSnapshot, OrderStatus, PositionBook, Qty, QuoteMode,
    RestingOrder, Ticker, DENOMINATION,
};

/// Raw order book as served by `GET /api/markets/{ticker}/orderbook`.
/// Ladders are `[price, quantity]` arrays and either side may be null.
#[derive(Debug, Clone, Deserialize)]
pub struct RawOrderBook {
    #[serde(default)]
    pub yes: Option<Vec<Vec<i64>>>,
    #[serde(default)]
    pub no: Option<Vec<Vec<i64>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderBookPayload {
    pub orderbook: RawOrderBook,
}

/// Raw resting order as served by `GET /api/orders?status=resting`
#[derive(Debug, Clone, Deserialize)]
pub struct RawOrder {
    pub order_id: String,
    pub ticker: String,
    pub side: MarketSide,
    #[serde(default)]
    pub yes_price: Option<i64>,
    #[serde(default)]
    pub no_price: Option<i64>,
    #[serde(default)]
    pub remaining_count: Option<i64>,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrdersPayload {
    #[serde(default)]
    pub orders: Vec<RawOrder>,
}

/// Raw market position as served by `GET /api/positions`
#[derive(Debug, Clone, Deserialize)]
pub struct RawPosition {
    pub ticker: String,
    #[serde(default)]
    pub position: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PositionsPayload {
    #[serde(default)]
    pub market_positions: Vec<RawPosition>,
}

/// One coherent view of the world, delivered to the controller per feed cycle
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    pub books: HashMap<Ticker, OrderBookSnapshot>,
    pub orders: Vec<RestingOrder>,
    pub positions: PositionBook,
}

fn normalize_ladder(raw: Option<&Vec<Vec<i64>>>) -> Vec<BidLevel> {
    let mut levels = Vec::new();
    for level in raw.into_iter().flatten() {
        if level.len() < 2 {
            continue;
        }
        let (price, quantity) = (level[0], level[1]);
        if !(0..=DENOMINATION as i64).contains(&price) || quantity < 0 {
            warn!(price, quantity, "Discarding malformed book level");
            continue;
        }
        levels.push(BidLevel::new(price as u32, quantity as Qty));
    }
    levels
}

/// Normalize a raw book into a wholesale-replacement snapshot
pub fn normalize_orderbook(raw: &RawOrderBook) -> OrderBookSnapshot {
    OrderBookSnapshot {
        yes_bids: normalize_ladder(raw.yes.as_ref()),
        no_bids: normalize_ladder(raw.no.as_ref()),
    }
}

fn normalize_status(status: &str) -> OrderStatus {
    match status.to_lowercase().as_str() {
        "resting" => OrderStatus::Resting,
        "canceled" | "cancelled" => OrderStatus::Canceled,
        "executed" => OrderStatus::Executed,
        _ => OrderStatus::Pending,
    }
}

/// Normalize a raw order; None when the payload is missing the side's price
/// (nothing the tracker could act on).
pub fn normalize_order(raw: &RawOrder) -> Option<RestingOrder> {
    let price = match raw.side {
        MarketSide::Yes => raw.yes_price,
        MarketSide::No => raw.no_price,
    }?;
    if !(0..=DENOMINATION as i64).contains(&price) {
        warn!(order_id = %raw.order_id, price, "Discarding order with out-of-range price");
        return None;
    }
    let remaining = raw.remaining_count.unwrap_or(0);
    Some(RestingOrder {
        order_id: raw.order_id.clone(),
        ticker: Ticker::from(raw.ticker.as_str()),
        side: raw.side,
        price: price as u32,
        quantity_remaining: remaining.max(0) as Qty,
        status: normalize_status(&raw.status),
    })
}

/// Normalize the positions payload into a signed position book
pub fn normalize_positions(raw: &[RawPosition]) -> PositionBook {
    raw.iter()
        .map(|p| (Ticker::from(p.ticker.as_str()), p.position))
        .collect()
}

/// Background task that polls the backend for every enabled instrument and
/// pushes coherent snapshots into a bounded channel. When the channel is full
/// the snapshot is dropped: the controller coalesces bursts anyway, and the
/// next cycle delivers fresher data.
pub struct FeedPoller {
    backend: Arc<dyn TradingBackend>,
    modes: watch::Receiver<HashMap<Ticker, QuoteMode>>,
    events: mpsc::Sender<FeedSnapshot>,
    poll_interval: Duration,
}

impl FeedPoller {
    pub fn new(
        backend: Arc<dyn TradingBackend>,
        modes: watch::Receiver<HashMap<Ticker, QuoteMode>>,
        events: mpsc::Sender<FeedSnapshot>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            backend,
            modes,
            events,
            poll_interval,
        }
    }

    pub async fn run(self) {
        info!(interval_ms = self.poll_interval.as_millis() as u64, "Feed poller started");
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let tickers: Vec<Ticker> = self
                .modes
                .borrow()
                .iter()
                .filter(|(_, mode)| !mode.is_off())
                .map(|(ticker, _)| ticker.clone())
                .collect();

            if tickers.is_empty() {
                continue;
            }

            let Some(snapshot) = self.collect_snapshot(&tickers).await else {
                continue;
            };

            match self.events.try_send(snapshot) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    debug!("Feed channel full, dropping snapshot");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    info!("Feed channel closed, poller stopping");
                    return;
                }
            }
        }
    }

    async fn collect_snapshot(&self, tickers: &[Ticker]) -> Option<FeedSnapshot> {
        let raw_orders = match self.backend.resting_orders().await {
            Ok(orders) => orders,
            Err(e) => {
                warn!(error = %e, "Order query failed, skipping feed cycle");
                return None;
            }
        };
        let raw_positions = match self.backend.positions().await {
            Ok(positions) => positions,
            Err(e) => {
                warn!(error = %e, "Position query failed, skipping feed cycle");
                return None;
            }
        };

        let mut books = HashMap::new();
        for ticker in tickers {
            match self.backend.orderbook(ticker).await {
                Ok(raw) => {
                    books.insert(ticker.clone(), normalize_orderbook(&raw));
                }
                Err(e) => {
                    // One stale instrument must not block the others
                    warn!(ticker = %ticker, error = %e, "Book query failed, skipping instrument");
                }
            }
        }

        Some(FeedSnapshot {
            books,
            orders: raw_orders.iter().filter_map(normalize_order).collect(),
            positions: normalize_positions(&raw_positions),
        })
    }
}
