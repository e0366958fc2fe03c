//! Pure quoting decision logic
//!
//! Given one (instrument, side) pair's view of the world (book, own resting
//! order, signed position), produce the single action that keeps at most one
//! order resting exactly one cent above the best qualifying bid. No I/O: the
//! same inputs always yield the same action, which is what makes the engine
//! testable tick-for-tick.

use tracing::debug;

use crate::config::PolicyConfig;
use crate::types::{Cents, OrderBookSnapshot, PairKey, Qty, RestingOrder};

/// Why an existing quote is being pulled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Someone bid through us; our price is no longer one cent above best
    Outbid,
    /// The pair no longer qualifies (ceiling breached or depth dried up)
    ParamsInvalid,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelReason::Outbid => write!(f, "outbid"),
            CancelReason::ParamsInvalid => write!(f, "params_invalid"),
        }
    }
}

/// Target action for one pair on one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteAction {
    /// Nothing to do; current state is already optimal
    Hold,
    /// Rest a new buy limit order
    Place { price: Cents, quantity: Qty },
    /// Pull the existing order
    Cancel { order_id: String, reason: CancelReason },
}

/// Policy hook excluding hazardous or illiquid instruments by display title
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    keywords: Vec<String>,
}

impl ExclusionFilter {
    pub fn new(keywords: impl IntoIterator<Item = String>) -> Self {
        Self {
            keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    pub fn from_policy(policy: &PolicyConfig) -> Self {
        Self::new(policy.excluded_keywords.iter().cloned())
    }

    pub fn excludes(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        self.keywords.iter().any(|k| title.contains(k.as_str()))
    }
}

/// Everything the decision needs about one pair, assembled by the controller
#[derive(Debug)]
pub struct PairView<'a> {
    pub key: &'a PairKey,
    /// Instrument display title, fed to the exclusion filter
    pub title: &'a str,
    pub book: &'a OrderBookSnapshot,
    pub own_order: Option<&'a RestingOrder>,
    /// Net exposure in the direction a buy on this side would increase
    pub position_toward: i64,
}

/// Compute the target action for one enabled (instrument, side) pair.
pub fn evaluate(view: &PairView<'_>, policy: &PolicyConfig, exclusion: &ExclusionFilter) -> QuoteAction {
    let side = view.key.side;

    if exclusion.excludes(view.title) {
        debug!(key = %view.key, "Instrument excluded by policy filter");
        return QuoteAction::Hold;
    }

    let Some(best_bid) = view.book.best_bid(side) else {
        return QuoteAction::Hold;
    };

    // Depth at the best bid nets out our own resting quantity when we are
    // sitting at that price, so `params_valid` reflects third-party interest.
    let mut depth_at_best = view.book.depth_at(side, best_bid);
    if let Some(own) = view.own_order {
        if own.price == best_bid {
            depth_at_best = depth_at_best.saturating_sub(own.quantity_remaining);
        }
    }

    let target_price = best_bid + 1;
    let params_valid =
        best_bid < policy.price_ceiling && depth_at_best >= policy.min_qualifying_depth;

    if let Some(own) = view.own_order {
        if !params_valid {
            return QuoteAction::Cancel {
                order_id: own.order_id.clone(),
                reason: CancelReason::ParamsInvalid,
            };
        }
        if own.price < target_price {
            return QuoteAction::Cancel {
                order_id: own.order_id.clone(),
                reason: CancelReason::Outbid,
            };
        }
        // Still one cent above the best bid; replacing at the same price
        // would only lose queue priority.
        return QuoteAction::Hold;
    }

    if !params_valid {
        return QuoteAction::Hold;
    }

    // Position cap is a post-fill bound: a fill of clip_size must not push
    // exposure past the cap.
    if view.position_toward + policy.clip_size as i64 > policy.position_cap {
        debug!(
            key = %view.key,
            position = view.position_toward,
            cap = policy.position_cap,
            "Position cap reached, not quoting"
        );
        return QuoteAction::Hold;
    }

    // Never cross the spread: the order must rest strictly below the implied
    // ask or it would match immediately.
    let implied_ask = view.book.implied_ask(side);
    if target_price >= implied_ask {
        debug!(
            key = %view.key,
            target_price,
            implied_ask,
            "Target price would cross the spread, not quoting"
        );
        return QuoteAction::Hold;
    }

    QuoteAction::Place {
        price: target_price,
        quantity: policy.clip_size,
    }
}
