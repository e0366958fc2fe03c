//! Authoritative view of the bot's own resting orders
//!
//! The tracker is rebuilt wholesale from backend-reported orders on every feed
//! tick, so the engine's belief can never drift from backend truth for longer
//! than one cycle. Between reconciliations it is updated optimistically from
//! dispatch acknowledgments.

use std::collections::HashMap;
use tracing::warn;

use crate::types::{OrderStatus, PairKey, RestingOrder};

#[derive(Debug, Default)]
pub struct OrderTracker {
    orders: HashMap<PairKey, RestingOrder>,
}

impl OrderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole view with the backend-reported resting orders.
    /// Non-resting orders are ignored. If the backend reports more than one
    /// order for a key (an invariant violation from our side), keep the
    /// highest-priced one; the decision loop will cancel and converge.
    pub fn reconcile(&mut self, reported: &[RestingOrder]) {
        self.orders.clear();
        for order in reported {
            if order.status != OrderStatus::Resting {
                continue;
            }
            let key = order.key();
            match self.orders.get(&key) {
                Some(existing) if existing.price >= order.price => {
                    warn!(
                        key = %key,
                        kept = %existing.order_id,
                        dropped = %order.order_id,
                        "Backend reports multiple resting orders for one pair"
                    );
                }
                Some(existing) => {
                    warn!(
                        key = %key,
                        kept = %order.order_id,
                        dropped = %existing.order_id,
                        "Backend reports multiple resting orders for one pair"
                    );
                    self.orders.insert(key, order.clone());
                }
                None => {
                    self.orders.insert(key, order.clone());
                }
            }
        }
    }

    /// Our resting order for a pair, if any. Absence is a valid state.
    pub fn get(&self, key: &PairKey) -> Option<&RestingOrder> {
        self.orders.get(key)
    }

    /// Optimistic insert on placement acknowledgment
    pub fn record_placed(&mut self, order: RestingOrder) {
        self.orders.insert(order.key(), order);
    }

    /// Optimistic removal on cancel acknowledgment
    pub fn remove(&mut self, key: &PairKey) -> Option<RestingOrder> {
        self.orders.remove(key)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
