//! Command dispatcher
//!
//! Executes place/cancel decisions against the backend without blocking the
//! tick: each command runs on its own task and the acknowledgment (or
//! failure) is routed back into the controller's event loop, where all state
//! mutation happens. Failures are fail-open: the pending guard entry for the
//! key simply expires on its own schedule and the next tick re-evaluates.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::backend::{PlaceOrderRequest, TradingBackend};
use crate::engine::decision::CancelReason;
use crate::types::{Cents, PairKey, Qty};

/// A command accepted for execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchCommand {
    Place { price: Cents, quantity: Qty },
    Cancel { order_id: String, reason: CancelReason },
}

/// Successful acknowledgment payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckPayload {
    Placed { order_id: String },
    Canceled,
}

/// Outcome of one dispatched command, delivered to the controller
#[derive(Debug)]
pub struct CommandAck {
    pub key: PairKey,
    pub command: DispatchCommand,
    pub result: Result<AckPayload, String>,
}

pub struct Dispatcher {
    backend: Arc<dyn TradingBackend>,
    acks: mpsc::Sender<CommandAck>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn TradingBackend>, acks: mpsc::Sender<CommandAck>) -> Self {
        Self { backend, acks }
    }

    /// Fire the command and return immediately. The caller must already hold
    /// the pending guard for `key`.
    pub fn dispatch(&self, key: PairKey, command: DispatchCommand) {
        let backend = Arc::clone(&self.backend);
        let acks = self.acks.clone();

        tokio::spawn(async move {
            let result = match &command {
                DispatchCommand::Place { price, quantity } => {
                    let request = PlaceOrderRequest::limit_buy(&key, *price, *quantity);
                    match backend.place_order(&request).await {
                        Ok(order_id) => {
                            info!(key = %key, order_id = %order_id, price, quantity, "Order placed");
                            Ok(AckPayload::Placed { order_id })
                        }
                        Err(e) => {
                            warn!(key = %key, price, error = %e, "Order placement failed");
                            Err(e.to_string())
                        }
                    }
                }
                DispatchCommand::Cancel { order_id, reason } => {
                    match backend.cancel_order(order_id).await {
                        Ok(()) => {
                            info!(key = %key, order_id = %order_id, reason = %reason, "Order cancelled");
                            Ok(AckPayload::Canceled)
                        }
                        Err(e) => {
                            warn!(key = %key, order_id = %order_id, error = %e, "Order cancellation failed");
                            Err(e.to_string())
                        }
                    }
                }
            };

            // The controller may already be gone during shutdown
            let _ = acks.send(CommandAck { key, command, result }).await;
        });
    }
}
