//! Pennybot: an automated penny quoting engine for binary-outcome markets.
//!
//! The bot keeps at most one resting limit order per (instrument, side) pair,
//! priced exactly one cent above the best qualifying bid. A feed poller
//! snapshots books, orders, and positions from the dashboard backend; a pure
//! decision function maps each snapshot to place/cancel/hold actions; and a
//! single-writer controller owns all mutable state and dispatches commands
//! without ever blocking on the network.

pub mod backend;
pub mod cli;
pub mod config;
pub mod data_paths;
pub mod engine;
pub mod errors;
pub mod feed;
pub mod logging;
pub mod types;
