//! Quoting engine
//!
//! The decision module is pure; everything stateful lives in the controller,
//! which is the single writer for tracker, guard, modes, and activity log.

pub mod activity;
pub mod controller;
pub mod decision;
pub mod dispatcher;
pub mod pending;
pub mod tracker;

pub use activity::{ActivityEntry, ActivityKind, ActivityLog};
pub use controller::{AutomationController, ControlCommand, ControllerHandle};
pub use decision::{evaluate, CancelReason, ExclusionFilter, PairView, QuoteAction};
pub use dispatcher::{AckPayload, CommandAck, DispatchCommand, Dispatcher};
pub use pending::PendingGuard;
pub use tracker::OrderTracker;
