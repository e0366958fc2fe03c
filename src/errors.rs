//! Error types shared across the pennybot crate
//!
//! Backend failures are treated as transient: the engine logs them and lets
//! the next tick re-evaluate from scratch, so nothing here is fatal to the
//! automation loop.

use thiserror::Error;

/// Failures talking to the trading backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned status {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("unexpected response shape: {0}")]
    Malformed(String),
}

impl BackendError {
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::Malformed(detail.into())
    }
}

/// Failures at the operator-facing controller boundary
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("controller is not running")]
    NotRunning,
}
