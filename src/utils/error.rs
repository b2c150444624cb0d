//! The `error` module defines the error type used throughout `wsrelay`.
//!
//! Session-level failures never propagate past the session that hit them;
//! they surface here only so the owning task can log why it stopped.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("hub is no longer running")]
    HubClosed,

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("write did not complete within {0:?}")]
    WriteTimeout(Duration),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("no message relayed back within {0:?}")]
    NoReply(Duration),

    #[error("invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("invalid setting: {0} must be greater than zero")]
    InvalidSetting(&'static str),
}

pub type Result<T> = std::result::Result<T, RelayError>;
