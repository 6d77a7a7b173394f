//! Relay-level errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("login channel closed")]
    LoginChannelClosed,

    #[error("protocol runtime unavailable")]
    RuntimeUnavailable,
}
