//! Codec-adapter errors.

use thiserror::Error;

use crate::types::Direction;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unknown packet name: {0}")]
    UnknownPacket(String),

    #[error("malformed {name} packet: {detail}")]
    Malformed { name: &'static str, detail: String },

    #[error("unknown {field} code: {value}")]
    UnknownCode { field: &'static str, value: i32 },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("packet {name} cannot travel {direction:?}")]
    WrongDirection {
        name: &'static str,
        direction: Direction,
    },
}
