//! Protocol metadata attached to raw packet frames.

use bytes::Bytes;

/// Connection protocol state, as negotiated by the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolState {
    Handshaking,
    Status,
    Login,
    Play,
}

/// Direction a packet travels in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Server → client.
    Clientbound,
    /// Client → server.
    Serverbound,
}

/// A raw packet as surfaced by the protocol runtime: an opaque payload plus
/// the metadata needed to route it and, on demand, decode it.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub state: ProtocolState,
    pub name: String,
    pub data: Bytes,
}

impl RawFrame {
    pub fn new(state: ProtocolState, name: impl Into<String>, data: Bytes) -> Self {
        Self {
            state,
            name: name.into(),
            data,
        }
    }
}
