//! The decode-on-demand capability the relay borrows from a concrete
//! protocol implementation.
//!
//! The relay forwards raw bytes verbatim and only asks for a decode when a
//! hook is registered for a packet name or when the name is on its built-in
//! allow-list. Encoding is needed only for the few packets the relay
//! constructs itself (chat, in practice).

use bytes::Bytes;

use crate::error::CodecError;
use crate::packets::Packet;
use crate::types::Direction;

pub trait PacketCodec: Send + Sync {
    /// Decode a named raw payload into its field structure.
    fn decode(&self, direction: Direction, name: &str, raw: &[u8]) -> Result<Packet, CodecError>;

    /// Encode a packet into the raw payload the runtime writes to the wire.
    fn encode(&self, direction: Direction, packet: &Packet) -> Result<Bytes, CodecError>;
}
