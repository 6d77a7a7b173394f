//! Minecraft 1.8 protocol surface consumed by the relay.
//!
//! This crate carries no wire parsing: framing, compression, and encryption
//! belong to the concrete protocol runtime. What lives here is the shape of
//! the data the relay inspects — protocol states, raw-frame metadata, the
//! field structures for the handful of packet names the relay understands,
//! the JSON chat payload types, and the [`codec::PacketCodec`] capability a
//! runtime implements so packets can be decoded on demand.

pub mod chat;
pub mod codec;
pub mod error;
pub mod packets;
pub mod types;

pub use chat::{ChatMessage, MessageComponent};
pub use codec::PacketCodec;
pub use error::CodecError;
pub use packets::Packet;
pub use types::{Direction, ProtocolState, RawFrame};
