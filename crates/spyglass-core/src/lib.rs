//! Transparent observing relay for one Minecraft 1.8 client session.
//!
//! The relay sits between a game client and the real upstream server,
//! pumping raw packets in both directions. A fixed allow-list of packet
//! names is decoded on demand to derive session state — the player roster,
//! synthetic-player flags, and the current sub-server — while everything
//! else crosses untouched. External code extends the relay through chat
//! commands and per-packet hooks registered on [`ProxyHandle`].
//!
//! The concrete wire implementation (framing, compression, encryption,
//! authentication) is not part of this crate: a protocol runtime feeds the
//! relay [`link::LinkEvent`]s and implements
//! [`spyglass_proto::PacketCodec`].

pub mod bots;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod hooks;
pub mod link;
pub mod location;
pub mod proxy;
pub mod roster;

mod session;

pub use config::{AuthMode, ProxyConfig};
pub use error::ProxyError;
pub use events::ProxyEvent;
pub use hooks::{HandlerError, HookOutcome};
pub use link::{InboundLogin, Link, LinkCommand, LinkEvent, LinkState, LinkWriter, RuntimeRequest};
pub use location::Location;
pub use proxy::{Proxy, ProxyHandle};
pub use roster::Player;
