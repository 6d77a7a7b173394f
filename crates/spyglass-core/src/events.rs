//! Events the relay surfaces to the embedding application.

use spyglass_proto::chat::ChatMessage;

use crate::location::Location;

/// Events emitted by the proxy to the consumer.
///
/// At most one terminal event (`ClientEnd`/`ClientError` for the client
/// side, `RemoteEnd`/`RemoteError` for the upstream side) fires per side
/// per session; the side that dies first gets its event, the counterpart
/// close it triggers is silent.
#[derive(Debug, Clone, PartialEq)]
pub enum ProxyEvent {
    /// A client completed its inbound login.
    ConnectedLocal,
    /// The upstream link reached the play state.
    ConnectedRemote,
    /// The client connection ended while upstream was still open.
    ClientEnd,
    /// The client connection failed while upstream was still open.
    ClientError(String),
    /// The upstream connection ended while the client was still open.
    RemoteEnd,
    /// The upstream connection failed while the client was still open.
    RemoteError(String),
    /// A player was confirmed on the roster.
    PlayerJoin {
        uuid: String,
        username: String,
        is_bot: bool,
    },
    /// A tracked player left.
    PlayerLeave { uuid: String, username: String },
    /// A clientbound chat message (location responses excluded).
    Chat(ChatMessage),
    /// The player's sub-server was (re)discovered.
    Location(Location),
}
