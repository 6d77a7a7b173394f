//! Connection-link plumbing between the relay and the protocol runtime.
//!
//! The relay never touches sockets. The runtime owns them and surfaces each
//! side of a session as a [`Link`]: an event stream plus a writer handle.
//! The runtime is expected to report protocol state transitions on the link
//! (forwarding is gated on both sides reaching the play state) and to
//! finish every link with exactly one `End` or `Error` event.

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

use spyglass_proto::types::{ProtocolState, RawFrame};

use crate::config::AuthMode;

/// Lifecycle state of one side of the relayed pair.
///
/// Transitions happen only inside the session's terminal handlers, which is
/// the only place close requests are issued — so each side is closed at
/// most once and the two sides cannot close-loop each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Alive; packets may be written.
    Open,
    /// Close requested by the relay; waiting for the runtime's `End`.
    Ending,
    /// The runtime reported end or error.
    Ended,
}

impl LinkState {
    pub fn is_open(self) -> bool {
        matches!(self, LinkState::Open)
    }
}

/// Events the protocol runtime reports for one connection.
#[derive(Debug)]
pub enum LinkEvent {
    /// A raw packet arrived.
    Frame(RawFrame),
    /// The connection switched protocol state.
    State(ProtocolState),
    /// The connection closed.
    End,
    /// The connection failed.
    Error(String),
}

/// Commands the relay issues for one connection.
#[derive(Debug, PartialEq)]
pub enum LinkCommand {
    /// Write a raw payload verbatim.
    WriteRaw(Bytes),
    /// Close the connection with a reason.
    End(String),
}

/// Writer half of a link. Cheap to clone; writes are queued for the runtime
/// and dropped silently once it is gone.
#[derive(Clone)]
pub struct LinkWriter {
    tx: mpsc::UnboundedSender<LinkCommand>,
}

impl LinkWriter {
    pub fn new(tx: mpsc::UnboundedSender<LinkCommand>) -> Self {
        Self { tx }
    }

    pub fn write_raw(&self, data: Bytes) {
        let _ = self.tx.send(LinkCommand::WriteRaw(data));
    }

    pub fn end(&self, reason: impl Into<String>) {
        let _ = self.tx.send(LinkCommand::End(reason.into()));
    }
}

/// One side of a proxied session as handed over by the runtime.
pub struct Link {
    pub writer: LinkWriter,
    pub events: mpsc::Receiver<LinkEvent>,
}

impl Link {
    /// Build a link plus the runtime-facing channel ends: the event sender
    /// the runtime feeds and the command receiver it drains.
    pub fn channel(
        buffer: usize,
    ) -> (
        Self,
        mpsc::Sender<LinkEvent>,
        mpsc::UnboundedReceiver<LinkCommand>,
    ) {
        let (event_tx, events) = mpsc::channel(buffer);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        (
            Self {
                writer: LinkWriter::new(command_tx),
                events,
            },
            event_tx,
            command_rx,
        )
    }
}

/// A freshly authenticated inbound client connection.
pub struct InboundLogin {
    pub username: String,
    pub link: Link,
}

/// Requests the relay sends to the protocol runtime.
pub enum RuntimeRequest {
    /// Open the outbound connection for a new session.
    Connect {
        host: String,
        port: u16,
        username: String,
        auth: AuthMode,
        reply: oneshot::Sender<Result<Link, String>>,
    },
}
