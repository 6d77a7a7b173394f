//! Public proxy surface: construction, the login/session loop, and the
//! cloneable handle for extension code.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{info, warn};

use spyglass_proto::codec::PacketCodec;
use spyglass_proto::packets::Packet;
use spyglass_proto::types::{Direction, RawFrame};

use crate::commands::{CommandContext, CommandHandler, CommandRegistry};
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::events::ProxyEvent;
use crate::hooks::{DirectionHooks, HandlerError, HookOutcome, PacketHook, RawHook};
use crate::link::{InboundLogin, RuntimeRequest};
use crate::location::Location;
use crate::roster::Player;
use crate::session::Session;

/// How long a shutdown waits for the runtime to confirm both link closes.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Command and hook registries, shared across sessions.
pub(crate) struct Registries {
    commands: Mutex<CommandRegistry>,
    clientbound: Mutex<DirectionHooks>,
    serverbound: Mutex<DirectionHooks>,
}

impl Registries {
    fn new() -> Self {
        Self {
            commands: Mutex::new(CommandRegistry::new()),
            clientbound: Mutex::new(DirectionHooks::new()),
            serverbound: Mutex::new(DirectionHooks::new()),
        }
    }

    pub(crate) fn command(&self, name: &str) -> Option<CommandHandler> {
        self.commands
            .lock()
            .expect("command registry lock poisoned")
            .get(name)
    }

    pub(crate) fn clientbound_hook(&self, name: &str) -> Option<PacketHook> {
        self.clientbound
            .lock()
            .expect("hook registry lock poisoned")
            .get(name)
    }

    pub(crate) fn serverbound_hook(&self, name: &str) -> Option<PacketHook> {
        self.serverbound
            .lock()
            .expect("hook registry lock poisoned")
            .get(name)
    }

    pub(crate) fn clientbound_global(&self) -> Option<RawHook> {
        self.clientbound
            .lock()
            .expect("hook registry lock poisoned")
            .global()
    }

    pub(crate) fn serverbound_global(&self) -> Option<RawHook> {
        self.serverbound
            .lock()
            .expect("hook registry lock poisoned")
            .global()
    }
}

/// Cloneable handle for extension code: command and hook registration,
/// roster/location accessors, and direct writes into the active session.
#[derive(Clone)]
pub struct ProxyHandle {
    registries: Arc<Registries>,
    session: Arc<Mutex<Option<Session>>>,
}

impl ProxyHandle {
    /// Register a chat command. A handler already registered under the same
    /// name is replaced.
    pub fn register_command<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&CommandContext) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.registries
            .commands
            .lock()
            .expect("command registry lock poisoned")
            .register(name, Arc::new(handler));
    }

    pub fn unregister_command(&self, name: &str) {
        self.registries
            .commands
            .lock()
            .expect("command registry lock poisoned")
            .unregister(name);
    }

    /// Hook one clientbound packet name. Replaces an existing hook.
    pub fn register_clientbound_hook<F>(&self, packet_name: impl Into<String>, hook: F)
    where
        F: Fn(&Packet) -> Result<HookOutcome, HandlerError> + Send + Sync + 'static,
    {
        self.registries
            .clientbound
            .lock()
            .expect("hook registry lock poisoned")
            .register(packet_name, Arc::new(hook));
    }

    pub fn unregister_clientbound_hook(&self, packet_name: &str) {
        self.registries
            .clientbound
            .lock()
            .expect("hook registry lock poisoned")
            .unregister(packet_name);
    }

    /// Hook one serverbound packet name. Replaces an existing hook.
    pub fn register_serverbound_hook<F>(&self, packet_name: impl Into<String>, hook: F)
    where
        F: Fn(&Packet) -> Result<HookOutcome, HandlerError> + Send + Sync + 'static,
    {
        self.registries
            .serverbound
            .lock()
            .expect("hook registry lock poisoned")
            .register(packet_name, Arc::new(hook));
    }

    pub fn unregister_serverbound_hook(&self, packet_name: &str) {
        self.registries
            .serverbound
            .lock()
            .expect("hook registry lock poisoned")
            .unregister(packet_name);
    }

    /// Install the whole-stream clientbound interceptor, replacing any
    /// previous one.
    pub fn set_clientbound_interceptor<F>(&self, hook: F)
    where
        F: Fn(&RawFrame) -> Result<HookOutcome, HandlerError> + Send + Sync + 'static,
    {
        self.registries
            .clientbound
            .lock()
            .expect("hook registry lock poisoned")
            .set_global(Arc::new(hook));
    }

    pub fn clear_clientbound_interceptor(&self) {
        self.registries
            .clientbound
            .lock()
            .expect("hook registry lock poisoned")
            .clear_global();
    }

    /// Install the whole-stream serverbound interceptor, replacing any
    /// previous one.
    pub fn set_serverbound_interceptor<F>(&self, hook: F)
    where
        F: Fn(&RawFrame) -> Result<HookOutcome, HandlerError> + Send + Sync + 'static,
    {
        self.registries
            .serverbound
            .lock()
            .expect("hook registry lock poisoned")
            .set_global(Arc::new(hook));
    }

    pub fn clear_serverbound_interceptor(&self) {
        self.registries
            .serverbound
            .lock()
            .expect("hook registry lock poisoned")
            .clear_global();
    }

    /// Players currently tracked by the active session.
    pub fn players(&self) -> Vec<Player> {
        self.current().map(|s| s.players()).unwrap_or_default()
    }

    pub fn player(&self, uuid: &str) -> Option<Player> {
        self.current().and_then(|s| s.player(uuid))
    }

    /// Last correlated location, or limbo outside a session.
    pub fn location(&self) -> Location {
        self.current().map(|s| s.location()).unwrap_or_default()
    }

    /// Encode a packet and write it to the client, if that side is open.
    pub fn write_client(&self, packet: &Packet) {
        if let Some(session) = self.current() {
            session.write_packet(Direction::Clientbound, packet);
        }
    }

    /// Encode a packet and write it upstream, if that side is open.
    pub fn write_server(&self, packet: &Packet) {
        if let Some(session) = self.current() {
            session.write_packet(Direction::Serverbound, packet);
        }
    }

    fn current(&self) -> Option<Session> {
        self.session
            .lock()
            .expect("session slot lock poisoned")
            .clone()
    }
}

/// The relay. Create with [`Proxy::new`], then drive with [`Proxy::run`]
/// wired to a protocol runtime.
pub struct Proxy {
    config: ProxyConfig,
    codec: Arc<dyn PacketCodec>,
    registries: Arc<Registries>,
    events: mpsc::Sender<ProxyEvent>,
    handle: ProxyHandle,
}

impl Proxy {
    /// Build a proxy. Returns the proxy, the extension handle, and the
    /// event stream for the consumer.
    pub fn new(
        config: ProxyConfig,
        codec: Arc<dyn PacketCodec>,
    ) -> (Self, ProxyHandle, mpsc::Receiver<ProxyEvent>) {
        let (event_tx, event_rx) = mpsc::channel(256);
        let registries = Arc::new(Registries::new());
        let handle = ProxyHandle {
            registries: Arc::clone(&registries),
            session: Arc::new(Mutex::new(None)),
        };
        (
            Self {
                config,
                codec,
                registries,
                events: event_tx,
                handle: handle.clone(),
            },
            handle,
            event_rx,
        )
    }

    /// Consume inbound logins one at a time, relaying each session to the
    /// configured upstream until shutdown.
    pub async fn run(
        &self,
        mut logins: mpsc::Receiver<InboundLogin>,
        runtime: mpsc::Sender<RuntimeRequest>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), ProxyError> {
        info!(
            port = self.config.proxy.port,
            upstream = %self.config.upstream.host,
            "proxy started"
        );
        loop {
            let login = tokio::select! {
                login = logins.recv() => {
                    login.ok_or(ProxyError::LoginChannelClosed)?
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return Ok(());
                    }
                    continue;
                }
            };
            self.run_session(login, &runtime, &mut shutdown).await?;
            if *shutdown.borrow() {
                return Ok(());
            }
        }
    }

    async fn run_session(
        &self,
        login: InboundLogin,
        runtime: &mpsc::Sender<RuntimeRequest>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), ProxyError> {
        let InboundLogin {
            username,
            link: client,
        } = login;
        info!(%username, "client connected to proxy");
        self.emit(ProxyEvent::ConnectedLocal).await;

        let (reply_tx, reply_rx) = oneshot::channel();
        runtime
            .send(RuntimeRequest::Connect {
                host: self.config.upstream.host.clone(),
                port: self.config.upstream.port,
                username: username.clone(),
                auth: self.config.proxy.auth,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ProxyError::RuntimeUnavailable)?;

        let remote = match reply_rx.await {
            Ok(Ok(link)) => link,
            Ok(Err(err)) => {
                warn!(error = %err, "failed to open upstream connection");
                self.emit(ProxyEvent::RemoteError(err)).await;
                client.writer.end("Error");
                return Ok(());
            }
            Err(_) => return Err(ProxyError::RuntimeUnavailable),
        };

        let session = Session::new(
            Arc::clone(&self.registries),
            Arc::clone(&self.codec),
            self.events.clone(),
            client.writer.clone(),
            remote.writer.clone(),
            self.config.tracking.join_delay(),
        );
        *self
            .handle
            .session
            .lock()
            .expect("session slot lock poisoned") = Some(session.clone());

        let done = session.clone().run(client.events, remote.events);
        tokio::pin!(done);
        loop {
            tokio::select! {
                _ = &mut done => break,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        session.close_both("Proxy shutting down");
                        let _ = tokio::time::timeout(SHUTDOWN_GRACE, &mut done).await;
                        break;
                    }
                }
            }
        }

        *self
            .handle
            .session
            .lock()
            .expect("session slot lock poisoned") = None;
        info!(%username, "session closed");
        Ok(())
    }

    async fn emit(&self, event: ProxyEvent) {
        let _ = self.events.send(event).await;
    }
}
