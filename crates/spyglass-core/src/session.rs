//! One relayed session: the paired links, the per-direction pipelines, the
//! derived roster/bot/location state, and lock-step lifecycle teardown.
//!
//! Each direction is pumped by its own task; packets within a direction are
//! processed and forwarded in arrival order. The pipeline per frame is:
//! global interceptor → named hook → built-in logic (clientbound) or
//! command routing (serverbound chat) → forward the original bytes
//! unchanged. Built-in logic observes but never consumes; only hooks and
//! command routing can stop a packet.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use spyglass_proto::chat::ChatMessage;
use spyglass_proto::codec::PacketCodec;
use spyglass_proto::packets::{ClientChat, ObjectiveMode, Packet, PlayerInfoAction, ServerChat};
use spyglass_proto::types::{Direction, ProtocolState, RawFrame};

use crate::bots::BotRegistry;
use crate::commands::{parse_command, CommandContext};
use crate::events::ProxyEvent;
use crate::hooks::{run_packet_hook, run_raw_hook, HookOutcome};
use crate::link::{LinkEvent, LinkState, LinkWriter};
use crate::location::{ChatDisposition, Location, LocationCorrelator, LOCATION_QUERY};
use crate::proxy::Registries;
use crate::roster::{Player, Roster, PREGAME_OBJECTIVE};

/// Packet names the relay decodes on the clientbound lane.
const CLIENTBOUND_PARSED: &[&str] = &[
    "named_entity_spawn",
    "player_info",
    "entity_destroy",
    "login",
    "scoreboard_objective",
    "scoreboard_team",
    "spawn_position",
    "chat",
];

/// Packet names the relay decodes on the serverbound lane.
const SERVERBOUND_PARSED: &[&str] = &["chat"];

/// Session state shared by the two pump tasks and the join timers.
struct SessionShared {
    roster: Roster,
    bots: BotRegistry,
    correlator: LocationCorrelator,
    client_state: LinkState,
    remote_state: LinkState,
    client_play: bool,
    remote_play: bool,
    pending_joins: HashMap<String, JoinHandle<()>>,
}

impl SessionShared {
    fn new() -> Self {
        Self {
            roster: Roster::new(),
            bots: BotRegistry::new(),
            correlator: LocationCorrelator::new(),
            client_state: LinkState::Open,
            remote_state: LinkState::Open,
            client_play: false,
            remote_play: false,
            pending_joins: HashMap::new(),
        }
    }
}

/// One client ↔ upstream relay session.
#[derive(Clone)]
pub(crate) struct Session {
    shared: Arc<Mutex<SessionShared>>,
    registries: Arc<Registries>,
    codec: Arc<dyn PacketCodec>,
    events: mpsc::Sender<ProxyEvent>,
    client: LinkWriter,
    remote: LinkWriter,
    join_delay: Duration,
}

impl Session {
    pub(crate) fn new(
        registries: Arc<Registries>,
        codec: Arc<dyn PacketCodec>,
        events: mpsc::Sender<ProxyEvent>,
        client: LinkWriter,
        remote: LinkWriter,
        join_delay: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Mutex::new(SessionShared::new())),
            registries,
            codec,
            events,
            client,
            remote,
            join_delay,
        }
    }

    /// Drive both pumps until both link event streams are exhausted.
    pub(crate) async fn run(
        self,
        client_events: mpsc::Receiver<LinkEvent>,
        remote_events: mpsc::Receiver<LinkEvent>,
    ) {
        let clientbound = tokio::spawn(self.clone().pump_clientbound(remote_events));
        let serverbound = tokio::spawn(self.clone().pump_serverbound(client_events));
        let _ = serverbound.await;
        let _ = clientbound.await;
    }

    /// Request a close on whichever sides are still open. Used on shutdown;
    /// the runtime confirms with End events that finish the pumps.
    pub(crate) fn close_both(&self, reason: &str) {
        let mut shared = self.lock();
        for (_, pending) in shared.pending_joins.drain() {
            pending.abort();
        }
        if shared.client_state.is_open() {
            shared.client_state = LinkState::Ending;
            self.client.end(reason);
        }
        if shared.remote_state.is_open() {
            shared.remote_state = LinkState::Ending;
            self.remote.end(reason);
        }
    }

    pub(crate) fn players(&self) -> Vec<Player> {
        self.lock().roster.players().cloned().collect()
    }

    pub(crate) fn player(&self, uuid: &str) -> Option<Player> {
        self.lock().roster.player(uuid).cloned()
    }

    pub(crate) fn location(&self) -> Location {
        self.lock().correlator.current().clone()
    }

    /// Encode and write a relay-constructed packet to one side, respecting
    /// that side's lifecycle state.
    pub(crate) fn write_packet(&self, direction: Direction, packet: &Packet) {
        match self.codec.encode(direction, packet) {
            Ok(data) => {
                let open = {
                    let shared = self.lock();
                    match direction {
                        Direction::Clientbound => shared.client_state.is_open(),
                        Direction::Serverbound => shared.remote_state.is_open(),
                    }
                };
                if open {
                    match direction {
                        Direction::Clientbound => self.client.write_raw(data),
                        Direction::Serverbound => self.remote.write_raw(data),
                    }
                }
            }
            Err(err) => {
                warn!(packet = packet.wire_name(), error = %err, "failed to encode packet");
            }
        }
    }

    // ─── Pumps ───────────────────────────────────────────────────────────

    async fn pump_serverbound(self, mut events: mpsc::Receiver<LinkEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                LinkEvent::Frame(frame) => self.handle_serverbound_frame(frame),
                LinkEvent::State(state) => {
                    self.lock().client_play = state == ProtocolState::Play;
                }
                LinkEvent::End => {
                    self.on_client_terminal(None).await;
                    return;
                }
                LinkEvent::Error(err) => {
                    self.on_client_terminal(Some(err)).await;
                    return;
                }
            }
        }
        // Event stream dropped without a terminal event; treat it as an end.
        self.on_client_terminal(None).await;
    }

    async fn pump_clientbound(self, mut events: mpsc::Receiver<LinkEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                LinkEvent::Frame(frame) => self.handle_clientbound_frame(frame).await,
                LinkEvent::State(state) => {
                    let entered_play = {
                        let mut shared = self.lock();
                        let was = shared.remote_play;
                        shared.remote_play = state == ProtocolState::Play;
                        shared.remote_play && !was
                    };
                    if entered_play {
                        info!("upstream link ready");
                        self.emit(ProxyEvent::ConnectedRemote).await;
                    }
                }
                LinkEvent::End => {
                    self.on_remote_terminal(None).await;
                    return;
                }
                LinkEvent::Error(err) => {
                    self.on_remote_terminal(Some(err)).await;
                    return;
                }
            }
        }
        self.on_remote_terminal(None).await;
    }

    // ─── Pipelines ───────────────────────────────────────────────────────

    fn handle_serverbound_frame(&self, frame: RawFrame) {
        {
            let shared = self.lock();
            if frame.state != ProtocolState::Play
                || !shared.remote_play
                || !shared.remote_state.is_open()
            {
                return;
            }
        }

        if let Some(hook) = self.registries.serverbound_global() {
            if run_raw_hook(&hook, &frame) == HookOutcome::Consume {
                return;
            }
        }

        let named = self.registries.serverbound_hook(&frame.name);
        if named.is_some() || SERVERBOUND_PARSED.contains(&frame.name.as_str()) {
            match self
                .codec
                .decode(Direction::Serverbound, &frame.name, &frame.data)
            {
                Ok(packet) => {
                    if let Some(hook) = named {
                        if run_packet_hook(&hook, &packet) == HookOutcome::Consume {
                            return;
                        }
                    }
                    if let Packet::ClientChat(chat) = &packet {
                        if self.route_command(&chat.message) {
                            return;
                        }
                    }
                }
                Err(err) => {
                    error!(packet = %frame.name, error = %err, "failed to decode serverbound packet");
                }
            }
        }

        if self.lock().remote_state.is_open() {
            self.remote.write_raw(frame.data);
        }
    }

    async fn handle_clientbound_frame(&self, frame: RawFrame) {
        {
            let shared = self.lock();
            if frame.state != ProtocolState::Play
                || !shared.client_play
                || !shared.client_state.is_open()
            {
                return;
            }
        }

        if let Some(hook) = self.registries.clientbound_global() {
            if run_raw_hook(&hook, &frame) == HookOutcome::Consume {
                return;
            }
        }

        let named = self.registries.clientbound_hook(&frame.name);
        if named.is_some() || CLIENTBOUND_PARSED.contains(&frame.name.as_str()) {
            match self
                .codec
                .decode(Direction::Clientbound, &frame.name, &frame.data)
            {
                Ok(packet) => {
                    if let Some(hook) = named {
                        if run_packet_hook(&hook, &packet) == HookOutcome::Consume {
                            return;
                        }
                    }
                    self.observe_clientbound(&packet).await;
                }
                Err(err) => {
                    error!(packet = %frame.name, error = %err, "failed to decode clientbound packet");
                }
            }
        }

        if self.lock().client_state.is_open() {
            self.client.write_raw(frame.data);
        }
    }

    /// Returns true when the message was dispatched to a registered command
    /// and must not be forwarded upstream.
    fn route_command(&self, message: &str) -> bool {
        let Some((name, args)) = parse_command(message) else {
            return false;
        };
        let Some(handler) = self.registries.command(name) else {
            return false;
        };
        let (players, location) = {
            let shared = self.lock();
            (
                shared.roster.players().cloned().collect(),
                shared.correlator.current().clone(),
            )
        };
        debug!(command = name, "dispatching chat command");
        let reply = |text: &str| self.send_client_chat(text);
        let send_upstream = |text: &str| self.send_server_chat(text);
        let ctx = CommandContext::new(args, players, location, &reply, &send_upstream);
        if let Err(err) = handler(&ctx) {
            warn!(command = name, error = %err, "command handler failed");
        }
        true
    }

    // ─── Built-in clientbound logic ──────────────────────────────────────

    async fn observe_clientbound(&self, packet: &Packet) {
        match packet {
            Packet::PlayerInfo(info) => {
                if info.action == PlayerInfoAction::AddPlayer {
                    if let Some(entry) = info.entries.first() {
                        self.schedule_join(entry.uuid.clone(), entry.username.clone());
                    }
                }
            }
            Packet::NamedEntitySpawn(spawn) => {
                self.lock()
                    .roster
                    .record_spawn(spawn.entity_id, spawn.player_uuid.clone());
            }
            Packet::EntityDestroy(destroy) => {
                let removed: Vec<Player> = {
                    let mut shared = self.lock();
                    destroy
                        .entity_ids
                        .iter()
                        .filter_map(|id| shared.roster.remove_by_entity(*id))
                        .collect()
                };
                for player in removed {
                    self.emit(ProxyEvent::PlayerLeave {
                        uuid: player.uuid,
                        username: player.username,
                    })
                    .await;
                }
            }
            Packet::JoinGame(_) => {
                let drained = self.lock().roster.drain();
                if !drained.is_empty() {
                    debug!(players = drained.len(), "world login reset the roster");
                }
                for player in drained {
                    self.emit(ProxyEvent::PlayerLeave {
                        uuid: player.uuid,
                        username: player.username,
                    })
                    .await;
                }
            }
            Packet::ScoreboardObjective(objective) => {
                if objective.mode == ObjectiveMode::Create {
                    let active = objective.name == PREGAME_OBJECTIVE;
                    let mut shared = self.lock();
                    shared.roster.set_tracking(active);
                    if !active {
                        shared.bots.clear();
                    }
                    debug!(active, "roster tracking toggled");
                }
            }
            Packet::ScoreboardTeam(team) => {
                let mut shared = self.lock();
                if shared.roster.tracking() && shared.bots.observe(team) {
                    debug!(team = %team.name, "flagged synthetic player");
                }
            }
            Packet::SpawnPosition(_) => {
                self.lock().correlator.arm();
                self.send_server_chat(LOCATION_QUERY);
                debug!("location query sent");
            }
            Packet::ServerChat(chat) => match ChatMessage::from_json(&chat.body) {
                Ok(message) => {
                    let disposition = self.lock().correlator.observe_chat(&message);
                    match disposition {
                        ChatDisposition::Location(location) => {
                            info!(server = %location.server, "location updated");
                            self.emit(ProxyEvent::Location(location)).await;
                        }
                        ChatDisposition::Chat => {
                            self.emit(ProxyEvent::Chat(message)).await;
                        }
                    }
                }
                Err(err) => {
                    error!(error = %err, "malformed clientbound chat payload");
                }
            },
            Packet::ClientChat(_) => {}
        }
    }

    /// Defer a roster add long enough for the upstream's pre-game tab-list
    /// burst to be retracted. A later add for the same uuid replaces the
    /// pending timer; session teardown aborts all of them.
    fn schedule_join(&self, uuid: String, username: String) {
        let shared = Arc::clone(&self.shared);
        let events = self.events.clone();
        let delay = self.join_delay;
        let task_uuid = uuid.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let join = {
                let mut shared = shared.lock().expect("session state lock poisoned");
                shared.pending_joins.remove(&task_uuid);
                // A timer racing session teardown must stay silent even if
                // the abort lost the race.
                let session_live =
                    shared.client_state.is_open() && shared.remote_state.is_open();
                if session_live
                    && !username.is_empty()
                    && shared.roster.insert(task_uuid.clone(), username.clone())
                {
                    let is_bot = shared.bots.contains(&username);
                    Some(ProxyEvent::PlayerJoin {
                        uuid: task_uuid,
                        username,
                        is_bot,
                    })
                } else {
                    None
                }
            };
            if let Some(event) = join {
                let _ = events.send(event).await;
            }
        });
        if let Some(previous) = self.lock().pending_joins.insert(uuid, handle) {
            previous.abort();
        }
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    async fn on_client_terminal(&self, error: Option<String>) {
        let close_remote = {
            let mut shared = self.lock();
            if shared.client_state == LinkState::Ended {
                false
            } else {
                shared.client_state = LinkState::Ended;
                for (_, pending) in shared.pending_joins.drain() {
                    pending.abort();
                }
                if shared.remote_state.is_open() {
                    shared.remote_state = LinkState::Ending;
                    true
                } else {
                    false
                }
            }
        };
        if close_remote {
            match error {
                Some(err) => {
                    warn!(error = %err, "client connection error");
                    self.emit(ProxyEvent::ClientError(err)).await;
                    self.remote.end("Error");
                }
                None => {
                    info!("client connection ended");
                    self.emit(ProxyEvent::ClientEnd).await;
                    self.remote.end("End");
                }
            }
        }
    }

    async fn on_remote_terminal(&self, error: Option<String>) {
        let close_client = {
            let mut shared = self.lock();
            if shared.remote_state == LinkState::Ended {
                false
            } else {
                shared.remote_state = LinkState::Ended;
                for (_, pending) in shared.pending_joins.drain() {
                    pending.abort();
                }
                if shared.client_state.is_open() {
                    shared.client_state = LinkState::Ending;
                    true
                } else {
                    false
                }
            }
        };
        if close_client {
            match error {
                Some(err) => {
                    warn!(error = %err, "upstream connection error");
                    self.emit(ProxyEvent::RemoteError(err)).await;
                    self.client.end("Error");
                }
                None => {
                    info!("upstream connection ended");
                    self.emit(ProxyEvent::RemoteEnd).await;
                    self.client.end("End");
                }
            }
        }
    }

    // ─── Helpers ─────────────────────────────────────────────────────────

    fn send_client_chat(&self, text: &str) {
        match ChatMessage::plain(text).to_json() {
            Ok(body) => self.write_packet(
                Direction::Clientbound,
                &Packet::ServerChat(ServerChat { body, position: 0 }),
            ),
            Err(err) => warn!(error = %err, "failed to serialize chat message"),
        }
    }

    fn send_server_chat(&self, text: &str) {
        self.write_packet(
            Direction::Serverbound,
            &Packet::ClientChat(ClientChat {
                message: text.into(),
            }),
        );
    }

    async fn emit(&self, event: ProxyEvent) {
        let _ = self.events.send(event).await;
    }

    fn lock(&self) -> MutexGuard<'_, SessionShared> {
        self.shared.lock().expect("session state lock poisoned")
    }
}
