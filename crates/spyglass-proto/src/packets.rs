//! Field structures for the packet names the relay inspects.
//!
//! Only a fixed set of 1.8 play-state packets is modeled; everything else
//! crosses the relay as opaque bytes and never reaches these types.

use crate::error::CodecError;

/// player_info action codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInfoAction {
    AddPlayer,
    UpdateGameMode,
    UpdateLatency,
    UpdateDisplayName,
    RemovePlayer,
}

impl PlayerInfoAction {
    pub fn from_i32(v: i32) -> Result<Self, CodecError> {
        match v {
            0 => Ok(Self::AddPlayer),
            1 => Ok(Self::UpdateGameMode),
            2 => Ok(Self::UpdateLatency),
            3 => Ok(Self::UpdateDisplayName),
            4 => Ok(Self::RemovePlayer),
            _ => Err(CodecError::UnknownCode {
                field: "player_info action",
                value: v,
            }),
        }
    }
}

/// One entry of a player_info packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfoEntry {
    pub uuid: String,
    pub username: String,
}

/// player_info — tab-list add/update/remove notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfo {
    pub action: PlayerInfoAction,
    pub entries: Vec<PlayerInfoEntry>,
}

/// named_entity_spawn — a player entity appearing in view range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedEntitySpawn {
    pub entity_id: i32,
    pub player_uuid: String,
}

/// entity_destroy — entities leaving view range or the world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDestroy {
    pub entity_ids: Vec<i32>,
}

/// The clientbound `login` packet: a fresh world join, also sent mid-session
/// on a server switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinGame {
    pub entity_id: i32,
    pub dimension: i8,
}

/// scoreboard_objective mode codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveMode {
    Create,
    Remove,
    Update,
}

impl ObjectiveMode {
    pub fn from_i8(v: i8) -> Result<Self, CodecError> {
        match v {
            0 => Ok(Self::Create),
            1 => Ok(Self::Remove),
            2 => Ok(Self::Update),
            _ => Err(CodecError::UnknownCode {
                field: "scoreboard_objective mode",
                value: v as i32,
            }),
        }
    }
}

/// scoreboard_objective — objective created, removed, or retitled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreboardObjective {
    pub name: String,
    pub mode: ObjectiveMode,
    pub display_text: Option<String>,
}

/// scoreboard_team mode codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamMode {
    Create,
    Remove,
    InfoUpdate,
    AddPlayers,
    RemovePlayers,
}

impl TeamMode {
    pub fn from_i8(v: i8) -> Result<Self, CodecError> {
        match v {
            0 => Ok(Self::Create),
            1 => Ok(Self::Remove),
            2 => Ok(Self::InfoUpdate),
            3 => Ok(Self::AddPlayers),
            4 => Ok(Self::RemovePlayers),
            _ => Err(CodecError::UnknownCode {
                field: "scoreboard_team mode",
                value: v as i32,
            }),
        }
    }
}

/// scoreboard_team — team membership and decoration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreboardTeam {
    pub name: String,
    pub mode: TeamMode,
    pub display_name: String,
    pub prefix: String,
    pub suffix: String,
    pub color: i8,
    pub players: Vec<String>,
}

/// spawn_position — the compass/world-spawn point, sent once per world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnPosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Clientbound chat: a JSON chat payload plus its screen position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerChat {
    /// JSON-encoded [`crate::chat::ChatMessage`].
    pub body: String,
    pub position: i8,
}

/// Serverbound chat: the plain message the player typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientChat {
    pub message: String,
}

/// A decoded packet from the relay's allow-list.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    PlayerInfo(PlayerInfo),
    NamedEntitySpawn(NamedEntitySpawn),
    EntityDestroy(EntityDestroy),
    JoinGame(JoinGame),
    ScoreboardObjective(ScoreboardObjective),
    ScoreboardTeam(ScoreboardTeam),
    SpawnPosition(SpawnPosition),
    ServerChat(ServerChat),
    ClientChat(ClientChat),
}

impl Packet {
    /// Wire name of this packet in the fixed 1.8 mapping.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Packet::PlayerInfo(_) => "player_info",
            Packet::NamedEntitySpawn(_) => "named_entity_spawn",
            Packet::EntityDestroy(_) => "entity_destroy",
            Packet::JoinGame(_) => "login",
            Packet::ScoreboardObjective(_) => "scoreboard_objective",
            Packet::ScoreboardTeam(_) => "scoreboard_team",
            Packet::SpawnPosition(_) => "spawn_position",
            Packet::ServerChat(_) | Packet::ClientChat(_) => "chat",
        }
    }
}
