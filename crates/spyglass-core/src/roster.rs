//! Tracks the set of known players and their transient entity ids.
//!
//! The upstream emits a burst of throwaway tab-list entries while a game
//! lobby assembles; the tracking gate (derived from the pre-game scoreboard
//! objective) keeps those from surfacing as real joins.

use std::collections::HashMap;

/// Objective name the upstream creates while a lobby is still assembling.
/// Its creation turns roster tracking on; any other objective turns it off.
pub const PREGAME_OBJECTIVE: &str = "PreScoreboard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub uuid: String,
    pub username: String,
}

/// Player set plus the entity-id ↔ uuid bimap, behind a tracking gate.
///
/// Both mapping directions are always kept consistent: a uuid is present in
/// the bimap only together with its entity id, and removal drops both
/// directions atomically.
#[derive(Debug, Default)]
pub struct Roster {
    players: HashMap<String, Player>,
    uuid_to_entity: HashMap<String, i32>,
    entity_to_uuid: HashMap<i32, String>,
    tracking: bool,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracking(&self) -> bool {
        self.tracking
    }

    /// Toggle the tracking gate. Deactivation silently clears all state.
    pub fn set_tracking(&mut self, active: bool) {
        self.tracking = active;
        if !active {
            self.clear();
        }
    }

    pub fn contains(&self, uuid: &str) -> bool {
        self.players.contains_key(uuid)
    }

    pub fn player(&self, uuid: &str) -> Option<&Player> {
        self.players.get(uuid)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn entity_id(&self, uuid: &str) -> Option<i32> {
        self.uuid_to_entity.get(uuid).copied()
    }

    pub fn uuid_for_entity(&self, entity_id: i32) -> Option<&str> {
        self.entity_to_uuid.get(&entity_id).map(String::as_str)
    }

    /// Insert a player. Suppressed while tracking is inactive or when the
    /// uuid is already present; returns whether an insert happened.
    pub fn insert(&mut self, uuid: String, username: String) -> bool {
        if !self.tracking || self.players.contains_key(&uuid) {
            return false;
        }
        self.players.insert(
            uuid.clone(),
            Player { uuid, username },
        );
        true
    }

    /// Record an entity-id ↔ uuid association from a spawn, displacing any
    /// stale pairing on either key.
    pub fn record_spawn(&mut self, entity_id: i32, uuid: String) {
        if let Some(old_id) = self.uuid_to_entity.insert(uuid.clone(), entity_id) {
            if old_id != entity_id {
                self.entity_to_uuid.remove(&old_id);
            }
        }
        if let Some(old_uuid) = self.entity_to_uuid.insert(entity_id, uuid.clone()) {
            if old_uuid != uuid {
                self.uuid_to_entity.remove(&old_uuid);
            }
        }
    }

    /// Remove a player by entity id. A missing mapping or inactive tracking
    /// is a silent no-op. The mapping is dropped even when the player was
    /// never confirmed; the player is returned only when one was.
    pub fn remove_by_entity(&mut self, entity_id: i32) -> Option<Player> {
        if !self.tracking {
            return None;
        }
        let uuid = self.entity_to_uuid.remove(&entity_id)?;
        self.uuid_to_entity.remove(&uuid);
        self.players.remove(&uuid)
    }

    /// Hard reset for a fresh world login: return every tracked player (the
    /// caller emits a leave for each) and clear everything.
    pub fn drain(&mut self) -> Vec<Player> {
        self.uuid_to_entity.clear();
        self.entity_to_uuid.clear();
        self.players.drain().map(|(_, player)| player).collect()
    }

    /// Silent reset. No leave events are owed for this.
    pub fn clear(&mut self) {
        self.players.clear();
        self.uuid_to_entity.clear();
        self.entity_to_uuid.clear();
    }
}
