//! Heuristic identification of upstream-controlled synthetic players.
//!
//! The upstream marks its synthetic players with a distinctive scoreboard
//! team: a bare red prefix, the matching red color code, no suffix, on team
//! creation. This is a convention of that upstream, not a protocol
//! capability, so the match is bit-exact and nothing else is inferred.

use spyglass_proto::packets::{ScoreboardTeam, TeamMode};

/// Team prefix the upstream assigns to synthetic players.
pub const BOT_TEAM_PREFIX: &str = "\u{a7}c";
/// Team color code paired with the prefix (red).
pub const BOT_TEAM_COLOR: i8 = 12;

/// Exact-field bot signature match. Returns the flagged username (the first
/// listed team member) when every field matches.
pub fn classify(team: &ScoreboardTeam) -> Option<&str> {
    // The rule only applies to teams that name players and carry a prefix.
    if team.players.is_empty() || team.prefix.is_empty() {
        return None;
    }
    if team.prefix == BOT_TEAM_PREFIX
        && team.color == BOT_TEAM_COLOR
        && team.suffix.is_empty()
        && team.mode == TeamMode::Create
    {
        team.players.first().map(String::as_str)
    } else {
        None
    }
}

/// Usernames classified as synthetic players for the current session.
/// Cleared whenever roster tracking deactivates.
#[derive(Debug, Default)]
pub struct BotRegistry {
    names: Vec<String>,
}

impl BotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a scoreboard_team packet through the classifier, recording the
    /// flagged name. Returns whether anything was recorded.
    pub fn observe(&mut self, team: &ScoreboardTeam) -> bool {
        match classify(team) {
            Some(name) => {
                self.names.push(name.to_string());
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, username: &str) -> bool {
        self.names.iter().any(|name| name == username)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }
}
