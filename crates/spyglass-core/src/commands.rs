//! Chat command parsing, registry, and the built-in command.
//!
//! Commands ride the serverbound chat lane: a message starting with `/`
//! whose first token matches a registered name is dispatched locally and
//! never reaches the upstream. Unmatched slash-messages pass through, so
//! real server commands keep working.

use std::collections::HashMap;
use std::sync::Arc;

use crate::hooks::HandlerError;
use crate::location::Location;
use crate::roster::Player;

/// Prefix that marks an outbound chat line as a command.
pub const COMMAND_PREFIX: char = '/';

/// Context passed to a command handler.
pub struct CommandContext<'a> {
    /// Whitespace-separated tokens after the command name.
    pub args: Vec<String>,
    /// Players currently tracked by the session.
    pub players: Vec<Player>,
    /// Last correlated location.
    pub location: Location,
    reply_fn: &'a dyn Fn(&str),
    upstream_fn: &'a dyn Fn(&str),
}

impl<'a> CommandContext<'a> {
    pub fn new(
        args: Vec<String>,
        players: Vec<Player>,
        location: Location,
        reply_fn: &'a dyn Fn(&str),
        upstream_fn: &'a dyn Fn(&str),
    ) -> Self {
        Self {
            args,
            players,
            location,
            reply_fn,
            upstream_fn,
        }
    }

    /// Send a chat line to the proxied client only.
    pub fn reply(&self, text: &str) {
        (self.reply_fn)(text);
    }

    /// Send a chat line upstream as the player.
    pub fn send_upstream(&self, text: &str) {
        (self.upstream_fn)(text);
    }
}

pub type CommandHandler =
    Arc<dyn Fn(&CommandContext) -> Result<(), HandlerError> + Send + Sync>;

/// Registry of chat commands. One handler per name, last write wins.
pub struct CommandRegistry {
    commands: HashMap<String, CommandHandler>,
}

impl CommandRegistry {
    /// Create a registry with the built-in `list` command.
    pub fn new() -> Self {
        let mut registry = Self {
            commands: HashMap::new(),
        };
        registry.register("list", Arc::new(cmd_list));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, handler: CommandHandler) {
        self.commands.insert(name.into(), handler);
    }

    /// Remove a command. Unregistering an absent name is a no-op.
    pub fn unregister(&mut self, name: &str) {
        self.commands.remove(name);
    }

    pub fn get(&self, name: &str) -> Option<CommandHandler> {
        self.commands.get(name).cloned()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a chat line into a command name and its arguments, if it is one.
pub fn parse_command(message: &str) -> Option<(&str, Vec<String>)> {
    let rest = message.trim().strip_prefix(COMMAND_PREFIX)?;
    let mut tokens = rest.split_whitespace();
    let name = tokens.next()?;
    Some((name, tokens.map(str::to_string).collect()))
}

/// Built-in `list`: answer with the colored online-player line.
fn cmd_list(ctx: &CommandContext) -> Result<(), HandlerError> {
    let mut line = format!("\u{a7}7Online (\u{a7}b{}\u{a7}7):", ctx.players.len());
    for player in &ctx.players {
        line.push_str(" \u{a7}a");
        line.push_str(&player.username);
    }
    ctx.reply(&line);
    Ok(())
}
