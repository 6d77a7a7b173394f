//! Packet hook registries for external interception.
//!
//! Hooks come in two shapes per direction: named hooks that see one decoded
//! packet type, and a single optional global interceptor that sees every
//! raw frame before anything else. A hook that returns
//! [`HookOutcome::Consume`] stops the pipeline for that packet instance —
//! later stages are skipped and the bytes are not forwarded.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use spyglass_proto::packets::Packet;
use spyglass_proto::types::RawFrame;

/// Error type surfaced by hook and command handlers. A failing handler is
/// logged and never tears down the relay.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// What a hook decided about the packet it saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    /// Let the rest of the pipeline run.
    Continue,
    /// Swallow the packet: skip later stages and do not forward it.
    Consume,
}

pub type PacketHook = Arc<dyn Fn(&Packet) -> Result<HookOutcome, HandlerError> + Send + Sync>;
pub type RawHook = Arc<dyn Fn(&RawFrame) -> Result<HookOutcome, HandlerError> + Send + Sync>;

/// Named per-packet hooks plus the optional whole-stream interceptor, for
/// one direction. Registration for an existing key replaces the earlier
/// handler; removing an absent key is a no-op.
#[derive(Default)]
pub struct DirectionHooks {
    named: HashMap<String, PacketHook>,
    global: Option<RawHook>,
}

impl DirectionHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, packet_name: impl Into<String>, hook: PacketHook) {
        self.named.insert(packet_name.into(), hook);
    }

    pub fn unregister(&mut self, packet_name: &str) {
        self.named.remove(packet_name);
    }

    pub fn get(&self, packet_name: &str) -> Option<PacketHook> {
        self.named.get(packet_name).cloned()
    }

    pub fn set_global(&mut self, hook: RawHook) {
        self.global = Some(hook);
    }

    pub fn clear_global(&mut self) {
        self.global = None;
    }

    pub fn global(&self) -> Option<RawHook> {
        self.global.clone()
    }
}

/// Invoke a named hook, degrading a handler fault to `Continue`.
pub fn run_packet_hook(hook: &PacketHook, packet: &Packet) -> HookOutcome {
    match hook(packet) {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(packet = packet.wire_name(), error = %err, "packet hook failed");
            HookOutcome::Continue
        }
    }
}

/// Invoke a global interceptor, degrading a handler fault to `Continue`.
pub fn run_raw_hook(hook: &RawHook, frame: &RawFrame) -> HookOutcome {
    match hook(frame) {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(packet = %frame.name, error = %err, "stream interceptor failed");
            HookOutcome::Continue
        }
    }
}
