//! Chat-correlated discovery of the player's current sub-server.
//!
//! The upstream has no dedicated packet for "where am I": the relay asks
//! with a chat command and the answer comes back as an ordinary chat line
//! carrying a JSON document. The correlator arms on `spawn_position` (sent
//! once per world, so once per server switch) and treats the next white
//! chat line that parses as a location as the response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use spyglass_proto::chat::ChatMessage;

/// Chat command sent upstream to request the current location.
pub const LOCATION_QUERY: &str = "/locraw";

/// Chat color the upstream uses for the location response.
const RESPONSE_COLOR: &str = "white";

/// Where the upstream says the player currently is. Open-ended: only
/// `server` is guaranteed, everything else depends on the game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub server: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gametype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lobbyname: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Location {
    /// Placeholder until the first successful correlation.
    pub fn limbo() -> Self {
        Self {
            server: "limbo".into(),
            gametype: None,
            mode: None,
            map: None,
            lobbyname: None,
            extra: serde_json::Map::new(),
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::limbo()
    }
}

/// What to do with a clientbound chat message after correlation.
#[derive(Debug, PartialEq)]
pub enum ChatDisposition {
    /// Not a location response; surface the ordinary chat event.
    Chat,
    /// The awaited location response; surface a location event instead.
    Location(Location),
}

/// One-shot request/response state machine layered on the chat channel.
#[derive(Debug, Default)]
pub struct LocationCorrelator {
    awaiting: bool,
    current: Location,
}

impl LocationCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn awaiting(&self) -> bool {
        self.awaiting
    }

    pub fn current(&self) -> &Location {
        &self.current
    }

    /// Arm the correlator; the caller sends [`LOCATION_QUERY`] upstream.
    pub fn arm(&mut self) {
        self.awaiting = true;
    }

    /// Classify a decoded clientbound chat message. While armed, a white
    /// message whose text parses as a location resolves the correlation;
    /// a parse failure is expected (any white chat can race the response)
    /// and falls through to ordinary chat handling.
    pub fn observe_chat(&mut self, message: &ChatMessage) -> ChatDisposition {
        if self.awaiting && message.color.as_deref() == Some(RESPONSE_COLOR) {
            if let Ok(location) = serde_json::from_str::<Location>(&message.text) {
                self.awaiting = false;
                self.current = location.clone();
                return ChatDisposition::Location(location);
            }
        }
        ChatDisposition::Chat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white(text: &str) -> ChatMessage {
        ChatMessage {
            color: Some("white".into()),
            ..ChatMessage::plain(text)
        }
    }

    #[test]
    fn starts_in_limbo() {
        let correlator = LocationCorrelator::new();
        assert_eq!(correlator.current().server, "limbo");
        assert!(!correlator.awaiting());
    }

    #[test]
    fn armed_white_json_resolves() {
        let mut correlator = LocationCorrelator::new();
        correlator.arm();
        let disposition = correlator.observe_chat(&white(
            r#"{"server":"mini121A","gametype":"SKYWARS","map":"Shire"}"#,
        ));
        match disposition {
            ChatDisposition::Location(location) => {
                assert_eq!(location.server, "mini121A");
                assert_eq!(location.gametype.as_deref(), Some("SKYWARS"));
                assert_eq!(location.map.as_deref(), Some("Shire"));
            }
            other => panic!("unexpected disposition: {other:?}"),
        }
        assert!(!correlator.awaiting());
        assert_eq!(correlator.current().server, "mini121A");
    }

    #[test]
    fn unarmed_white_json_stays_chat() {
        let mut correlator = LocationCorrelator::new();
        let disposition = correlator.observe_chat(&white(r#"{"server":"skywars"}"#));
        assert_eq!(disposition, ChatDisposition::Chat);
        assert_eq!(correlator.current().server, "limbo");
    }

    #[test]
    fn wrong_color_stays_chat_and_armed() {
        let mut correlator = LocationCorrelator::new();
        correlator.arm();
        let mut message = white(r#"{"server":"skywars"}"#);
        message.color = Some("gray".into());
        assert_eq!(correlator.observe_chat(&message), ChatDisposition::Chat);
        assert!(correlator.awaiting());
    }

    #[test]
    fn unparseable_white_chat_falls_through_and_stays_armed() {
        let mut correlator = LocationCorrelator::new();
        correlator.arm();
        let disposition = correlator.observe_chat(&white("You are AFK!"));
        assert_eq!(disposition, ChatDisposition::Chat);
        assert!(correlator.awaiting());

        // The real response can still land afterwards.
        let disposition = correlator.observe_chat(&white(r#"{"server":"lobby4"}"#));
        assert!(matches!(disposition, ChatDisposition::Location(_)));
    }

    #[test]
    fn unknown_fields_are_preserved() {
        let mut correlator = LocationCorrelator::new();
        correlator.arm();
        let disposition =
            correlator.observe_chat(&white(r#"{"server":"lobby1","shard":"red"}"#));
        match disposition {
            ChatDisposition::Location(location) => {
                assert_eq!(location.extra["shard"], "red");
            }
            other => panic!("unexpected disposition: {other:?}"),
        }
    }
}
