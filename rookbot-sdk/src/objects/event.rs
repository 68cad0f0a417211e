//! Stream events.
//!
//! Only the envelope is interpreted here: every event is a JSON object with
//! a `type` field. Keep-alive newlines are surfaced as [`Event::Ping`] so a
//! consumer can observe liveness.

use serde_json::{Map, Value};

use super::challenge::ChallengeSummary;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Synthesized from a blank keep-alive line.
    Ping,
    /// One decoded JSON object, verbatim.
    Message(Map<String, Value>),
}

impl Event {
    /// Decode one NDJSON line. Whitespace-only lines are heartbeats.
    pub fn decode_line(line: &[u8]) -> Result<Self, serde_json::Error> {
        if line.iter().all(u8::is_ascii_whitespace) {
            return Ok(Event::Ping);
        }
        serde_json::from_slice(line).map(Event::Message)
    }

    /// The `type` discriminator; `"ping"` for heartbeats and `""` when absent.
    pub fn kind(&self) -> &str {
        match self {
            Event::Ping => "ping",
            Event::Message(map) => map.get("type").and_then(Value::as_str).unwrap_or(""),
        }
    }

    pub fn is_ping(&self) -> bool {
        matches!(self, Event::Ping)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Event::Ping => None,
            Event::Message(map) => map.get(key),
        }
    }

    /// The challenge carried by `challenge`, `challengeCanceled` and
    /// `challengeDeclined` events.
    pub fn challenge(&self) -> Option<ChallengeSummary> {
        self.get("challenge")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Game id of `gameStart` / `gameFinish` events, or of a `gameFull`
    /// event on a game stream.
    pub fn game_id(&self) -> Option<&str> {
        if let Some(game) = self.get("game") {
            return game
                .get("gameId")
                .or_else(|| game.get("id"))
                .and_then(Value::as_str);
        }
        match self.kind() {
            "gameFull" => self.get("id").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Render as JSON. Heartbeats render as `{"type":"ping"}`.
    pub fn into_value(self) -> Value {
        match self {
            Event::Ping => {
                let mut map = Map::new();
                map.insert("type".to_owned(), Value::from("ping"));
                Value::Object(map)
            }
            Event::Message(map) => Value::Object(map),
        }
    }
}
