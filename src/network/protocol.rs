//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! All messages are `type`-tagged JSON objects. Field names match the
//! browser client (`gameId`, `player`, `state`, `winner`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::moves::Move;
use crate::game::round::{MatchResult, RoundResolution};
use crate::game::seat::{Seat, SeatPair};

/// Opaque routing key for a match.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Borrow the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MatchId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server wall clock in Unix milliseconds.
pub fn timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// A seat commits to a move for the current round.
    #[serde(rename = "lock-in")]
    LockIn(LockIn),
}

/// Lock-in payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockIn {
    /// Match the choice belongs to.
    #[serde(rename = "gameId", alias = "matchId")]
    pub match_id: MatchId,
    /// Seat the sender claims to occupy.
    #[serde(rename = "player", alias = "seat")]
    pub seat: Seat,
    /// The thrown move.
    pub choice: Move,
    /// Client clock when the key was pressed.
    #[serde(default)]
    pub timestamp: i64,
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Health and thrown choices after a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    /// Health per seat, never negative.
    pub health: SeatPair<i32>,
    /// What each seat threw; `null` for a seat that did not lock in.
    pub choices: SeatPair<Option<Move>>,
}

impl From<&RoundResolution> for RoundSnapshot {
    fn from(resolution: &RoundResolution) -> Self {
        Self {
            health: resolution.health.map(|h| (*h).max(0)),
            choices: resolution.choices,
        }
    }
}

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Queued; no opponent yet.
    Waiting {
        /// Server time.
        timestamp: i64,
    },

    /// Paired into a match.
    GameStart {
        /// Seat assigned to the recipient.
        #[serde(rename = "player")]
        seat: Seat,
        /// Match to reference in lock-ins.
        #[serde(rename = "gameId")]
        match_id: MatchId,
        /// Server time.
        timestamp: i64,
    },

    /// The opponent has locked in this round.
    OpponentLocked {
        /// Server time.
        timestamp: i64,
    },

    /// A round resolved and the match goes on.
    Clash {
        /// Health and thrown choices.
        state: RoundSnapshot,
        /// Server time.
        timestamp: i64,
    },

    /// The final round resolved.
    GameEnd {
        /// Final health and thrown choices.
        state: RoundSnapshot,
        /// `"tie"`, `"seat 0 wins"` or `"seat 1 wins"`.
        winner: MatchResult,
        /// Server time.
        timestamp: i64,
    },

    /// The other seat's connection closed; the match is over.
    OpponentDisconnected {
        /// Server time.
        timestamp: i64,
    },
}

impl ServerMessage {
    /// `waiting` stamped now.
    pub fn waiting() -> Self {
        ServerMessage::Waiting { timestamp: timestamp_ms() }
    }

    /// `game_start` for the recipient in `seat`.
    pub fn game_start(seat: Seat, match_id: MatchId) -> Self {
        ServerMessage::GameStart {
            seat,
            match_id,
            timestamp: timestamp_ms(),
        }
    }

    /// `opponent_locked` stamped now.
    pub fn opponent_locked() -> Self {
        ServerMessage::OpponentLocked { timestamp: timestamp_ms() }
    }

    /// `clash` or `game_end`, depending on whether the round ended the match.
    pub fn round_resolved(resolution: &RoundResolution) -> Self {
        let state = RoundSnapshot::from(resolution);
        let timestamp = timestamp_ms();
        match resolution.result {
            Some(winner) => ServerMessage::GameEnd { state, winner, timestamp },
            None => ServerMessage::Clash { state, timestamp },
        }
    }

    /// `opponent_disconnected` stamped now.
    pub fn opponent_disconnected() -> Self {
        ServerMessage::OpponentDisconnected { timestamp: timestamp_ms() }
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Deserialize from a binary frame holding JSON.
    pub fn from_slice(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_parse_browser_lock_in() {
        let text = r#"{"type":"lock-in","player":1,"gameId":"abc123","timestamp":1700000000000,"choice":"scissors"}"#;
        let ClientMessage::LockIn(lock_in) = ClientMessage::from_json(text).unwrap();
        assert_eq!(lock_in.match_id, MatchId::from("abc123"));
        assert_eq!(lock_in.seat, Seat::One);
        assert_eq!(lock_in.choice, Move::Scissors);
        assert_eq!(lock_in.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_parse_lock_in_aliases() {
        let text = r#"{"type":"lock-in","seat":0,"matchId":"m1","choice":"rock"}"#;
        let ClientMessage::LockIn(lock_in) = ClientMessage::from_json(text).unwrap();
        assert_eq!(lock_in.seat, Seat::Zero);
        assert_eq!(lock_in.match_id.as_str(), "m1");
        assert_eq!(lock_in.timestamp, 0);
    }

    #[test]
    fn test_malformed_lock_ins_rejected() {
        let bad = [
            "not json",
            r#"{"type":"lock-in","player":0,"gameId":"m1"}"#,
            r#"{"type":"lock-in","player":2,"gameId":"m1","choice":"rock"}"#,
            r#"{"type":"lock-in","player":0,"gameId":"m1","choice":"lizard"}"#,
            r#"{"type":"ping","timestamp":1}"#,
            r#"{"player":0,"gameId":"m1","choice":"rock"}"#,
        ];
        for text in bad {
            assert!(ClientMessage::from_json(text).is_err(), "accepted {}", text);
        }
    }

    #[test]
    fn test_game_start_wire_shape() {
        let msg = ServerMessage::GameStart {
            seat: Seat::One,
            match_id: MatchId::from("xyz"),
            timestamp: 5,
        };
        let value: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(value, json!({"type": "game_start", "player": 1, "gameId": "xyz", "timestamp": 5}));
    }

    #[test]
    fn test_game_end_wire_shape() {
        let resolution = RoundResolution {
            health: SeatPair::new(1, -1),
            choices: SeatPair::new(Some(Move::Rock), Some(Move::Scissors)),
            result: Some(MatchResult::Winner(Seat::Zero)),
        };
        let msg = ServerMessage::round_resolved(&resolution);
        let mut value: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        value.as_object_mut().unwrap().remove("timestamp");
        assert_eq!(
            value,
            json!({
                "type": "game_end",
                "state": {"health": [1, 0], "choices": ["rock", "scissors"]},
                "winner": "seat 0 wins",
            })
        );
    }

    #[test]
    fn test_clash_carries_absent_choice_as_null() {
        let resolution = RoundResolution {
            health: SeatPair::new(2, 1),
            choices: SeatPair::new(Some(Move::Rock), None),
            result: None,
        };
        let json = ServerMessage::round_resolved(&resolution).to_json().unwrap();
        assert!(json.contains(r#""type":"clash""#));
        assert!(json.contains(r#""choices":["rock",null]"#));

        let parsed = ServerMessage::from_json(&json).unwrap();
        assert!(matches!(parsed, ServerMessage::Clash { state, .. } if state.health == SeatPair::new(2, 1)));
    }

    #[test]
    fn test_match_ids_unique() {
        assert_ne!(MatchId::generate(), MatchId::generate());
    }
}
