//! Network Layer
//!
//! Matchmaking, live match sessions and the WebSocket transport.
//! Timers and message delivery live here; the duel rules live in `game/`.

pub mod handler;
pub mod matchmaker;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;

pub use handler::DuelService;
pub use matchmaker::Matchmaker;
pub use protocol::{ClientMessage, LockIn, MatchId, RoundSnapshot, ServerMessage};
pub use registry::{SessionHandle, SessionRegistry};
pub use server::{ConfigError, GameServer, GameServerError, ServerConfig};
pub use session::{ChoiceEffect, MatchPhase, MatchSession, Participant, ParticipantId, SessionConfig};
