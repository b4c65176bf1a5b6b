//! # RPS Duel Server
//!
//! Authoritative session engine for real-time, two-seat rock-paper-scissors.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      RPS DUEL SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  game/           - Duel rules (synchronous, no I/O)          │
//! │  ├── moves.rs    - Rock / paper / scissors relation          │
//! │  ├── seat.rs     - Seat identity and per-seat pairs          │
//! │  └── round.rs    - Health, lock-ins, round resolution        │
//! │                                                              │
//! │  network/        - Sessions and transport                    │
//! │  ├── protocol.rs - Message types                             │
//! │  ├── session.rs  - Match session + forcing timer             │
//! │  ├── registry.rs - Live matches by id                        │
//! │  ├── matchmaker.rs - Single waiting slot                     │
//! │  ├── handler.rs  - Per-connection event dispatch             │
//! │  └── server.rs   - WebSocket server                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounds
//!
//! The first lock-in of a round starts a forcing timer; the round resolves
//! when the second seat locks in or the timer fires, whichever comes first.
//! A seat that has not locked in by then loses one health; otherwise the
//! losing throw loses one. Matches end when a seat reaches zero.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod game;
pub mod network;

// Re-export commonly used types
pub use game::{DuelState, MatchResult, Move, Seat, SeatPair};
pub use network::{DuelService, GameServer, MatchId, ServerConfig, ServerMessage, SessionConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Health each seat starts a match with.
pub const STARTING_HEALTH: i32 = 7;

/// Forcing interval in milliseconds.
pub const CLASH_INTERVAL_MS: u64 = 3000;
