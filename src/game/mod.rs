//! Game Logic Module
//!
//! Duel rules. Synchronous and free of I/O.
//!
//! ## Module Structure
//!
//! - `moves`: Rock, paper, scissors and the relation between them
//! - `seat`: Seat identity and per-seat pairs
//! - `round`: Health, pending choices, round resolution

pub mod moves;
pub mod round;
pub mod seat;

// Re-export key types
pub use moves::{Move, Outcome};
pub use round::{DuelState, LockInOutcome, MatchResult, RoundResolution};
pub use seat::{Seat, SeatPair};
