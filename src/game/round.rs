//! Round Resolution
//!
//! Health, pending choices and the clash rules. Pure and synchronous:
//! timers and message delivery live in `network/`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::game::moves::{Move, Outcome};
use crate::game::seat::{Seat, SeatPair};

/// Health lost for not locking in before the round resolves.
pub const ABSENCE_PENALTY: i32 = 1;

/// Health lost by the losing throw of a clash.
pub const CLASH_DAMAGE: i32 = 1;

/// How the match ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchResult {
    /// Both seats reached zero health in the same round.
    Tie,
    /// The given seat is the last one standing.
    Winner(Seat),
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchResult::Tie => f.write_str("tie"),
            MatchResult::Winner(seat) => write!(f, "{} wins", seat),
        }
    }
}

/// Result text that is not one of `tie`, `seat 0 wins`, `seat 1 wins`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown match result {0:?}")]
pub struct ParseResultError(pub String);

impl FromStr for MatchResult {
    type Err = ParseResultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tie" => Ok(MatchResult::Tie),
            "seat 0 wins" => Ok(MatchResult::Winner(Seat::Zero)),
            "seat 1 wins" => Ok(MatchResult::Winner(Seat::One)),
            other => Err(ParseResultError(other.to_string())),
        }
    }
}

impl Serialize for MatchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MatchResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// What a lock-in did to the round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockInOutcome {
    /// The seat already had a choice this round; nothing changed.
    Duplicate,
    /// Recorded; the other seat has not chosen yet.
    AwaitingOpponent,
    /// Recorded; both seats have now chosen.
    BothLocked,
}

/// Outcome of a single resolved round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundResolution {
    /// Health after the round.
    pub health: SeatPair<i32>,
    /// The choices that were resolved.
    pub choices: SeatPair<Option<Move>>,
    /// Set when the round ended the match.
    pub result: Option<MatchResult>,
}

/// Health and pending choices for one duel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DuelState {
    /// Remaining health per seat. May dip below zero only on the final round.
    pub health: SeatPair<i32>,
    /// Choices locked in for the current round.
    pub choices: SeatPair<Option<Move>>,
    /// Rounds resolved so far.
    pub round: u32,
}

impl DuelState {
    /// Fresh state with both seats at `starting_health`.
    pub fn new(starting_health: i32) -> Self {
        Self {
            health: SeatPair::splat(starting_health),
            choices: SeatPair::default(),
            round: 0,
        }
    }

    /// Record `choice` for `seat`. Only the first choice per seat per round counts.
    pub fn lock_in(&mut self, seat: Seat, choice: Move) -> LockInOutcome {
        let slot = &mut self.choices[seat];
        if slot.is_some() {
            return LockInOutcome::Duplicate;
        }
        *slot = Some(choice);

        if self.choices[seat.other()].is_some() {
            LockInOutcome::BothLocked
        } else {
            LockInOutcome::AwaitingOpponent
        }
    }

    /// Whether `seat` has chosen this round.
    pub fn has_locked(&self, seat: Seat) -> bool {
        self.choices[seat].is_some()
    }

    /// Resolve the current round and clear the pending choices.
    pub fn resolve(&mut self) -> RoundResolution {
        let choices = self.choices;

        for (seat, choice) in choices.iter() {
            if choice.is_none() {
                self.health[seat] -= ABSENCE_PENALTY;
            }
        }

        if let (Some(zero), Some(one)) = (choices[Seat::Zero], choices[Seat::One]) {
            match zero.versus(one) {
                Outcome::Win => self.health[Seat::One] -= CLASH_DAMAGE,
                Outcome::Lose => self.health[Seat::Zero] -= CLASH_DAMAGE,
                Outcome::Draw => {}
            }
        }

        self.choices = SeatPair::default();
        self.round += 1;

        RoundResolution {
            health: self.health,
            choices,
            result: self.result(),
        }
    }

    /// The match result, if either seat is out of health.
    pub fn result(&self) -> Option<MatchResult> {
        let zero_out = self.health[Seat::Zero] <= 0;
        let one_out = self.health[Seat::One] <= 0;
        match (zero_out, one_out) {
            (true, true) => Some(MatchResult::Tie),
            (true, false) => Some(MatchResult::Winner(Seat::One)),
            (false, true) => Some(MatchResult::Winner(Seat::Zero)),
            (false, false) => None,
        }
    }

    /// Health as shown to clients, floored at zero.
    pub fn display_health(&self) -> SeatPair<i32> {
        self.health.map(|h| (*h).max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_health(zero: i32, one: i32) -> DuelState {
        let mut state = DuelState::new(7);
        state.health = SeatPair::new(zero, one);
        state
    }

    #[test]
    fn test_lock_in_sequence() {
        let mut state = DuelState::new(7);
        assert_eq!(state.lock_in(Seat::Zero, Move::Rock), LockInOutcome::AwaitingOpponent);
        assert_eq!(state.lock_in(Seat::Zero, Move::Paper), LockInOutcome::Duplicate);
        assert_eq!(state.choices[Seat::Zero], Some(Move::Rock));
        assert_eq!(state.lock_in(Seat::One, Move::Paper), LockInOutcome::BothLocked);
    }

    #[test]
    fn test_winning_throws_deal_one_damage() {
        let cases = [
            (Move::Rock, Move::Scissors),
            (Move::Scissors, Move::Paper),
            (Move::Paper, Move::Rock),
        ];
        for (winner, loser) in cases {
            let mut state = DuelState::new(7);
            state.lock_in(Seat::Zero, winner);
            state.lock_in(Seat::One, loser);
            let resolution = state.resolve();
            assert_eq!(resolution.health, SeatPair::new(7, 6));

            let mut state = DuelState::new(7);
            state.lock_in(Seat::Zero, loser);
            state.lock_in(Seat::One, winner);
            assert_eq!(state.resolve().health, SeatPair::new(6, 7));
        }
    }

    #[test]
    fn test_equal_moves_change_nothing() {
        for m in Move::ALL {
            let mut state = DuelState::new(7);
            state.lock_in(Seat::Zero, m);
            state.lock_in(Seat::One, m);
            let resolution = state.resolve();
            assert_eq!(resolution.health, SeatPair::new(7, 7));
            assert_eq!(resolution.result, None);
        }
    }

    #[test]
    fn test_absent_seats_are_penalized() {
        let mut state = DuelState::new(7);
        let resolution = state.resolve();
        assert_eq!(resolution.health, SeatPair::new(6, 6));
        assert_eq!(resolution.choices, SeatPair::new(None, None));

        let mut state = state_with_health(2, 2);
        state.lock_in(Seat::Zero, Move::Rock);
        let resolution = state.resolve();
        assert_eq!(resolution.health, SeatPair::new(2, 1));
        assert_eq!(resolution.choices, SeatPair::new(Some(Move::Rock), None));
        assert_eq!(resolution.result, None);
    }

    #[test]
    fn test_choices_cleared_after_resolve() {
        let mut state = DuelState::new(7);
        state.lock_in(Seat::Zero, Move::Rock);
        state.lock_in(Seat::One, Move::Rock);
        state.resolve();
        assert!(!state.has_locked(Seat::Zero));
        assert!(!state.has_locked(Seat::One));
        assert_eq!(state.round, 1);
    }

    #[test]
    fn test_final_blow_wins() {
        let mut state = state_with_health(1, 1);
        state.lock_in(Seat::Zero, Move::Rock);
        state.lock_in(Seat::One, Move::Scissors);
        let resolution = state.resolve();
        assert_eq!(resolution.health, SeatPair::new(1, 0));
        assert_eq!(resolution.result, Some(MatchResult::Winner(Seat::Zero)));
    }

    #[test]
    fn test_simultaneous_knockout_is_tie() {
        let mut state = state_with_health(1, 1);
        let resolution = state.resolve();
        assert_eq!(resolution.health, SeatPair::new(0, 0));
        assert_eq!(resolution.result, Some(MatchResult::Tie));
    }

    #[test]
    fn test_display_health_floors_at_zero() {
        let state = state_with_health(-1, 3);
        assert_eq!(state.display_health(), SeatPair::new(0, 3));
    }

    #[test]
    fn test_result_text() {
        assert_eq!(MatchResult::Tie.to_string(), "tie");
        assert_eq!(MatchResult::Winner(Seat::Zero).to_string(), "seat 0 wins");
        assert_eq!(MatchResult::Winner(Seat::One).to_string(), "seat 1 wins");
        assert_eq!("seat 1 wins".parse::<MatchResult>(), Ok(MatchResult::Winner(Seat::One)));
        assert!("player 1 wins".parse::<MatchResult>().is_err());
    }
}
