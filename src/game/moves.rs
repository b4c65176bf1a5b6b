//! Moves
//!
//! The three throws and the relation between them.

use serde::{Deserialize, Serialize};

/// A throw a seat can lock in for a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    /// Beats scissors.
    Rock,
    /// Beats rock.
    Paper,
    /// Beats paper.
    Scissors,
}

/// Result of one move against another, from the first move's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// First move wins.
    Win,
    /// First move loses.
    Lose,
    /// Same move on both sides.
    Draw,
}

impl Outcome {
    /// The same outcome seen from the other side.
    pub fn reversed(self) -> Outcome {
        match self {
            Outcome::Win => Outcome::Lose,
            Outcome::Lose => Outcome::Win,
            Outcome::Draw => Outcome::Draw,
        }
    }
}

impl Move {
    /// All moves.
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    /// The move this one defeats.
    #[inline]
    pub fn beats(self) -> Move {
        match self {
            Move::Rock => Move::Scissors,
            Move::Paper => Move::Rock,
            Move::Scissors => Move::Paper,
        }
    }

    /// Compare against an opposing move.
    pub fn versus(self, other: Move) -> Outcome {
        if self == other {
            Outcome::Draw
        } else if self.beats() == other {
            Outcome::Win
        } else {
            Outcome::Lose
        }
    }
}
