//! Seats
//!
//! The two fixed positions of a duel, and a pair type indexed by them.

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// One of the two positions in a match. Serialized as `0` or `1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Seat {
    /// Seat 0, the participant that waited in the queue.
    Zero,
    /// Seat 1, the participant that completed the pairing.
    One,
}

/// A seat index outside `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid seat index {0}")]
pub struct InvalidSeat(pub u8);

impl Seat {
    /// Both seats in order.
    pub const BOTH: [Seat; 2] = [Seat::Zero, Seat::One];

    /// The opposing seat.
    #[inline]
    pub fn other(self) -> Seat {
        match self {
            Seat::Zero => Seat::One,
            Seat::One => Seat::Zero,
        }
    }

    /// Numeric index used on the wire.
    #[inline]
    pub fn index(self) -> u8 {
        match self {
            Seat::Zero => 0,
            Seat::One => 1,
        }
    }
}

impl TryFrom<u8> for Seat {
    type Error = InvalidSeat;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Seat::Zero),
            1 => Ok(Seat::One),
            other => Err(InvalidSeat(other)),
        }
    }
}

impl From<Seat> for u8 {
    fn from(seat: Seat) -> u8 {
        seat.index()
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat {}", self.index())
    }
}

/// One value per seat.
///
/// Serialized as a two-element array `[seat0, seat1]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SeatPair<T> {
    zero: T,
    one: T,
}

impl<T> SeatPair<T> {
    /// Build from the seat 0 and seat 1 values.
    pub const fn new(zero: T, one: T) -> Self {
        Self { zero, one }
    }

    /// Iterate `(seat, value)` in seat order.
    pub fn iter(&self) -> impl Iterator<Item = (Seat, &T)> {
        [(Seat::Zero, &self.zero), (Seat::One, &self.one)].into_iter()
    }

    /// Apply `f` to both values.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> SeatPair<U> {
        SeatPair {
            zero: f(&self.zero),
            one: f(&self.one),
        }
    }

    /// Find the seat whose value satisfies `pred`, checking seat 0 first.
    pub fn position(&self, mut pred: impl FnMut(&T) -> bool) -> Option<Seat> {
        Seat::BOTH.into_iter().find(|seat| pred(&self[*seat]))
    }
}

impl<T: Clone> SeatPair<T> {
    /// Same value in both seats.
    pub fn splat(value: T) -> Self {
        Self {
            zero: value.clone(),
            one: value,
        }
    }
}

impl<T> Index<Seat> for SeatPair<T> {
    type Output = T;

    fn index(&self, seat: Seat) -> &T {
        match seat {
            Seat::Zero => &self.zero,
            Seat::One => &self.one,
        }
    }
}

impl<T> IndexMut<Seat> for SeatPair<T> {
    fn index_mut(&mut self, seat: Seat) -> &mut T {
        match seat {
            Seat::Zero => &mut self.zero,
            Seat::One => &mut self.one,
        }
    }
}

impl<T: Serialize> Serialize for SeatPair<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [&self.zero, &self.one].serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for SeatPair<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [zero, one] = <[T; 2]>::deserialize(deserializer)?;
        Ok(Self { zero, one })
    }
}
