//! Match Session
//!
//! One duel between two seated participants: health, pending choices,
//! phase, and the forcing timer that resolves a round when a seat stalls.
//!
//! A session never locks itself. Callers reach it through
//! [`SessionRegistry`], which holds each session behind its own mutex, so
//! lock-ins, timer firings and disconnects for one match are serialized.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::game::moves::Move;
use crate::game::round::{DuelState, LockInOutcome, RoundResolution};
use crate::game::seat::{Seat, SeatPair};
use crate::network::protocol::{MatchId, ServerMessage};
use crate::network::registry::SessionRegistry;
use crate::{CLASH_INTERVAL_MS, STARTING_HEALTH};

/// Identifier of one connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to one connected player.
///
/// Dropping it does not close the connection; the transport owns that.
#[derive(Debug, Clone)]
pub struct Participant {
    /// Connection identifier.
    pub id: ParticipantId,
    /// Outbound queue drained by the connection's writer task.
    sender: mpsc::Sender<ServerMessage>,
}

impl Participant {
    /// Wrap a connection's outbound queue.
    pub fn new(id: ParticipantId, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self { id, sender }
    }

    /// Queue a message without waiting. Full or closed queues drop it.
    pub fn send(&self, message: ServerMessage) {
        if let Err(e) = self.sender.try_send(message) {
            debug!("Dropped message for participant {}: {}", self.id, e);
        }
    }
}

/// Match rules that can be tuned per deployment.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Health each seat starts with.
    pub starting_health: i32,
    /// Forcing interval: a round resolves this long after the first lock-in.
    pub clash_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            starting_health: STARTING_HEALTH,
            clash_interval: Duration::from_millis(CLASH_INTERVAL_MS),
        }
    }
}

/// Match lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Created; nobody has locked in yet.
    WaitingForFirstLock,
    /// A forcing timer is running for the current round.
    CountdownActive,
    /// Finished by a result or a disconnect. Terminal.
    Ended,
}

/// The single outstanding forcing timer of a session.
#[derive(Debug)]
struct ResolutionTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

/// What a lock-in did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceEffect {
    /// Dropped: match over, wrong sender, or seat already locked.
    Ignored,
    /// Recorded; waiting on the opponent or the timer.
    Locked,
    /// Both seats were in; the round resolved immediately.
    Resolved(RoundResolution),
}

/// A duel in progress.
#[derive(Debug)]
pub struct MatchSession {
    /// Routing key.
    pub id: MatchId,
    /// Rules in force.
    pub config: SessionConfig,
    seats: SeatPair<Participant>,
    state: DuelState,
    phase: MatchPhase,
    timer: Option<ResolutionTimer>,
    timer_generation: u64,
}

impl MatchSession {
    /// Create a session for two freshly paired participants.
    pub fn new(id: MatchId, seats: SeatPair<Participant>, config: SessionConfig) -> Self {
        let state = DuelState::new(config.starting_health);
        Self {
            id,
            config,
            seats,
            state,
            phase: MatchPhase::WaitingForFirstLock,
            timer: None,
            timer_generation: 0,
        }
    }

    /// Participant in `seat`.
    pub fn participant(&self, seat: Seat) -> &Participant {
        &self.seats[seat]
    }

    /// Seat occupied by a connection, if it plays in this match.
    pub fn seat_of(&self, id: ParticipantId) -> Option<Seat> {
        self.seats.position(|p| p.id == id)
    }

    /// Ids of both seated participants.
    pub fn participant_ids(&self) -> SeatPair<ParticipantId> {
        self.seats.map(|p| p.id)
    }

    /// Current phase.
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Whether the match is over.
    pub fn is_ended(&self) -> bool {
        self.phase == MatchPhase::Ended
    }

    /// Health and pending choices.
    pub fn state(&self) -> &DuelState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn state_mut_for_test(&mut self) -> &mut DuelState {
        &mut self.state
    }

    /// Whether a forcing timer is outstanding.
    pub fn timer_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Send to one seat.
    pub fn notify(&self, seat: Seat, message: ServerMessage) {
        self.seats[seat].send(message);
    }

    /// Send to both seats of this match, and nobody else.
    pub fn broadcast(&self, message: ServerMessage) {
        for (_, participant) in self.seats.iter() {
            participant.send(message.clone());
        }
    }

    /// Announce the pairing, telling each participant its seat.
    pub fn announce_start(&self) {
        for (seat, participant) in self.seats.iter() {
            participant.send(ServerMessage::game_start(seat, self.id.clone()));
        }
    }

    /// Handle a lock-in from `from`, who claims `seat`.
    ///
    /// The first lock of a round notifies the opponent and starts the
    /// forcing timer if none is running. The second lock resolves the
    /// round at once and re-arms the timer for the next round.
    pub fn submit_choice(
        &mut self,
        from: ParticipantId,
        seat: Seat,
        choice: Move,
        registry: &Arc<SessionRegistry>,
    ) -> ChoiceEffect {
        if self.is_ended() {
            return ChoiceEffect::Ignored;
        }
        if self.seats[seat].id != from {
            debug!("Match {}: participant {} does not hold {}", self.id, from, seat);
            return ChoiceEffect::Ignored;
        }

        match self.state.lock_in(seat, choice) {
            LockInOutcome::Duplicate => {
                debug!("Match {}: duplicate lock-in from {}", self.id, seat);
                ChoiceEffect::Ignored
            }
            LockInOutcome::AwaitingOpponent => {
                self.notify(seat.other(), ServerMessage::opponent_locked());
                if !self.timer_armed() {
                    self.arm_timer(registry);
                }
                ChoiceEffect::Locked
            }
            LockInOutcome::BothLocked => {
                self.cancel_timer();
                let resolution = self.resolve_round();
                if !self.is_ended() {
                    self.arm_timer(registry);
                }
                ChoiceEffect::Resolved(resolution)
            }
        }
    }

    /// Resolve the current round and tell both seats.
    ///
    /// A decisive round cancels the timer and moves the session to
    /// [`MatchPhase::Ended`]; the caller must then drop it from the registry.
    pub fn resolve_round(&mut self) -> RoundResolution {
        let resolution = self.state.resolve();
        self.broadcast(ServerMessage::round_resolved(&resolution));

        if let Some(result) = resolution.result {
            debug!("Match {} decided after {} rounds: {}", self.id, self.state.round, result);
            self.end();
        }
        resolution
    }

    /// Called by a firing timer. Returns the resolution, or `None` when the
    /// timer was replaced or canceled after it was scheduled.
    pub fn on_timer_fired(
        &mut self,
        generation: u64,
        registry: &Arc<SessionRegistry>,
    ) -> Option<RoundResolution> {
        if self.is_ended() {
            return None;
        }
        match &self.timer {
            Some(timer) if timer.generation == generation => {}
            _ => {
                debug!("Match {}: stale timer {} ignored", self.id, generation);
                return None;
            }
        }
        // The firing task is the one running this; detach instead of aborting it.
        self.timer = None;

        let resolution = self.resolve_round();
        if !self.is_ended() {
            self.arm_timer(registry);
        }
        Some(resolution)
    }

    /// The remaining seat is told the opponent left, and the match ends.
    pub fn abandon(&mut self, leaving: Seat) {
        if self.is_ended() {
            return;
        }
        self.notify(leaving.other(), ServerMessage::opponent_disconnected());
        self.end();
    }

    /// Arm the forcing timer, canceling any outstanding one first.
    fn arm_timer(&mut self, registry: &Arc<SessionRegistry>) {
        self.cancel_timer();

        self.timer_generation += 1;
        let generation = self.timer_generation;
        let delay = self.config.clash_interval;
        let match_id = self.id.clone();
        let registry = Arc::downgrade(registry);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(registry) = registry.upgrade() {
                registry.fire_timer(&match_id, generation).await;
            }
        });

        self.timer = Some(ResolutionTimer { generation, handle });
        self.phase = MatchPhase::CountdownActive;
    }

    /// Abort the outstanding timer, if any.
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.handle.abort();
        }
    }

    fn end(&mut self) {
        self.cancel_timer();
        self.phase = MatchPhase::Ended;
    }
}

impl Drop for MatchSession {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::round::MatchResult;

    fn seated() -> (SeatPair<Participant>, mpsc::Receiver<ServerMessage>, mpsc::Receiver<ServerMessage>) {
        let (tx0, rx0) = mpsc::channel(16);
        let (tx1, rx1) = mpsc::channel(16);
        let seats = SeatPair::new(
            Participant::new(ParticipantId(1), tx0),
            Participant::new(ParticipantId(2), tx1),
        );
        (seats, rx0, rx1)
    }

    fn create_test_session(starting_health: i32) -> (MatchSession, mpsc::Receiver<ServerMessage>, mpsc::Receiver<ServerMessage>) {
        let (seats, rx0, rx1) = seated();
        let config = SessionConfig {
            starting_health,
            ..Default::default()
        };
        (MatchSession::new(MatchId::from("test"), seats, config), rx0, rx1)
    }

    #[tokio::test]
    async fn test_announce_start_assigns_seats() {
        let (session, mut rx0, mut rx1) = create_test_session(7);
        session.announce_start();

        match rx0.try_recv().unwrap() {
            ServerMessage::GameStart { seat, match_id, .. } => {
                assert_eq!(seat, Seat::Zero);
                assert_eq!(match_id, session.id);
            }
            other => panic!("unexpected message: {:?}", other),
        }
        assert!(matches!(rx1.try_recv().unwrap(), ServerMessage::GameStart { seat: Seat::One, .. }));
    }

    #[tokio::test]
    async fn test_first_lock_notifies_opponent_and_arms_timer() {
        let registry = Arc::new(SessionRegistry::new(SessionConfig::default()));
        let (mut session, mut rx0, mut rx1) = create_test_session(7);

        let effect = session.submit_choice(ParticipantId(1), Seat::Zero, Move::Rock, &registry);
        assert_eq!(effect, ChoiceEffect::Locked);
        assert!(session.timer_armed());
        assert_eq!(session.phase(), MatchPhase::CountdownActive);
        assert!(matches!(rx1.try_recv().unwrap(), ServerMessage::OpponentLocked { .. }));
        assert!(rx0.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_duplicate_and_impostor_ignored() {
        let registry = Arc::new(SessionRegistry::new(SessionConfig::default()));
        let (mut session, _rx0, mut rx1) = create_test_session(7);

        session.submit_choice(ParticipantId(1), Seat::Zero, Move::Rock, &registry);
        let _ = rx1.try_recv();

        let dup = session.submit_choice(ParticipantId(1), Seat::Zero, Move::Paper, &registry);
        assert_eq!(dup, ChoiceEffect::Ignored);
        assert_eq!(session.state().choices[Seat::Zero], Some(Move::Rock));
        assert!(rx1.try_recv().is_err());

        let impostor = session.submit_choice(ParticipantId(1), Seat::One, Move::Paper, &registry);
        assert_eq!(impostor, ChoiceEffect::Ignored);
        assert!(!session.state().has_locked(Seat::One));
    }

    #[tokio::test]
    async fn test_both_locked_resolves_and_rearms() {
        let registry = Arc::new(SessionRegistry::new(SessionConfig::default()));
        let (mut session, mut rx0, mut rx1) = create_test_session(7);

        session.submit_choice(ParticipantId(1), Seat::Zero, Move::Paper, &registry);
        let first_generation = session.timer_generation;
        let effect = session.submit_choice(ParticipantId(2), Seat::One, Move::Rock, &registry);

        match effect {
            ChoiceEffect::Resolved(resolution) => {
                assert_eq!(resolution.health, SeatPair::new(7, 6));
                assert_eq!(resolution.result, None);
            }
            other => panic!("unexpected effect: {:?}", other),
        }
        assert!(session.timer_armed());
        assert!(session.timer_generation > first_generation);

        assert!(matches!(rx0.try_recv().unwrap(), ServerMessage::Clash { .. }));
        assert!(matches!(rx1.try_recv().unwrap(), ServerMessage::OpponentLocked { .. }));
        assert!(matches!(rx1.try_recv().unwrap(), ServerMessage::Clash { .. }));
    }

    #[tokio::test]
    async fn test_stale_generation_does_not_resolve() {
        let registry = Arc::new(SessionRegistry::new(SessionConfig::default()));
        let (mut session, mut rx0, _rx1) = create_test_session(7);

        session.submit_choice(ParticipantId(1), Seat::Zero, Move::Paper, &registry);
        let stale = session.timer_generation;
        session.submit_choice(ParticipantId(2), Seat::One, Move::Paper, &registry);
        let _ = rx0.try_recv();

        assert!(session.on_timer_fired(stale, &registry).is_none());
        assert_eq!(session.state().round, 1);
        assert!(rx0.try_recv().is_err());

        let current = session.timer_generation;
        let resolution = session.on_timer_fired(current, &registry).unwrap();
        assert_eq!(resolution.health, SeatPair::new(6, 6));
        assert!(session.timer_armed());
    }

    #[tokio::test]
    async fn test_decisive_round_ends_match() {
        let registry = Arc::new(SessionRegistry::new(SessionConfig::default()));
        let (mut session, mut rx0, mut rx1) = create_test_session(1);

        session.submit_choice(ParticipantId(1), Seat::Zero, Move::Rock, &registry);
        session.submit_choice(ParticipantId(2), Seat::One, Move::Scissors, &registry);

        assert!(session.is_ended());
        assert!(!session.timer_armed());
        match rx0.try_recv().unwrap() {
            ServerMessage::GameEnd { state, winner, .. } => {
                assert_eq!(state.health, SeatPair::new(1, 0));
                assert_eq!(winner, MatchResult::Winner(Seat::Zero));
            }
            other => panic!("unexpected message: {:?}", other),
        }
        let _ = rx1.try_recv();
        assert!(matches!(rx1.try_recv().unwrap(), ServerMessage::GameEnd { .. }));

        let after = session.submit_choice(ParticipantId(1), Seat::Zero, Move::Rock, &registry);
        assert_eq!(after, ChoiceEffect::Ignored);
    }

    #[tokio::test]
    async fn test_abandon_notifies_remaining_seat() {
        let registry = Arc::new(SessionRegistry::new(SessionConfig::default()));
        let (mut session, mut rx0, mut rx1) = create_test_session(7);
        session.submit_choice(ParticipantId(2), Seat::One, Move::Rock, &registry);
        let _ = rx0.try_recv();

        session.abandon(Seat::One);
        assert!(session.is_ended());
        assert!(!session.timer_armed());
        assert!(matches!(rx0.try_recv().unwrap(), ServerMessage::OpponentDisconnected { .. }));
        assert!(rx1.try_recv().is_err());
    }
}
