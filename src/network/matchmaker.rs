//! Matchmaker
//!
//! First come, first paired. At most one participant waits at a time.

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::game::seat::SeatPair;
use crate::network::protocol::{MatchId, ServerMessage};
use crate::network::registry::SessionRegistry;
use crate::network::session::{Participant, ParticipantId};

/// The waiting slot.
#[derive(Default)]
pub struct Matchmaker {
    waiting: Mutex<Option<Participant>>,
}

impl Matchmaker {
    /// Create with an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a new participant, or pair it with the one already waiting.
    ///
    /// The slot stays locked until the match is registered and announced,
    /// so two concurrent arrivals can never both claim the same opponent.
    pub async fn on_connect(&self, participant: Participant, registry: &SessionRegistry) -> Option<MatchId> {
        let mut waiting = self.waiting.lock().await;

        let Some(opponent) = waiting.take() else {
            debug!("Participant {} waiting for an opponent", participant.id);
            participant.send(ServerMessage::waiting());
            *waiting = Some(participant);
            return None;
        };

        let (zero, one) = (opponent.id, participant.id);
        let session = registry.create_session(SeatPair::new(opponent, participant)).await;
        let session = session.lock().await;
        session.announce_start();

        info!("Paired {} (seat 0) with {} (seat 1) in match {}", zero, one, session.id);
        Some(session.id.clone())
    }

    /// Clear the slot if `participant` holds it.
    pub async fn cancel(&self, participant: ParticipantId) -> bool {
        let mut waiting = self.waiting.lock().await;
        if waiting.as_ref().map(|p| p.id) == Some(participant) {
            *waiting = None;
            debug!("Participant {} left the queue", participant);
            true
        } else {
            false
        }
    }

    /// Id of the waiting participant, if any.
    pub async fn waiting(&self) -> Option<ParticipantId> {
        self.waiting.lock().await.as_ref().map(|p| p.id)
    }
}
