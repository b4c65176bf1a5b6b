//! Session Registry
//!
//! Maps match ids to live sessions. A match is present exactly while it is
//! being played; ending it (result or disconnect) removes it, after which
//! nothing addressed to its id has any effect.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::game::seat::SeatPair;
use crate::network::protocol::{LockIn, MatchId};
use crate::network::session::{ChoiceEffect, MatchSession, Participant, ParticipantId, SessionConfig};

/// Shared handle to one session.
pub type SessionHandle = Arc<Mutex<MatchSession>>;

/// All live matches.
///
/// Lock order: a session's mutex is never held while waiting on either
/// registry map.
pub struct SessionRegistry {
    /// Rules applied to new sessions.
    config: SessionConfig,
    /// Live sessions.
    sessions: RwLock<BTreeMap<MatchId, SessionHandle>>,
    /// Participant to session mapping.
    participant_sessions: RwLock<BTreeMap<ParticipantId, MatchId>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(BTreeMap::new()),
            participant_sessions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Rules applied to new sessions.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Create and register a session for two paired participants.
    pub async fn create_session(&self, seats: SeatPair<Participant>) -> SessionHandle {
        let id = MatchId::generate();
        let ids = seats.map(|p| p.id);
        let session = Arc::new(Mutex::new(MatchSession::new(id.clone(), seats, self.config.clone())));

        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(id.clone(), session.clone());
        }
        {
            let mut participant_sessions = self.participant_sessions.write().await;
            for (_, participant_id) in ids.iter() {
                participant_sessions.insert(*participant_id, id.clone());
            }
        }

        info!("Created match {}", id);
        session
    }

    /// Get a session by id.
    pub async fn get_session(&self, id: &MatchId) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned()
    }

    /// Match a participant is seated in.
    pub async fn participant_match(&self, participant: ParticipantId) -> Option<MatchId> {
        let participant_sessions = self.participant_sessions.read().await;
        participant_sessions.get(&participant).cloned()
    }

    /// Whether the id refers to a live match.
    pub async fn contains(&self, id: &MatchId) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    /// Remove a session and forget its participants.
    pub async fn remove_session(&self, id: &MatchId) -> bool {
        let removed = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(id)
        };
        {
            let mut participant_sessions = self.participant_sessions.write().await;
            participant_sessions.retain(|_, match_id| match_id != id);
        }

        if removed.is_some() {
            info!("Removed match {}", id);
        }
        removed.is_some()
    }

    /// Route a lock-in to its match. Unknown ids are ignored.
    pub async fn submit_choice(self: &Arc<Self>, from: ParticipantId, lock_in: &LockIn) -> ChoiceEffect {
        let Some(session) = self.get_session(&lock_in.match_id).await else {
            debug!("Lock-in from {} for unknown match {}", from, lock_in.match_id);
            return ChoiceEffect::Ignored;
        };

        let (effect, ended) = {
            let mut session = session.lock().await;
            let effect = session.submit_choice(from, lock_in.seat, lock_in.choice, self);
            (effect, session.is_ended())
        };

        if ended {
            self.remove_session(&lock_in.match_id).await;
        }
        effect
    }

    /// Resolve a round whose forcing interval elapsed.
    ///
    /// Does nothing if the match is gone or the timer was replaced.
    pub async fn fire_timer(self: &Arc<Self>, id: &MatchId, generation: u64) {
        let Some(session) = self.get_session(id).await else {
            return;
        };

        let ended = {
            let mut session = session.lock().await;
            match session.on_timer_fired(generation, self) {
                Some(resolution) => {
                    debug!("Match {}: forced resolution, health {:?}", id, resolution.health);
                    session.is_ended()
                }
                None => false,
            }
        };

        if ended {
            self.remove_session(id).await;
        }
    }

    /// Tear down the match of a departing participant, telling the other seat.
    pub async fn abandon(&self, participant: ParticipantId) -> Option<MatchId> {
        let id = self.participant_match(participant).await?;

        if let Some(session) = self.get_session(&id).await {
            let mut session = session.lock().await;
            if let Some(seat) = session.seat_of(participant) {
                session.abandon(seat);
            }
        }

        self.remove_session(&id).await;
        info!("Participant {} left match {}", participant, id);
        Some(id)
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
