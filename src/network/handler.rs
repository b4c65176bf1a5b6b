//! Connection Handler
//!
//! Per-connection event dispatch: connection opened, message received,
//! connection closed. Transport-agnostic; `server.rs` feeds it from
//! WebSocket frames, tests feed it directly.

use std::sync::Arc;

use tracing::debug;

use crate::network::matchmaker::Matchmaker;
use crate::network::protocol::{ClientMessage, LockIn, MatchId};
use crate::network::registry::SessionRegistry;
use crate::network::session::{ChoiceEffect, Participant, ParticipantId, SessionConfig};

/// Matchmaking plus the live matches.
pub struct DuelService {
    registry: Arc<SessionRegistry>,
    matchmaker: Matchmaker,
}

impl DuelService {
    /// Create a service whose matches follow `config`.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new(config)),
            matchmaker: Matchmaker::new(),
        }
    }

    /// Live matches.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// A connection opened.
    pub async fn on_connect(&self, participant: Participant) -> Option<MatchId> {
        self.matchmaker.on_connect(participant, &self.registry).await
    }

    /// A text frame arrived. Anything that does not parse is dropped.
    pub async fn on_message(&self, from: ParticipantId, text: &str) {
        match ClientMessage::from_json(text) {
            Ok(msg) => self.on_client_message(from, msg).await,
            Err(e) => debug!("Invalid message from {}: {}", from, e),
        }
    }

    /// A binary frame arrived; it must hold the same JSON as a text frame.
    pub async fn on_binary(&self, from: ParticipantId, data: &[u8]) {
        match ClientMessage::from_slice(data) {
            Ok(msg) => self.on_client_message(from, msg).await,
            Err(e) => debug!("Invalid binary message from {}: {}", from, e),
        }
    }

    /// Dispatch a parsed message.
    pub async fn on_client_message(&self, from: ParticipantId, msg: ClientMessage) {
        match msg {
            ClientMessage::LockIn(lock_in) => {
                self.on_choice(from, lock_in).await;
            }
        }
    }

    /// Forward a lock-in to its match.
    pub async fn on_choice(&self, from: ParticipantId, lock_in: LockIn) -> ChoiceEffect {
        debug!(
            "Lock-in from {}: match {} {} {:?} at {}",
            from, lock_in.match_id, lock_in.seat, lock_in.choice, lock_in.timestamp
        );
        self.registry.submit_choice(from, &lock_in).await
    }

    /// A connection closed. Leaves the queue, or ends the match it was in.
    pub async fn on_disconnect(&self, participant: ParticipantId) {
        if self.matchmaker.cancel(participant).await {
            return;
        }
        self.registry.abandon(participant).await;
    }

    /// Number of live matches.
    pub async fn match_count(&self) -> usize {
        self.registry.session_count().await
    }

    /// Participant currently waiting for an opponent.
    pub async fn waiting(&self) -> Option<ParticipantId> {
        self.matchmaker.waiting().await
    }
}

impl Default for DuelService {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
