//! The durable session record.
//!
//! `PersistedSession` carries only what survives a reload. Transient
//! resolution state (`flipped_cards`, `is_checking`, `mismatched_cards`) is
//! never written, and no card is written face up: a half-finished flip or a
//! pending mismatch always restarts clean.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::store::{Codec, KeyValueStore, StoreError, SESSION_KEY};
use crate::cards::Card;
use crate::core::clock::backdate;
use crate::core::config::GameSettings;
use crate::core::player::Player;
use crate::core::state::{GameState, GameStats, SessionState};

/// Version stamped on every stored record.
pub const RECORD_VERSION: u32 = 1;

/// Versioned envelope around a stored value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord<T> {
    pub version: u32,
    pub state: T,
}

impl<T> StoredRecord<T> {
    pub fn new(state: T) -> Self {
        Self {
            version: RECORD_VERSION,
            state,
        }
    }
}

/// Durable subset of a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub settings: GameSettings,
    pub cards: Vec<Card>,
    pub players: Vec<Player>,
    pub current_player_index: usize,
    pub game_state: GameState,
    pub stats: GameStats,
    pub matched_pairs: usize,
}

impl PersistedSession {
    /// Capture the durable fields of `state`, every card face down.
    #[must_use]
    pub fn capture(state: &SessionState) -> Self {
        Self {
            settings: state.settings.clone(),
            cards: state
                .cards
                .iter()
                .map(|c| Card {
                    is_flipped: false,
                    ..c.clone()
                })
                .collect(),
            players: state.players.clone(),
            current_player_index: state.current_player_index,
            game_state: state.game_state,
            stats: state.stats.clone(),
            matched_pairs: state.matched_pairs,
        }
    }

    /// Rebuild a runtime session at `now`.
    ///
    /// - Transient fields start empty.
    /// - Matched cards are turned face up again; everything else stays down.
    /// - `matched_pairs` is recounted from the cards, and a record whose
    ///   pairs are all matched is treated as finished.
    /// - A playing session gets `start_time = now - time`, so the clock
    ///   resumes from the saved time instead of counting the downtime.
    #[must_use]
    pub fn into_state(self, now: DateTime<Utc>) -> SessionState {
        let mut state = SessionState::new(self.settings);

        state.cards = self
            .cards
            .into_iter()
            .map(|c| Card {
                is_flipped: c.is_matched,
                ..c
            })
            .collect();
        state.players = self.players;
        state.stats = self.stats;
        state.game_state = self.game_state;

        state.current_player_index = if self.current_player_index < state.players.len() {
            self.current_player_index
        } else {
            0
        };

        let recounted = state.matched_card_count() / 2;
        if recounted != self.matched_pairs {
            warn!(
                stored = self.matched_pairs,
                recounted, "matched pair count disagrees with cards, using cards"
            );
        }
        state.matched_pairs = recounted;

        if state.cards.is_empty() || state.players.is_empty() {
            state.game_state = GameState::Idle;
        } else if state.matched_pairs == state.total_pairs() {
            state.game_state = GameState::Finished;
        } else if state.game_state == GameState::Finished {
            // Unfinished deck cannot be terminal.
            state.game_state = GameState::Playing;
        }

        if state.game_state == GameState::Playing {
            state.stats.start_time = Some(backdate(now, state.stats.time));
        }

        state
    }
}

/// Reads and writes the session record in a [`KeyValueStore`].
#[derive(Clone)]
pub struct SessionRepository {
    store: Arc<dyn KeyValueStore>,
    codec: Codec,
}

impl SessionRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            codec: Codec::Json,
        }
    }

    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    pub fn save(&self, state: &SessionState) -> Result<(), StoreError> {
        let record = StoredRecord::new(PersistedSession::capture(state));
        let bytes = self.codec.encode(&record)?;
        self.store.put(SESSION_KEY, &bytes)
    }

    /// Load the stored record.
    ///
    /// A record written by another version is treated as absent.
    pub fn load(&self) -> Result<Option<PersistedSession>, StoreError> {
        let Some(bytes) = self.store.get(SESSION_KEY)? else {
            return Ok(None);
        };
        let record: StoredRecord<PersistedSession> = self.codec.decode(&bytes)?;
        if record.version != RECORD_VERSION {
            warn!(version = record.version, "ignoring session record from another version");
            return Ok(None);
        }
        debug!(state = ?record.state.game_state, "session record loaded");
        Ok(Some(record.state))
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(SESSION_KEY)
    }
}

impl std::fmt::Debug for SessionRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRepository")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}
