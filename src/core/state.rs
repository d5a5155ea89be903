//! Session state: lifecycle, stats, and the runtime aggregate.
//!
//! ## GameState
//!
//! `Idle -> Playing -> Finished`. Only a fresh deal leaves `Finished`.
//!
//! ## SessionState
//!
//! Everything a renderer needs, including the transient resolution fields
//! (`flipped_cards`, `is_checking`, `mismatched_cards`) that are never
//! persisted. Cards live in an `im::Vector`, so snapshots clone in O(1).

use chrono::{DateTime, Utc};
use im::Vector;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::config::GameSettings;
use super::player::Player;
use crate::cards::{Card, CardId};

/// Up to two card ids; the face-up, unresolved selection.
pub type CardPair = SmallVec<[CardId; 2]>;

/// Session lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    /// No deck dealt.
    #[default]
    Idle,
    /// Deck dealt, timer running.
    Playing,
    /// Every pair matched. Terminal.
    Finished,
}

/// Move count and elapsed time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    /// Resolved flip pairs, matches and mismatches alike.
    pub moves: u32,

    /// Whole seconds elapsed.
    pub time: u64,

    /// Instant the timer counts from. Absent when idle, and possibly after
    /// a restore until it is rebuilt.
    pub start_time: Option<DateTime<Utc>>,
}

/// The runtime session aggregate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    pub settings: GameSettings,
    pub cards: Vector<Card>,
    pub players: Vec<Player>,
    pub current_player_index: usize,
    pub game_state: GameState,
    pub stats: GameStats,
    pub flipped_cards: CardPair,
    pub matched_pairs: usize,
    pub is_checking: bool,
    pub mismatched_cards: CardPair,
}

impl SessionState {
    /// An idle session holding `settings`.
    #[must_use]
    pub fn new(settings: GameSettings) -> Self {
        Self {
            settings,
            cards: Vector::new(),
            players: Vec::new(),
            current_player_index: 0,
            game_state: GameState::Idle,
            stats: GameStats::default(),
            flipped_cards: CardPair::new(),
            matched_pairs: 0,
            is_checking: false,
            mismatched_cards: CardPair::new(),
        }
    }

    /// Pairs in the dealt deck.
    #[must_use]
    pub fn total_pairs(&self) -> usize {
        self.cards.len() / 2
    }

    #[must_use]
    pub fn card_index(&self, id: &CardId) -> Option<usize> {
        self.cards.iter().position(|c| &c.id == id)
    }

    #[must_use]
    pub fn card(&self, id: &CardId) -> Option<&Card> {
        self.cards.iter().find(|c| &c.id == id)
    }

    /// Player whose matches are credited right now.
    #[must_use]
    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    #[must_use]
    pub fn is_multiplayer(&self) -> bool {
        self.players.len() > 1
    }

    /// Cards with `is_matched` set.
    #[must_use]
    pub fn matched_card_count(&self) -> usize {
        self.cards.iter().filter(|c| c.is_matched).count()
    }

    /// Clear the transient resolution fields.
    pub fn reset_transient(&mut self) {
        self.flipped_cards.clear();
        self.is_checking = false;
        self.mismatched_cards.clear();
    }

    /// Turn every unmatched card face down.
    pub fn hide_unmatched(&mut self) {
        for card in self.cards.iter_mut() {
            if card.is_face_up_unmatched() {
                card.is_flipped = false;
            }
        }
    }

    /// Apply `f` to the card with `id`. Returns false if there is none.
    pub fn update_card(&mut self, id: &CardId, f: impl FnOnce(&mut Card)) -> bool {
        match self.card_index(id) {
            Some(i) => {
                if let Some(card) = self.cards.get_mut(i) {
                    f(card);
                }
                true
            }
            None => false,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(GameSettings::default())
    }
}
