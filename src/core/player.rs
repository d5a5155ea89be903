//! Players and turn rotation.
//!
//! ## Player
//!
//! A local participant. Ids are 1-based and stable for the session; the
//! roster order follows `GameSettings::player_names`.
//!
//! ## Turn rotation
//!
//! Turns rotate cyclically and only in multiplayer. With a single player
//! the current index is pinned at 0.

use serde::{Deserialize, Serialize};

use super::config::GameSettings;

/// A local player and their pair count.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    /// 1-based position in the roster.
    pub id: u32,

    /// Trimmed display name, "Player N" when left blank.
    pub name: String,

    /// Pairs matched by this player.
    pub score: u32,
}

impl Player {
    /// Create a player at 0-based roster `index`.
    ///
    /// ```
    /// use memory_pairs::core::Player;
    ///
    /// let p = Player::new(1, "   ");
    /// assert_eq!(p.id, 2);
    /// assert_eq!(p.name, "Player 2");
    /// ```
    #[must_use]
    pub fn new(index: usize, name: &str) -> Self {
        let id = index as u32 + 1;
        let trimmed = name.trim();
        let name = if trimmed.is_empty() {
            format!("Player {id}")
        } else {
            trimmed.to_string()
        };
        Self { id, name, score: 0 }
    }

    /// Build the roster for a new session, every score at 0.
    ///
    /// Missing names are defaulted like blank ones.
    #[must_use]
    pub fn roster(settings: &GameSettings) -> Vec<Player> {
        (0..settings.number_of_players)
            .map(|i| {
                let name = settings.player_names.get(i).map_or("", String::as_str);
                Player::new(i, name)
            })
            .collect()
    }
}

/// Index of the player after `current` in a roster of `player_count`.
///
/// Returns `current` unchanged for solo play.
#[must_use]
pub fn next_player_index(current: usize, player_count: usize) -> usize {
    if player_count > 1 {
        (current + 1) % player_count
    } else {
        current
    }
}

/// Highest-scoring player, first in roster order on ties.
///
/// `None` in solo play, where there is nobody to beat.
#[must_use]
pub fn winner(players: &[Player]) -> Option<&Player> {
    if players.len() < 2 {
        return None;
    }
    players
        .iter()
        .fold(None, |best: Option<&Player>, p| match best {
            Some(b) if b.score >= p.score => Some(b),
            _ => Some(p),
        })
}
