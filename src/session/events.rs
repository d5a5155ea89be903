//! Change notifications emitted by the session engine.

use crate::cards::CardId;
use crate::core::state::GameState;

/// Something observable happened to the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// Settings replaced on the settings screen.
    SettingsChanged,
    /// Fresh deck dealt; the session is playing.
    Initialized { cards: usize, players: usize },
    CardFlipped { card: CardId },
    /// A pair was matched and credited to `player_index`.
    Matched { player_index: usize, cards: [CardId; 2] },
    /// A pair failed to match; drives the shake highlight.
    Mismatched { cards: [CardId; 2] },
    /// The mismatched pair flipped back.
    MismatchResolved { cards: [CardId; 2] },
    TurnChanged { player_index: usize },
    Finished,
    /// Results view may be shown.
    ResultsReady,
    TimeUpdated { seconds: u64 },
    /// Session torn down to idle.
    Cleared,
    /// Session reloaded from storage.
    Restored { game_state: GameState },
}

/// Result of a `check_match` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Preconditions not met; nothing changed.
    Ignored,
    /// Pair matched. `finished` is set on the winning match.
    Matched { finished: bool },
    /// Pair mismatched; flip-back is pending.
    Mismatched,
}
