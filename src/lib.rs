//! # memory-pairs
//!
//! Game-session engine for a memory-matching ("pairs") card game.
//!
//! ## Design Principles
//!
//! 1. **Ignore, don't fail**: Operations called in the wrong state or with
//!    stale card ids are no-ops. Only configuration and I/O return errors.
//!
//! 2. **Engine-owned timers**: Delays are tasks in a scheduler tagged with
//!    a session generation. A new deal cancels them, and a stale one can
//!    never touch the next deal.
//!
//! 3. **Durable subset**: Only what survives a reload is persisted. Any
//!    in-flight flip or mismatch restarts clean.
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: Cards live in an `im::Vector`, so
//!   snapshots for rendering clone in O(1).
//!
//! - **Deterministic shuffles**: Decks are shuffled with a seedable ChaCha8
//!   stream, so a fixed seed reproduces every deal.
//!
//! ## Modules
//!
//! - `core`: Settings, players, session state, RNG, clock
//! - `cards`: Cards, the bundled icon catalog, deck generation
//! - `session`: The engine, its scheduler and events
//! - `persistence`: Storage backends, session record, preferences
//! - `service`: Scores & Themes contract and the results hand-off
//! - `driver`: Async runner on tokio

pub mod cards;
pub mod core;
pub mod driver;
pub mod persistence;
pub mod service;
pub mod session;

// Re-export commonly used types
pub use crate::core::{
    Clock, EngineConfig, GameRng, GameSettings, GameState, GameStats, GridSize, IconTheme,
    ManualClock, Player, SessionState, SettingsError, SystemClock, Theme,
};

pub use crate::cards::{generate_deck, Card, CardId, CardValue, IconCatalog, ItemId, ThemeItem};

pub use crate::session::{MatchOutcome, Session, SessionEvent};

pub use crate::persistence::{
    Codec, FileStore, KeyValueStore, Language, MemoryStore, PersistedSession, Preferences,
    SessionRepository, StoreError, ThemeMode,
};

pub use crate::service::{
    load_theme_items, theme_fetch_limit, InMemoryService, NewScore, ResultsReporter,
    ScoreRecord, ScoresService, ServiceError, Statistics, Submission, ThemeResponse, TopScore,
};

pub use crate::driver::{DriverError, GameDriver, TokioClock};
