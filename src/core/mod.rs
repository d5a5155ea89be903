//! Core engine types: configuration, players, state, RNG, clock.
//!
//! This module holds the building blocks the session engine is made of.
//! Nothing here schedules work or performs I/O.

pub mod clock;
pub mod config;
pub mod player;
pub mod rng;
pub mod state;

pub use clock::{elapsed_seconds, Clock, ManualClock, SystemClock};
pub use config::{EngineConfig, GameSettings, GridSize, IconTheme, SettingsError, Theme};
pub use player::{next_player_index, winner, Player};
pub use rng::GameRng;
pub use state::{CardPair, GameState, GameStats, SessionState};
