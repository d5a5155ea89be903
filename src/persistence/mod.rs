//! Persistence: storage backends, the durable session record, preferences.
//!
//! Three independent records share one store:
//!
//! - `memory-game-storage`: the durable session (`PersistedSession`)
//! - `theme-storage`: the UI theme mode
//! - `i18n-storage`: the interface language

pub mod preferences;
pub mod record;
pub mod store;

pub use preferences::{Language, Preferences, ThemeMode};
pub use record::{PersistedSession, SessionRepository, StoredRecord, RECORD_VERSION};
pub use store::{
    Codec, FileStore, KeyValueStore, MemoryStore, StoreError, LANGUAGE_KEY, SESSION_KEY,
    THEME_MODE_KEY,
};
