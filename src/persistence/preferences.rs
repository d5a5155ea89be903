//! UI preferences stored beside the session record.
//!
//! Theme mode and language each have their own key and are never
//! invalidated by session changes (or by each other).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::record::StoredRecord;
use super::store::{Codec, KeyValueStore, StoreError, LANGUAGE_KEY, THEME_MODE_KEY};

/// Color scheme preference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    /// Follow the platform setting.
    #[default]
    System,
}

impl ThemeMode {
    /// Resolve `System` against the platform's dark-mode flag.
    #[must_use]
    pub fn effective(self, platform_prefers_dark: bool) -> ThemeMode {
        match self {
            ThemeMode::System if platform_prefers_dark => ThemeMode::Dark,
            ThemeMode::System => ThemeMode::Light,
            other => other,
        }
    }
}

/// Interface language.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Fr,
    En,
}

#[derive(Serialize, Deserialize)]
struct ThemeRecord {
    mode: ThemeMode,
}

#[derive(Serialize, Deserialize)]
struct LanguageRecord {
    language: Language,
}

/// Preference records in a [`KeyValueStore`].
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored theme mode, `System` when unset.
    pub fn theme_mode(&self) -> Result<ThemeMode, StoreError> {
        Ok(self
            .load::<ThemeRecord>(THEME_MODE_KEY)?
            .map(|r| r.mode)
            .unwrap_or_default())
    }

    pub fn set_theme_mode(&self, mode: ThemeMode) -> Result<(), StoreError> {
        self.save(THEME_MODE_KEY, &ThemeRecord { mode })
    }

    /// Stored language, French when unset.
    pub fn language(&self) -> Result<Language, StoreError> {
        Ok(self
            .load::<LanguageRecord>(LANGUAGE_KEY)?
            .map(|r| r.language)
            .unwrap_or_default())
    }

    pub fn set_language(&self, language: Language) -> Result<(), StoreError> {
        self.save(LANGUAGE_KEY, &LanguageRecord { language })
    }

    fn load<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.store.get(key)? {
            Some(bytes) => {
                let record: StoredRecord<T> = Codec::Json.decode(&bytes)?;
                Ok(Some(record.state))
            }
            None => Ok(None),
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let bytes = Codec::Json.encode(&StoredRecord::new(value))?;
        self.store.put(key, &bytes)
    }
}
