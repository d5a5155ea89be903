//! Game and engine configuration.
//!
//! ## GameSettings
//!
//! Chosen on the settings screen before a session starts: theme, grid size,
//! and the player roster. `GameSettings::validate` rejects configurations
//! that could never produce whole pairs, so the engine only ever sees valid
//! settings.
//!
//! ## EngineConfig
//!
//! Timing and randomness knobs for the session engine. Defaults reproduce
//! the observable timing contract (500ms pre-check, 1000ms mismatch
//! resolution, 3s results delay, 1s stats sampling).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest allowed custom grid dimension.
pub const MIN_GRID_DIMENSION: u32 = 2;
/// Largest allowed custom grid dimension.
pub const MAX_GRID_DIMENSION: u32 = 10;
/// Maximum number of local players.
pub const MAX_PLAYERS: usize = 4;

/// Card face family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Numbers,
    Icons,
}

impl Theme {
    /// Label used in score records.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Theme::Numbers => "numbers",
            Theme::Icons => "icons",
        }
    }
}

/// Sub-theme for [`Theme::Icons`].
///
/// `Icons` uses the bundled catalog; every other variant is a dynamic theme
/// whose items come from the Themes service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconTheme {
    #[default]
    Icons,
    Pokemon,
    Dogs,
    Movies,
    Flags,
    Fruits,
}

impl IconTheme {
    /// Service name for the theme endpoint.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            IconTheme::Icons => "icons",
            IconTheme::Pokemon => "pokemon",
            IconTheme::Dogs => "dogs",
            IconTheme::Movies => "movies",
            IconTheme::Flags => "flags",
            IconTheme::Fruits => "fruits",
        }
    }

    /// Whether card assets are fetched from the Themes service.
    #[must_use]
    pub const fn is_dynamic(self) -> bool {
        !matches!(self, IconTheme::Icons)
    }
}

/// Board layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridSize {
    #[default]
    #[serde(rename = "4x4")]
    Small,
    #[serde(rename = "6x6")]
    Large,
    #[serde(rename = "custom")]
    Custom,
}

impl GridSize {
    /// Total card count for this layout.
    ///
    /// A custom grid with missing dimensions falls back to 16 cards; callers
    /// validate settings before reaching this point.
    #[must_use]
    pub fn card_count(self, custom_width: Option<u32>, custom_height: Option<u32>) -> usize {
        match (self, custom_width, custom_height) {
            (GridSize::Small, _, _) => 16,
            (GridSize::Large, _, _) => 36,
            (GridSize::Custom, Some(w), Some(h)) if w > 0 && h > 0 => w as usize * h as usize,
            (GridSize::Custom, _, _) => 16,
        }
    }

    /// Label used in score records.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            GridSize::Small => "4x4",
            GridSize::Large => "6x6",
            GridSize::Custom => "custom",
        }
    }
}

/// Rejected game configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("custom grid requires both width and height")]
    MissingCustomDimensions,
    #[error("grid dimension {value} outside 2..=10")]
    DimensionOutOfRange { value: u32 },
    #[error("custom grid {width}x{height} has an odd card count")]
    OddCardCount { width: u32, height: u32 },
    #[error("player count {0} outside 1..=4")]
    PlayerCount(usize),
    #[error("expected {expected} player names, got {actual}")]
    PlayerNames { expected: usize, actual: usize },
}

/// Configuration chosen before a session starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    pub theme: Theme,
    /// Only meaningful when `theme` is [`Theme::Icons`].
    #[serde(default)]
    pub icon_theme: IconTheme,
    pub grid_size: GridSize,
    #[serde(default)]
    pub custom_width: Option<u32>,
    #[serde(default)]
    pub custom_height: Option<u32>,
    pub number_of_players: usize,
    /// Player order follows this list.
    pub player_names: Vec<String>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            theme: Theme::Numbers,
            icon_theme: IconTheme::Icons,
            grid_size: GridSize::Small,
            custom_width: None,
            custom_height: None,
            number_of_players: 1,
            player_names: vec!["Player 1".to_string()],
        }
    }
}

impl GameSettings {
    /// Use a preset grid.
    pub fn with_grid(mut self, grid_size: GridSize) -> Self {
        self.grid_size = grid_size;
        self.custom_width = None;
        self.custom_height = None;
        self
    }

    /// Use a custom `width` x `height` grid.
    pub fn with_custom_grid(mut self, width: u32, height: u32) -> Self {
        self.grid_size = GridSize::Custom;
        self.custom_width = Some(width);
        self.custom_height = Some(height);
        self
    }

    /// Set the card theme.
    pub fn with_theme(mut self, theme: Theme, icon_theme: IconTheme) -> Self {
        self.theme = theme;
        self.icon_theme = icon_theme;
        self
    }

    /// Set the roster; the player count follows the name list.
    pub fn with_players<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.player_names = names.into_iter().map(Into::into).collect();
        self.number_of_players = self.player_names.len();
        self
    }

    /// Total cards the deck generator will aim for.
    #[must_use]
    pub fn card_count(&self) -> usize {
        self.grid_size.card_count(self.custom_width, self.custom_height)
    }

    /// Pairs the deck generator will aim for.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.card_count() / 2
    }

    /// Whether the deck needs items from the Themes service.
    #[must_use]
    pub fn uses_dynamic_theme(&self) -> bool {
        self.theme == Theme::Icons && self.icon_theme.is_dynamic()
    }

    /// Check that these settings describe a playable session.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.grid_size == GridSize::Custom {
            let (Some(width), Some(height)) = (self.custom_width, self.custom_height) else {
                return Err(SettingsError::MissingCustomDimensions);
            };
            for value in [width, height] {
                if !(MIN_GRID_DIMENSION..=MAX_GRID_DIMENSION).contains(&value) {
                    return Err(SettingsError::DimensionOutOfRange { value });
                }
            }
            if (width * height) % 2 != 0 {
                return Err(SettingsError::OddCardCount { width, height });
            }
        }

        if !(1..=MAX_PLAYERS).contains(&self.number_of_players) {
            return Err(SettingsError::PlayerCount(self.number_of_players));
        }
        if self.player_names.len() != self.number_of_players {
            return Err(SettingsError::PlayerNames {
                expected: self.number_of_players,
                actual: self.player_names.len(),
            });
        }

        Ok(())
    }
}

/// Session engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delay between the second flip and match resolution.
    pub check_delay_ms: u64,

    /// Delay before a mismatched pair flips back and the turn passes.
    pub mismatch_delay_ms: u64,

    /// Delay between finishing and the results signal.
    pub results_delay_ms: u64,

    /// Stats sampling period while playing.
    pub tick_interval_ms: u64,

    /// Shuffle seed. `None` draws from OS entropy.
    pub seed: Option<u64>,

    /// Save the durable session after every mutation.
    pub auto_persist: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            check_delay_ms: 500,
            mismatch_delay_ms: 1000,
            results_delay_ms: 3000,
            tick_interval_ms: 1000,
            seed: None,
            auto_persist: true,
        }
    }
}

impl EngineConfig {
    /// Use a fixed shuffle seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Toggle saving after every mutation.
    pub fn with_auto_persist(mut self, enabled: bool) -> Self {
        self.auto_persist = enabled;
        self
    }

    pub fn check_delay(&self) -> Duration {
        Duration::from_millis(self.check_delay_ms)
    }

    pub fn mismatch_delay(&self) -> Duration {
        Duration::from_millis(self.mismatch_delay_ms)
    }

    pub fn results_delay(&self) -> Duration {
        Duration::from_millis(self.results_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
