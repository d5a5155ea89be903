//! The Scores & Themes collaborator.
//!
//! The engine never talks to the network itself. This module fixes the
//! contract it consumes:
//!
//! - `save_score` / `top_scores` / `statistics`: the leaderboard
//! - `theme`: item lists for dynamic icon themes
//!
//! `InMemoryService` implements the contract locally. Any transport (HTTP
//! or otherwise) plugs in by implementing [`ScoresService`].

pub mod in_memory;
pub mod results;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::config::{GameSettings, GridSize};

pub use crate::cards::ThemeItem;
pub use in_memory::{Endpoint, InMemoryService};
pub use results::{ResultsReporter, Submission};

/// Failure reported by the collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    /// Whether the same call may succeed later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Unavailable(_))
    }
}

/// Score submitted at the end of a single-player game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewScore {
    pub player_name: String,
    /// Matched pairs.
    pub score: u32,
    pub moves: u32,
    /// Seconds.
    pub time: u64,
    /// `4x4`, `6x6` or `custom`.
    pub grid_size: String,
    /// `numbers` or `icons`.
    pub theme: String,
}

/// A stored score.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub id: i64,
    pub player_name: String,
    pub score: u32,
    pub moves: u32,
    pub time: u64,
    pub grid_size: String,
    pub theme: String,
    pub created_at: DateTime<Utc>,
}

/// A leaderboard row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopScore {
    /// 1-based.
    pub rank: u32,
    #[serde(flatten)]
    pub record: ScoreRecord,
}

/// Aggregate leaderboard counters. All zero when no score exists.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_participations: u64,
    pub average_score: f64,
    pub average_time: f64,
    pub average_moves: f64,
    pub best_time: u64,
    pub best_moves: u32,
    pub total_players: u64,
}

/// Items for one dynamic theme. `data` may be shorter than requested.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeResponse {
    pub theme: String,
    pub data: Vec<ThemeItem>,
}

#[async_trait]
pub trait ScoresService: Send + Sync {
    async fn save_score(&self, score: NewScore) -> Result<ScoreRecord, ServiceError>;

    /// Best `limit` scores, ranked.
    async fn top_scores(&self, limit: usize) -> Result<Vec<TopScore>, ServiceError>;

    async fn statistics(&self) -> Result<Statistics, ServiceError>;

    /// Up to `limit` items of the theme called `name`.
    async fn theme(&self, name: &str, limit: usize) -> Result<ThemeResponse, ServiceError>;
}

/// How many theme items a deal under `settings` can use.
#[must_use]
pub fn theme_fetch_limit(settings: &GameSettings) -> usize {
    match settings.grid_size {
        GridSize::Small => 8,
        GridSize::Large => 18,
        GridSize::Custom => settings.card_count().div_ceil(2),
    }
}

/// Fetch the items a deal under `settings` needs.
///
/// `Ok(None)` when the theme is bundled. A service failure is returned as
/// is; callers should not start the game on it.
pub async fn load_theme_items(
    service: &dyn ScoresService,
    settings: &GameSettings,
) -> Result<Option<Vec<ThemeItem>>, ServiceError> {
    if !settings.uses_dynamic_theme() {
        return Ok(None);
    }

    let name = settings.icon_theme.name();
    let limit = theme_fetch_limit(settings);
    let mut response = service.theme(name, limit).await.map_err(|e| {
        warn!(theme = name, error = %e, "theme fetch failed");
        e
    })?;
    response.data.truncate(limit);

    debug!(theme = name, limit, received = response.data.len(), "theme items loaded");
    Ok(Some(response.data))
}
