//! Local implementation of the Scores & Themes contract.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use super::{
    NewScore, ScoreRecord, ScoresService, ServiceError, Statistics, ThemeItem, ThemeResponse,
    TopScore,
};
use crate::core::clock::{Clock, SystemClock};

/// Contract operation, used to target injected failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    SaveScore,
    TopScores,
    Statistics,
    Theme,
}

#[derive(Default)]
struct Inner {
    scores: Vec<ScoreRecord>,
    next_id: i64,
    themes: FxHashMap<String, Vec<ThemeItem>>,
    failures: Vec<(Endpoint, ServiceError)>,
}

/// In-process leaderboard and theme table.
///
/// Ranking is score descending, then time ascending, then moves ascending,
/// then insertion order.
pub struct InMemoryService {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
}

impl InMemoryService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                ..Inner::default()
            }),
            clock: Arc::new(SystemClock),
        }
    }

    /// Stamp `created_at` from `clock`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register the items served for theme `name`.
    pub fn with_theme(self, name: impl Into<String>, items: Vec<ThemeItem>) -> Self {
        self.lock().themes.insert(name.into(), items);
        self
    }

    /// Make the next call to `endpoint` fail with `error`.
    ///
    /// Failures queue up per endpoint and are consumed in order.
    pub fn fail_next(&self, endpoint: Endpoint, error: ServiceError) {
        self.lock().failures.push((endpoint, error));
    }

    /// Every stored score in insertion order.
    #[must_use]
    pub fn scores(&self) -> Vec<ScoreRecord> {
        self.lock().scores.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn take_failure(inner: &mut Inner, endpoint: Endpoint) -> Result<(), ServiceError> {
        match inner.failures.iter().position(|(e, _)| *e == endpoint) {
            Some(pos) => Err(inner.failures.remove(pos).1),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryService {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("InMemoryService")
            .field("scores", &inner.scores.len())
            .field("themes", &inner.themes.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ScoresService for InMemoryService {
    async fn save_score(&self, score: NewScore) -> Result<ScoreRecord, ServiceError> {
        let created_at = self.clock.now();
        let mut inner = self.lock();
        Self::take_failure(&mut inner, Endpoint::SaveScore)?;

        let record = ScoreRecord {
            id: inner.next_id,
            player_name: score.player_name,
            score: score.score,
            moves: score.moves,
            time: score.time,
            grid_size: score.grid_size,
            theme: score.theme,
            created_at,
        };
        inner.next_id += 1;
        inner.scores.push(record.clone());

        debug!(id = record.id, score = record.score, "score saved");
        Ok(record)
    }

    async fn top_scores(&self, limit: usize) -> Result<Vec<TopScore>, ServiceError> {
        let mut inner = self.lock();
        Self::take_failure(&mut inner, Endpoint::TopScores)?;

        let mut ranked: Vec<&ScoreRecord> = inner.scores.iter().collect();
        ranked.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(a.time.cmp(&b.time))
                .then(a.moves.cmp(&b.moves))
                .then(a.id.cmp(&b.id))
        });

        Ok(ranked
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, record)| TopScore {
                rank: i as u32 + 1,
                record: record.clone(),
            })
            .collect())
    }

    async fn statistics(&self) -> Result<Statistics, ServiceError> {
        let mut inner = self.lock();
        Self::take_failure(&mut inner, Endpoint::Statistics)?;

        let scores = &inner.scores;
        if scores.is_empty() {
            return Ok(Statistics::default());
        }

        let n = scores.len() as f64;
        let players: FxHashSet<&str> = scores.iter().map(|s| s.player_name.as_str()).collect();

        Ok(Statistics {
            total_participations: scores.len() as u64,
            average_score: scores.iter().map(|s| f64::from(s.score)).sum::<f64>() / n,
            average_time: scores.iter().map(|s| s.time as f64).sum::<f64>() / n,
            average_moves: scores.iter().map(|s| f64::from(s.moves)).sum::<f64>() / n,
            best_time: scores.iter().map(|s| s.time).min().unwrap_or(0),
            best_moves: scores.iter().map(|s| s.moves).min().unwrap_or(0),
            total_players: players.len() as u64,
        })
    }

    async fn theme(&self, name: &str, limit: usize) -> Result<ThemeResponse, ServiceError> {
        let mut inner = self.lock();
        Self::take_failure(&mut inner, Endpoint::Theme)?;

        let items = inner
            .themes
            .get(name)
            .ok_or_else(|| ServiceError::NotFound(format!("theme {name}")))?;

        Ok(ThemeResponse {
            theme: name.to_string(),
            data: items.iter().take(limit).cloned().collect(),
        })
    }
}
