//! Hands finished single-player games to the leaderboard.

use std::sync::Arc;

use tracing::{info, warn};

use super::{NewScore, ScoreRecord, ScoresService, ServiceError};
use crate::core::state::{GameState, SessionState};

/// Outcome of a successful submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub record: ScoreRecord,
    /// The saved score tops the leaderboard.
    pub is_new_record: bool,
}

/// Submits each finished single-player game exactly once.
///
/// Submissions are keyed by session generation, so replaying the results
/// view of the same deal does not save twice. A failed save re-arms the
/// reporter for a manual retry.
pub struct ResultsReporter {
    service: Arc<dyn ScoresService>,
    submitted: Option<u64>,
}

impl ResultsReporter {
    pub fn new(service: Arc<dyn ScoresService>) -> Self {
        Self {
            service,
            submitted: None,
        }
    }

    /// Score payload for `state`, if it is a finished single-player game.
    #[must_use]
    pub fn score_for(state: &SessionState) -> Option<NewScore> {
        if state.game_state != GameState::Finished || state.players.len() != 1 {
            return None;
        }
        let player = state.players.first()?;
        Some(NewScore {
            player_name: player.name.clone(),
            score: state.matched_pairs as u32,
            moves: state.stats.moves,
            time: state.stats.time,
            grid_size: state.settings.grid_size.label().to_string(),
            theme: state.settings.theme.label().to_string(),
        })
    }

    /// Whether the deal with `generation` has been saved.
    #[must_use]
    pub fn is_submitted(&self, generation: u64) -> bool {
        self.submitted == Some(generation)
    }

    /// Save the score of the deal with `generation`.
    ///
    /// `Ok(None)` when there is nothing to save: multiplayer, unfinished,
    /// or already submitted.
    pub async fn submit(
        &mut self,
        generation: u64,
        state: &SessionState,
    ) -> Result<Option<Submission>, ServiceError> {
        if self.is_submitted(generation) {
            return Ok(None);
        }
        let Some(score) = Self::score_for(state) else {
            return Ok(None);
        };

        self.submitted = Some(generation);
        let record = match self.service.save_score(score).await {
            Ok(record) => record,
            Err(e) => {
                self.submitted = None;
                warn!(error = %e, retryable = e.is_retryable(), "failed to save score");
                return Err(e);
            }
        };

        let is_new_record = match self.service.top_scores(1).await {
            Ok(top) => top.first().map_or(true, |best| best.record.id == record.id),
            Err(e) => {
                warn!(error = %e, "failed to load leaderboard after saving score");
                false
            }
        };

        info!(id = record.id, score = record.score, is_new_record, "score submitted");
        Ok(Some(Submission {
            record,
            is_new_record,
        }))
    }
}

impl std::fmt::Debug for ResultsReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultsReporter")
            .field("submitted", &self.submitted)
            .finish_non_exhaustive()
    }
}
