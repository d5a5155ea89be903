//! The game-session engine.
//!
//! `Session` owns the runtime state and is the only thing that mutates it.
//! Every operation is a no-op when its preconditions fail: stale
//! card ids, the wrong lifecycle state, or a flip arriving while a pair is
//! being resolved never raise errors.
//!
//! ## Deferred work
//!
//! Delays are modeled as tasks in a [`Scheduler`], each tagged with the
//! session generation it was scheduled under:
//!
//! - second flip -> `CheckMatch` after `check_delay` (500ms)
//! - mismatch -> `ResolveMismatch` after `mismatch_delay` (1000ms)
//! - winning match -> `RevealResults` after `results_delay` (3s)
//!
//! Callers drive time with [`Session::advance`] (fire due tasks) and
//! [`Session::tick`] (sample elapsed seconds). Dealing, clearing, or
//! restoring bumps the generation and cancels everything pending, and any
//! task that still carries an old generation is dropped when popped.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::events::{MatchOutcome, SessionEvent};
use super::scheduler::{Scheduler, TaskKind};
use crate::cards::{generate_deck, CardId, IconCatalog, ThemeItem};
use crate::core::clock::{backdate, elapsed_seconds, Clock, SystemClock};
use crate::core::config::{EngineConfig, GameSettings, SettingsError};
use crate::core::player::{next_player_index, winner, Player};
use crate::core::rng::GameRng;
use crate::core::state::{GameState, GameStats, SessionState};
use crate::persistence::{SessionRepository, StoreError};

/// A memory-game session.
pub struct Session {
    state: SessionState,
    config: EngineConfig,
    generation: u64,
    scheduler: Scheduler,
    rng: GameRng,
    catalog: IconCatalog,
    clock: Arc<dyn Clock>,
    repository: Option<SessionRepository>,
    /// Set once the stored record has been read or superseded by a deal.
    loaded: bool,
    events: Vec<SessionEvent>,
}

impl Session {
    /// An idle session with default settings and the system clock.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: SessionState::default(),
            rng: GameRng::from_seed(config.seed),
            config,
            generation: 0,
            scheduler: Scheduler::new(),
            catalog: IconCatalog::builtin(),
            clock: Arc::new(SystemClock),
            repository: None,
            loaded: false,
            events: Vec::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Attach durable storage. Mutations are saved when `auto_persist` is on,
    /// but only after [`Session::restore`] has run or a new deal has started.
    /// Settings applied before that leave the stored game alone.
    pub fn with_repository(mut self, repository: SessionRepository) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn with_catalog(mut self, catalog: IconCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Replace the settings, rejecting invalid ones.
    pub fn with_settings(mut self, settings: GameSettings) -> Result<Self, SettingsError> {
        self.set_settings(settings)?;
        Ok(self)
    }

    // === Read access ===

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Cheap copy of the current state for rendering.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.clone()
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.state.settings
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn game_state(&self) -> GameState {
        self.state.game_state
    }

    /// Identifier of the current deal. Changes on every deal, clear, and
    /// restore.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Multiplayer leader, `None` in solo play.
    #[must_use]
    pub fn winner(&self) -> Option<&Player> {
        winner(&self.state.players)
    }

    /// Earliest pending deferred task.
    #[must_use]
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.scheduler.next_deadline()
    }

    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    /// Take every event emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // === Operations ===

    /// Replace the settings used by the next deal.
    pub fn set_settings(&mut self, settings: GameSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        self.state.settings = settings;
        self.events.push(SessionEvent::SettingsChanged);
        self.persist();
        Ok(())
    }

    /// Deal a fresh deck under the current settings and start playing.
    ///
    /// `items` feeds dynamic icon themes. Anything pending from an earlier
    /// deal is cancelled.
    pub fn initialize_game(&mut self, items: Option<&[ThemeItem]>) {
        let cards = generate_deck(&self.state.settings, items, &self.catalog, &mut self.rng);
        let players = Player::roster(&self.state.settings);

        self.generation += 1;
        let cancelled = self.scheduler.cancel_all();
        if cancelled > 0 {
            debug!(cancelled, "cancelled tasks from previous deal");
        }

        let settings = std::mem::take(&mut self.state.settings);
        self.state = SessionState::new(settings);
        self.loaded = true;

        if cards.is_empty() {
            warn!("deck generation produced no cards, staying idle");
            self.persist();
            return;
        }

        self.state.cards = cards.into_iter().collect();
        self.state.players = players;
        self.state.game_state = GameState::Playing;
        self.state.stats = GameStats {
            moves: 0,
            time: 0,
            start_time: Some(self.clock.now()),
        };

        info!(
            generation = self.generation,
            cards = self.state.cards.len(),
            players = self.state.players.len(),
            "game initialized"
        );
        self.events.push(SessionEvent::Initialized {
            cards: self.state.cards.len(),
            players: self.state.players.len(),
        });
        self.persist();
    }

    /// Turn a card face up.
    ///
    /// Ignored unless playing, not resolving a pair, fewer than two cards
    /// are face up, and the card exists face down. The second flip queues
    /// match resolution after `check_delay`.
    pub fn flip_card(&mut self, id: &CardId) -> bool {
        if self.state.game_state != GameState::Playing
            || self.state.is_checking
            || self.state.flipped_cards.len() >= 2
        {
            return false;
        }
        let Some(index) = self.state.card_index(id) else {
            return false;
        };
        match self.state.cards.get_mut(index) {
            Some(card) if card.is_available() => card.is_flipped = true,
            _ => return false,
        }

        self.state.flipped_cards.push(id.clone());
        self.events.push(SessionEvent::CardFlipped { card: id.clone() });

        if self.state.flipped_cards.len() == 2 {
            let due = self.clock.now() + to_chrono(self.config.check_delay());
            self.scheduler.schedule(due, self.generation, TaskKind::CheckMatch);
        }

        self.persist();
        true
    }

    /// Resolve the two face-up cards.
    ///
    /// A match is settled immediately: both cards stay up, the current
    /// player scores, and the turn stays put. The winning match finishes
    /// the game. A mismatch only records the pair for highlighting; the
    /// flip-back, move count, and turn change happen `mismatch_delay`
    /// later.
    pub fn check_match(&mut self) -> MatchOutcome {
        if self.state.game_state != GameState::Playing
            || self.state.is_checking
            || self.state.flipped_cards.len() != 2
        {
            return MatchOutcome::Ignored;
        }

        let first = self.state.flipped_cards[0].clone();
        let second = self.state.flipped_cards[1].clone();
        let is_match = match (self.state.card(&first), self.state.card(&second)) {
            (Some(a), Some(b)) => a.matches(b),
            _ => return MatchOutcome::Ignored,
        };

        self.scheduler
            .cancel_where(|t| t.kind == TaskKind::CheckMatch);
        self.state.is_checking = true;

        if is_match {
            for id in [&first, &second] {
                self.state.update_card(id, |c| {
                    c.is_matched = true;
                    c.is_flipped = true;
                });
            }
            let player_index = self.state.current_player_index;
            if let Some(player) = self.state.players.get_mut(player_index) {
                player.score += 1;
            }
            self.state.matched_pairs += 1;
            self.state.stats.moves += 1;
            self.state.flipped_cards.clear();
            self.state.is_checking = false;

            debug!(player_index, card_a = %first, card_b = %second, "pair matched");
            self.events.push(SessionEvent::Matched {
                player_index,
                cards: [first, second],
            });

            let finished = self.state.matched_pairs == self.state.total_pairs();
            if finished {
                self.finish();
            }
            self.persist();
            MatchOutcome::Matched { finished }
        } else {
            self.state.mismatched_cards.clear();
            self.state.mismatched_cards.push(first.clone());
            self.state.mismatched_cards.push(second.clone());

            let due = self.clock.now() + to_chrono(self.config.mismatch_delay());
            self.scheduler.schedule(
                due,
                self.generation,
                TaskKind::ResolveMismatch {
                    first: first.clone(),
                    second: second.clone(),
                },
            );

            debug!(card_a = %first, card_b = %second, "pair mismatched");
            self.events.push(SessionEvent::Mismatched {
                cards: [first, second],
            });
            self.persist();
            MatchOutcome::Mismatched
        }
    }

    /// Pass the turn by hand.
    ///
    /// Multiplayer only, and not while a pair is being resolved. Every
    /// unmatched card goes face down.
    pub fn next_turn(&mut self) -> bool {
        if self.state.game_state != GameState::Playing
            || self.state.is_checking
            || !self.state.is_multiplayer()
        {
            return false;
        }

        self.scheduler
            .cancel_where(|t| t.kind == TaskKind::CheckMatch);
        self.state.current_player_index =
            next_player_index(self.state.current_player_index, self.state.players.len());
        self.state.hide_unmatched();
        self.state.flipped_cards.clear();
        self.state.mismatched_cards.clear();

        self.events.push(SessionEvent::TurnChanged {
            player_index: self.state.current_player_index,
        });
        self.persist();
        true
    }

    /// Deal again under unchanged settings, without theme items.
    pub fn reset_game(&mut self) {
        self.initialize_game(None);
    }

    /// Tear the session down to idle, keeping the settings.
    pub fn start_new_game(&mut self) {
        self.generation += 1;
        self.scheduler.cancel_all();

        let settings = std::mem::take(&mut self.state.settings);
        self.state = SessionState::new(settings);
        self.loaded = true;

        info!(generation = self.generation, "session cleared");
        self.events.push(SessionEvent::Cleared);
        self.persist();
    }

    /// Record elapsed seconds.
    ///
    /// A playing session without a start time gets one at "now".
    pub fn update_time(&mut self, seconds: u64) {
        self.state.stats.time = seconds;
        if self.state.stats.start_time.is_none() && self.state.game_state == GameState::Playing {
            self.state.stats.start_time = Some(self.clock.now());
        }
        self.events.push(SessionEvent::TimeUpdated { seconds });
        self.persist();
    }

    /// Sample the clock and update `stats.time` if it moved.
    ///
    /// Missing start times are rebuilt as `now - time` so restored sessions
    /// keep counting from their saved time.
    pub fn tick(&mut self) -> bool {
        if self.state.game_state != GameState::Playing {
            return false;
        }
        let now = self.clock.now();
        let start = match self.state.stats.start_time {
            Some(start) => start,
            None => {
                let start = backdate(now, self.state.stats.time);
                self.state.stats.start_time = Some(start);
                start
            }
        };

        let seconds = elapsed_seconds(start, now);
        if seconds == self.state.stats.time {
            return false;
        }
        self.update_time(seconds);
        true
    }

    /// Fire every deferred task that is due. Returns how many ran.
    pub fn advance(&mut self) -> usize {
        let now = self.clock.now();
        let mut fired = 0;

        while let Some(task) = self.scheduler.pop_due(now) {
            if task.generation != self.generation {
                debug!(task = %task.id, generation = task.generation, "dropping stale task");
                continue;
            }
            fired += 1;
            match task.kind {
                TaskKind::CheckMatch => {
                    self.check_match();
                }
                TaskKind::ResolveMismatch { first, second } => {
                    self.resolve_mismatch(first, second);
                }
                TaskKind::RevealResults => {
                    if self.state.game_state == GameState::Finished {
                        self.events.push(SessionEvent::ResultsReady);
                    }
                }
            }
        }

        fired
    }

    /// Reload the durable record from the attached repository.
    ///
    /// Returns `Ok(false)` when there is no repository or no record. Either
    /// way, auto-save is enabled from here on.
    pub fn restore(&mut self) -> Result<bool, StoreError> {
        let Some(repository) = &self.repository else {
            return Ok(false);
        };
        let loaded = repository.load();
        self.loaded = true;
        let Some(persisted) = loaded? else {
            return Ok(false);
        };

        self.generation += 1;
        self.scheduler.cancel_all();
        self.state = persisted.into_state(self.clock.now());

        if let Err(e) = self.state.settings.validate() {
            warn!(error = %e, "restored settings are invalid, using defaults");
            self.state.settings = GameSettings::default();
        }
        if self.state.game_state == GameState::Finished {
            self.schedule_results();
        }

        info!(
            generation = self.generation,
            state = ?self.state.game_state,
            time = self.state.stats.time,
            "session restored"
        );
        self.events.push(SessionEvent::Restored {
            game_state: self.state.game_state,
        });
        Ok(true)
    }

    /// Save the durable record now, regardless of `auto_persist`.
    pub fn save(&self) -> Result<(), StoreError> {
        match &self.repository {
            Some(repository) => repository.save(&self.state),
            None => Ok(()),
        }
    }

    // === Internals ===

    fn resolve_mismatch(&mut self, first: CardId, second: CardId) {
        if self.state.game_state != GameState::Playing {
            return;
        }

        for id in [&first, &second] {
            self.state.update_card(id, |c| {
                if !c.is_matched {
                    c.is_flipped = false;
                }
            });
        }
        self.state.hide_unmatched();
        self.state.reset_transient();
        self.state.stats.moves += 1;

        self.events.push(SessionEvent::MismatchResolved {
            cards: [first, second],
        });

        if self.state.is_multiplayer() {
            self.state.current_player_index =
                next_player_index(self.state.current_player_index, self.state.players.len());
            self.events.push(SessionEvent::TurnChanged {
                player_index: self.state.current_player_index,
            });
        }
        self.persist();
    }

    fn finish(&mut self) {
        self.state.game_state = GameState::Finished;
        info!(
            moves = self.state.stats.moves,
            time = self.state.stats.time,
            pairs = self.state.matched_pairs,
            "game finished"
        );
        self.events.push(SessionEvent::Finished);
        self.schedule_results();
    }

    fn schedule_results(&mut self) {
        let due = self.clock.now() + to_chrono(self.config.results_delay());
        self.scheduler
            .schedule(due, self.generation, TaskKind::RevealResults);
    }

    fn persist(&self) {
        if !self.config.auto_persist || !self.loaded {
            return;
        }
        if let Some(repository) = &self.repository {
            if let Err(e) = repository.save(&self.state) {
                warn!(error = %e, "failed to persist session");
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("generation", &self.generation)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

fn to_chrono(d: std::time::Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::zero())
}
