//! Runs a [`Session`] on a tokio task.
//!
//! The task owns the session. Commands arrive over an `mpsc` channel and
//! are answered on a `oneshot`. A ticker samples elapsed time while playing,
//! and the loop sleeps until the session's next deadline to fire deferred
//! work. After every step that emitted events the task publishes a snapshot
//! on a `watch` channel and the events on a `broadcast` channel.
//!
//! The session's clock is replaced by one derived from tokio's clock, so
//! paused-time tests drive card timers and the game timer alike.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::cards::{CardId, ThemeItem};
use crate::core::clock::Clock;
use crate::core::config::{GameSettings, SettingsError};
use crate::core::state::{GameState, SessionState};
use crate::session::{MatchOutcome, Session, SessionEvent};

const COMMAND_BUFFER: usize = 64;
const EVENT_BUFFER: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("game driver has stopped")]
    Stopped,
}

/// Wall clock anchored to tokio's monotonic clock.
#[derive(Clone, Copy, Debug)]
pub struct TokioClock {
    origin: Instant,
    origin_wall: DateTime<Utc>,
}

impl TokioClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            origin_wall: Utc::now(),
        }
    }

    /// The tokio instant corresponding to `at`. Past times map to the origin.
    #[must_use]
    pub fn instant_at(&self, at: DateTime<Utc>) -> Instant {
        match (at - self.origin_wall).to_std() {
            Ok(offset) => self.origin + offset,
            Err(_) => self.origin,
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = Instant::now().saturating_duration_since(self.origin);
        self.origin_wall + chrono::Duration::from_std(elapsed).unwrap_or(chrono::Duration::zero())
    }
}

enum Command {
    UpdateSettings(GameSettings, oneshot::Sender<Result<(), SettingsError>>),
    Initialize(Option<Vec<ThemeItem>>, oneshot::Sender<()>),
    Flip(CardId, oneshot::Sender<bool>),
    CheckMatch(oneshot::Sender<MatchOutcome>),
    NextTurn(oneshot::Sender<bool>),
    Reset(oneshot::Sender<()>),
    StartNew(oneshot::Sender<()>),
}

/// Handle to a running session.
///
/// Dropping the handle stops the task and every pending timer with it.
pub struct GameDriver {
    commands: Option<mpsc::Sender<Command>>,
    snapshots: watch::Receiver<SessionState>,
    events: broadcast::Sender<SessionEvent>,
    task: Option<JoinHandle<()>>,
}

impl GameDriver {
    /// Spawn the session on the current tokio runtime.
    pub fn spawn(session: Session) -> Self {
        let clock = TokioClock::new();
        let mut session = session.with_clock(Arc::new(clock));
        session.drain_events();

        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());
        let (event_tx, _) = broadcast::channel(EVENT_BUFFER);

        let publisher = Publisher {
            snapshots: snapshot_tx,
            events: event_tx.clone(),
        };
        let task = tokio::spawn(run(session, command_rx, publisher, clock));

        Self {
            commands: Some(command_tx),
            snapshots: snapshot_rx,
            events: event_tx,
            task: Some(task),
        }
    }

    /// Latest published state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.snapshots.borrow().clone()
    }

    /// Receiver that wakes on every published state.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.snapshots.clone()
    }

    /// Receive events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Replace the settings. The inner result carries validation failures.
    pub async fn update_settings(
        &self,
        settings: GameSettings,
    ) -> Result<Result<(), SettingsError>, DriverError> {
        self.request(|reply| Command::UpdateSettings(settings, reply)).await
    }

    pub async fn initialize(&self, items: Option<Vec<ThemeItem>>) -> Result<(), DriverError> {
        self.request(|reply| Command::Initialize(items, reply)).await
    }

    pub async fn flip(&self, id: CardId) -> Result<bool, DriverError> {
        self.request(|reply| Command::Flip(id, reply)).await
    }

    /// Resolve the face-up pair now instead of waiting for the check delay.
    pub async fn check_match(&self) -> Result<MatchOutcome, DriverError> {
        self.request(Command::CheckMatch).await
    }

    pub async fn next_turn(&self) -> Result<bool, DriverError> {
        self.request(Command::NextTurn).await
    }

    pub async fn reset(&self) -> Result<(), DriverError> {
        self.request(Command::Reset).await
    }

    pub async fn start_new(&self) -> Result<(), DriverError> {
        self.request(Command::StartNew).await
    }

    /// Stop the task and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.commands.take();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, DriverError> {
        let sender = self.commands.as_ref().ok_or(DriverError::Stopped)?;
        let (reply_tx, reply_rx) = oneshot::channel();
        sender
            .send(command(reply_tx))
            .await
            .map_err(|_| DriverError::Stopped)?;
        reply_rx.await.map_err(|_| DriverError::Stopped)
    }
}

impl Drop for GameDriver {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for GameDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameDriver")
            .field("running", &self.task.as_ref().is_some_and(|t| !t.is_finished()))
            .finish_non_exhaustive()
    }
}

struct Publisher {
    snapshots: watch::Sender<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl Publisher {
    fn publish(&self, session: &mut Session) {
        let events = session.drain_events();
        if events.is_empty() {
            return;
        }
        self.snapshots.send_replace(session.snapshot());
        for event in events {
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
    }
}

async fn run(
    mut session: Session,
    mut commands: mpsc::Receiver<Command>,
    publisher: Publisher,
    clock: TokioClock,
) {
    let mut ticker = tokio::time::interval(session.config().tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut was_playing = false;

    loop {
        let deadline = session.next_deadline().map(|at| clock.instant_at(at));
        let playing = session.game_state() == GameState::Playing;
        if playing && !was_playing {
            ticker.reset();
        }
        was_playing = playing;

        tokio::select! {
            command = commands.recv() => match command {
                Some(command) => handle(&mut session, command, &publisher),
                None => break,
            },
            _ = ticker.tick(), if playing => {
                session.tick();
                publisher.publish(&mut session);
            }
            _ = wait_until(deadline) => {
                session.advance();
                publisher.publish(&mut session);
            }
        }
    }

    debug!(generation = session.generation(), "game driver stopped");
}

/// Apply `command`, publish, then reply, so a caller that awaited the reply
/// already sees the new snapshot.
fn handle(session: &mut Session, command: Command, publisher: &Publisher) {
    match command {
        Command::UpdateSettings(settings, reply) => {
            let result = session.set_settings(settings);
            publisher.publish(session);
            let _ = reply.send(result);
        }
        Command::Initialize(items, reply) => {
            session.initialize_game(items.as_deref());
            publisher.publish(session);
            let _ = reply.send(());
        }
        Command::Flip(id, reply) => {
            let flipped = session.flip_card(&id);
            publisher.publish(session);
            let _ = reply.send(flipped);
        }
        Command::CheckMatch(reply) => {
            let outcome = session.check_match();
            publisher.publish(session);
            let _ = reply.send(outcome);
        }
        Command::NextTurn(reply) => {
            let changed = session.next_turn();
            publisher.publish(session);
            let _ = reply.send(changed);
        }
        Command::Reset(reply) => {
            session.reset_game();
            publisher.publish(session);
            let _ = reply.send(());
        }
        Command::StartNew(reply) => {
            session.start_new_game();
            publisher.publish(session);
            let _ = reply.send(());
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
