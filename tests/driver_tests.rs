//! The tokio driver on paused time.

mod common;

use std::time::Duration;

use memory_pairs::{
    CardId, DriverError, EngineConfig, GameDriver, GameSettings, GameState, MatchOutcome,
    Session, SessionEvent, SessionState, SettingsError,
};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::sleep;

fn spawn(settings: GameSettings) -> GameDriver {
    common::init_logging();
    let session = Session::new(EngineConfig::default().with_seed(5))
        .with_settings(settings)
        .unwrap();
    GameDriver::spawn(session)
}

fn pair_in(state: &SessionState, matching: bool) -> (CardId, CardId) {
    for a in state.cards.iter().filter(|c| c.is_available()) {
        for b in state.cards.iter().filter(|c| c.is_available() && c.id != a.id) {
            if (a.value == b.value) == matching {
                return (a.id.clone(), b.id.clone());
            }
        }
    }
    panic!("no pair left");
}

async fn wait_for(rx: &mut tokio::sync::broadcast::Receiver<SessionEvent>, wanted: SessionEvent) {
    loop {
        match rx.recv().await {
            Ok(event) if event == wanted => return,
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => panic!("driver stopped before {wanted:?}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_mismatch_resolves_on_timers() {
    let driver = spawn(GameSettings::default().with_players(["Ann", "Bob"]));
    driver.initialize(None).await.unwrap();

    let (a, b) = pair_in(&driver.snapshot(), false);
    assert!(driver.flip(a.clone()).await.unwrap());
    assert!(driver.flip(b).await.unwrap());
    assert_eq!(driver.snapshot().flipped_cards.len(), 2);

    sleep(Duration::from_millis(400)).await;
    assert!(driver.snapshot().mismatched_cards.is_empty());

    sleep(Duration::from_millis(200)).await;
    let checking = driver.snapshot();
    assert!(checking.is_checking);
    assert_eq!(checking.mismatched_cards.len(), 2);
    assert!(!driver.flip(a).await.unwrap());

    sleep(Duration::from_millis(1000)).await;
    let resolved = driver.snapshot();
    assert!(!resolved.is_checking);
    assert!(resolved.flipped_cards.is_empty());
    assert_eq!(resolved.current_player_index, 1);
    assert_eq!(resolved.stats.moves, 1);
}

#[tokio::test(start_paused = true)]
async fn test_game_timer_samples_every_second() {
    let driver = spawn(GameSettings::default());
    driver.initialize(None).await.unwrap();

    sleep(Duration::from_millis(5500)).await;
    assert_eq!(driver.snapshot().stats.time, 5);

    driver.start_new().await.unwrap();
    sleep(Duration::from_secs(3)).await;
    let idle = driver.snapshot();
    assert_eq!(idle.game_state, GameState::Idle);
    assert_eq!(idle.stats.time, 0);
}

#[tokio::test(start_paused = true)]
async fn test_timer_counts_from_the_deal() {
    let driver = spawn(GameSettings::default());
    sleep(Duration::from_millis(2500)).await;
    driver.initialize(None).await.unwrap();

    sleep(Duration::from_millis(1100)).await;
    assert_eq!(driver.snapshot().stats.time, 1);
}

#[tokio::test(start_paused = true)]
async fn test_results_ready_after_finish() {
    let driver = spawn(GameSettings::default().with_custom_grid(2, 2));
    let mut events = driver.subscribe();
    driver.initialize(None).await.unwrap();

    for round in 0..2 {
        let (a, b) = pair_in(&driver.snapshot(), true);
        driver.flip(a).await.unwrap();
        driver.flip(b).await.unwrap();
        let outcome = driver.check_match().await.unwrap();
        assert_eq!(outcome, MatchOutcome::Matched { finished: round == 1 });
    }
    assert_eq!(driver.snapshot().game_state, GameState::Finished);

    wait_for(&mut events, SessionEvent::Finished).await;
    let started = tokio::time::Instant::now();
    wait_for(&mut events, SessionEvent::ResultsReady).await;
    assert!(started.elapsed() >= Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_reset_discards_pending_mismatch() {
    let driver = spawn(GameSettings::default().with_players(["Ann", "Bob"]));
    driver.initialize(None).await.unwrap();

    let (a, b) = pair_in(&driver.snapshot(), false);
    driver.flip(a).await.unwrap();
    driver.flip(b).await.unwrap();
    driver.check_match().await.unwrap();

    driver.reset().await.unwrap();
    sleep(Duration::from_secs(2)).await;
    let state = driver.snapshot();
    assert_eq!(state.current_player_index, 0);
    assert_eq!(state.stats.moves, 0);
    assert!(state.cards.iter().all(|c| !c.is_flipped));
}

#[tokio::test(start_paused = true)]
async fn test_settings_validation_through_driver() {
    let driver = spawn(GameSettings::default());
    let rejected = driver
        .update_settings(GameSettings::default().with_custom_grid(3, 3))
        .await
        .unwrap();
    assert_eq!(rejected, Err(SettingsError::OddCardCount { width: 3, height: 3 }));

    driver
        .update_settings(GameSettings::default().with_custom_grid(5, 4))
        .await
        .unwrap()
        .unwrap();
    driver.initialize(None).await.unwrap();
    assert_eq!(driver.snapshot().cards.len(), 20);
}

#[tokio::test(start_paused = true)]
async fn test_next_turn_through_driver() {
    let driver = spawn(GameSettings::default().with_players(["A", "B", "C"]));
    driver.initialize(None).await.unwrap();
    assert!(driver.next_turn().await.unwrap());
    assert!(driver.next_turn().await.unwrap());
    assert_eq!(driver.snapshot().current_player_index, 2);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_closes_channels() {
    let driver = spawn(GameSettings::default());
    let mut snapshots = driver.watch();
    driver.shutdown().await;
    assert!(snapshots.changed().await.is_err());
}

#[test]
fn test_driver_error_message() {
    assert_eq!(DriverError::Stopped.to_string(), "game driver has stopped");
}
