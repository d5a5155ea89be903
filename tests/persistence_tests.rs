//! Session save and restore through real storage.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{find_pair, init_logging, play_match};
use memory_pairs::persistence::SESSION_KEY;
use memory_pairs::{
    Clock, Codec, EngineConfig, FileStore, GameSettings, GameState, KeyValueStore, Language,
    ManualClock, MemoryStore, Preferences, Session, SessionEvent, SessionRepository, ThemeMode,
};

fn session_on(
    store: Arc<dyn KeyValueStore>,
    clock: &ManualClock,
    codec: Codec,
    settings: GameSettings,
) -> Session {
    init_logging();
    Session::new(EngineConfig::default().with_seed(11))
        .with_clock(Arc::new(clock.clone()))
        .with_repository(SessionRepository::new(store).with_codec(codec))
        .with_settings(settings)
        .unwrap()
}

#[test]
fn test_restore_mid_game_from_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).unwrap());
    let clock = ManualClock::default();
    let settings = GameSettings::default().with_players(["Ann", "Bob"]);

    let mut first = session_on(store.clone(), &clock, Codec::Json, settings.clone());
    first.initialize_game(None);
    play_match(&mut first);
    clock.advance(Duration::from_secs(42));
    first.tick();
    // Leave one card face up and a mismatch pending.
    let (a, b) = find_pair(&first, false);
    first.flip_card(&a);
    first.flip_card(&b);
    first.check_match();
    let saved = first.snapshot();
    drop(first);

    // Reload much later.
    clock.advance(Duration::from_secs(3600));
    let mut second = session_on(store, &clock, Codec::Json, GameSettings::default());
    assert!(second.restore().unwrap());

    let state = second.state();
    assert_eq!(state.game_state, GameState::Playing);
    assert_eq!(state.settings, settings);
    assert_eq!(state.players, saved.players);
    assert_eq!(state.matched_pairs, 1);
    assert_eq!(state.stats.time, 42);
    assert!(state.flipped_cards.is_empty());
    assert!(!state.is_checking);
    assert!(state.mismatched_cards.is_empty());
    assert!(state.cards.iter().all(|c| c.is_flipped == c.is_matched));
    assert_eq!(second.pending_tasks(), 0);
    assert!(matches!(
        second.drain_events().last(),
        Some(SessionEvent::Restored { game_state: GameState::Playing })
    ));

    // The clock resumes from the saved time, not from the first start.
    clock.advance(Duration::from_secs(3));
    second.tick();
    assert_eq!(second.state().stats.time, 45);

    // And play continues.
    play_match(&mut second);
    assert_eq!(second.state().matched_pairs, 2);
}

#[test]
fn test_restore_finished_session_reschedules_results() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let clock = ManualClock::default();

    let mut first = session_on(
        store.clone(),
        &clock,
        Codec::Bincode,
        GameSettings::default().with_custom_grid(2, 2),
    );
    first.initialize_game(None);
    play_match(&mut first);
    play_match(&mut first);
    assert_eq!(first.game_state(), GameState::Finished);

    let mut second = session_on(store, &clock, Codec::Bincode, GameSettings::default());
    assert!(second.restore().unwrap());
    assert_eq!(second.game_state(), GameState::Finished);
    assert!(second.state().cards.iter().all(|c| c.is_matched && c.is_flipped));
    second.drain_events();

    clock.advance(Duration::from_secs(3));
    second.advance();
    assert_eq!(second.drain_events(), vec![SessionEvent::ResultsReady]);
}

#[test]
fn test_restore_without_record() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let clock = ManualClock::default();
    let mut session = session_on(store, &clock, Codec::Json, GameSettings::default());
    assert!(!session.restore().unwrap());
    assert_eq!(session.game_state(), GameState::Idle);

    let mut detached = Session::default();
    assert!(!detached.restore().unwrap());
}

#[test]
fn test_corrupt_record_is_an_error() {
    let store = Arc::new(MemoryStore::new());
    store.put(SESSION_KEY, b"{not json").unwrap();
    let clock = ManualClock::default();
    let mut session = session_on(store, &clock, Codec::Json, GameSettings::default());
    assert!(session.restore().is_err());
    assert_eq!(session.game_state(), GameState::Idle);
}

#[test]
fn test_auto_persist_can_be_disabled() {
    let store = Arc::new(MemoryStore::new());
    let mut session = Session::new(EngineConfig::default().with_auto_persist(false))
        .with_repository(SessionRepository::new(store.clone()));
    session.initialize_game(None);
    assert!(!store.contains(SESSION_KEY));

    session.save().unwrap();
    assert!(store.contains(SESSION_KEY));
}

#[test]
fn test_every_mutation_is_saved() {
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::default();
    let mut session = session_on(store.clone(), &clock, Codec::Json, GameSettings::default());
    let repository = SessionRepository::new(store);

    session.initialize_game(None);
    let (a, b) = find_pair(&session, true);
    session.flip_card(&a);
    let stored = repository.load().unwrap().unwrap();
    assert_eq!(stored.game_state, GameState::Playing);
    assert!(stored.cards.iter().all(|c| !c.is_flipped));

    session.flip_card(&b);
    session.check_match();
    assert_eq!(repository.load().unwrap().unwrap().matched_pairs, 1);

    session.start_new_game();
    let stored = repository.load().unwrap().unwrap();
    assert_eq!(stored.game_state, GameState::Idle);
    assert!(stored.cards.is_empty());
}

#[test]
fn test_settings_before_restore_keep_stored_game() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let clock = ManualClock::default();
    let repository = SessionRepository::new(store.clone());

    let mut first = session_on(store.clone(), &clock, Codec::Json, GameSettings::default());
    first.initialize_game(None);
    play_match(&mut first);
    drop(first);

    let mut second = session_on(
        store,
        &clock,
        Codec::Json,
        GameSettings::default().with_players(["Ann", "Bob"]),
    );
    second
        .set_settings(GameSettings::default().with_custom_grid(4, 5))
        .unwrap();
    let stored = repository.load().unwrap().unwrap();
    assert_eq!(stored.game_state, GameState::Playing);
    assert_eq!(stored.matched_pairs, 1);

    assert!(second.restore().unwrap());
    assert_eq!(second.game_state(), GameState::Playing);
    assert_eq!(second.state().matched_pairs, 1);
    assert_eq!(second.settings(), &GameSettings::default());

    // Saving resumes once the record has been read.
    second
        .set_settings(GameSettings::default().with_custom_grid(4, 5))
        .unwrap();
    assert_eq!(
        repository.load().unwrap().unwrap().settings,
        GameSettings::default().with_custom_grid(4, 5)
    );
}

#[test]
fn test_restore_survives_out_of_range_time() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let clock = ManualClock::default();
    clock.advance(Duration::from_secs(86_400));

    let mut first = session_on(store.clone(), &clock, Codec::Json, GameSettings::default());
    first.initialize_game(None);
    let mut saved = first.snapshot();
    saved.stats.time = 10_000_000_000_000_000;
    SessionRepository::new(store.clone()).save(&saved).unwrap();
    drop(first);

    let mut second = session_on(store, &clock, Codec::Json, GameSettings::default());
    assert!(second.restore().unwrap());
    let state = second.state();
    assert_eq!(state.game_state, GameState::Playing);
    assert_eq!(state.stats.start_time, Some(clock.now()));
}

#[test]
fn test_preferences_survive_session_changes() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).unwrap());
    let prefs = Preferences::new(store.clone());
    prefs.set_theme_mode(ThemeMode::Dark).unwrap();
    prefs.set_language(Language::En).unwrap();

    let clock = ManualClock::default();
    let mut session = session_on(store.clone(), &clock, Codec::Json, GameSettings::default());
    session.initialize_game(None);
    session.start_new_game();
    SessionRepository::new(store.clone()).clear().unwrap();

    let reopened = Preferences::new(Arc::new(FileStore::open(dir.path()).unwrap()));
    assert_eq!(reopened.theme_mode().unwrap(), ThemeMode::Dark);
    assert_eq!(reopened.language().unwrap(), Language::En);
}
