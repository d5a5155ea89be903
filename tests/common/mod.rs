//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use memory_pairs::{CardId, EngineConfig, GameSettings, ManualClock, Session};
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Install a test subscriber once. Level comes from `TEST_LOG`, then
/// `RUST_LOG`, then `warn`.
pub fn init_logging() {
    INIT.call_once(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init()
            .ok();
    });
}

/// A seeded session on a manual clock.
pub fn session(settings: GameSettings) -> (Session, ManualClock) {
    init_logging();
    let clock = ManualClock::default();
    let session = Session::new(EngineConfig::default().with_seed(7))
        .with_clock(Arc::new(clock.clone()))
        .with_settings(settings)
        .expect("valid settings");
    (session, clock)
}

/// Two face-down cards whose values match (or not).
pub fn find_pair(session: &Session, matching: bool) -> (CardId, CardId) {
    let cards = &session.state().cards;
    for a in cards.iter().filter(|c| c.is_available()) {
        for b in cards.iter().filter(|c| c.is_available() && c.id != a.id) {
            if (a.value == b.value) == matching {
                return (a.id.clone(), b.id.clone());
            }
        }
    }
    panic!("no {} pair left", if matching { "matching" } else { "mismatched" });
}

/// Flip a matching pair and resolve it immediately.
pub fn play_match(session: &mut Session) {
    let (a, b) = find_pair(session, true);
    assert!(session.flip_card(&a));
    assert!(session.flip_card(&b));
    session.check_match();
}
