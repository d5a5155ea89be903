//! Property-based tests for deck generation and flip admission.

mod common;

use std::collections::HashMap;

use memory_pairs::{
    generate_deck, Card, CardValue, GameRng, GameSettings, GameState, IconCatalog, IconTheme,
    Theme, ThemeItem,
};
use proptest::prelude::*;

fn value_counts(cards: &[Card]) -> HashMap<CardValue, usize> {
    let mut counts = HashMap::new();
    for card in cards {
        *counts.entry(card.value.clone()).or_insert(0) += 1;
    }
    counts
}

/// Valid custom grid dimensions with an even card count.
fn even_grid() -> impl Strategy<Value = (u32, u32)> {
    (2u32..=10, 2u32..=10).prop_filter("even card count", |(w, h)| (w * h) % 2 == 0)
}

fn theme() -> impl Strategy<Value = (Theme, IconTheme)> {
    prop_oneof![
        Just((Theme::Numbers, IconTheme::Icons)),
        Just((Theme::Icons, IconTheme::Icons)),
        Just((Theme::Icons, IconTheme::Pokemon)),
        Just((Theme::Icons, IconTheme::Flags)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: deck length is `2 * min(pairs, available)` and every value
    /// appears exactly twice.
    #[test]
    fn prop_deck_pairs_every_value(
        (width, height) in even_grid(),
        (theme, icon_theme) in theme(),
        available in 0usize..60,
        seed in any::<u64>(),
    ) {
        let settings = GameSettings::default()
            .with_custom_grid(width, height)
            .with_theme(theme, icon_theme);
        prop_assert!(settings.validate().is_ok());

        let items: Vec<ThemeItem> = (0..available as i64).map(|i| ThemeItem::new(i)).collect();
        let catalog = IconCatalog::builtin();
        let cards = generate_deck(&settings, Some(items.as_slice()), &catalog, &mut GameRng::new(seed));

        let pairs = settings.pair_count();
        let supply = match (theme, icon_theme.is_dynamic()) {
            (Theme::Numbers, _) => pairs,
            (Theme::Icons, true) if available > 0 => available,
            (Theme::Icons, _) => catalog.len(),
        };
        prop_assert_eq!(cards.len(), 2 * pairs.min(supply));
        prop_assert!(value_counts(&cards).values().all(|&n| n == 2));

        for (i, card) in cards.iter().enumerate() {
            prop_assert_eq!(card.id.as_str(), format!("card-{i}"));
            prop_assert!(card.is_available());
        }
    }

    /// Property: shuffling permutes the deck without changing its multiset.
    #[test]
    fn prop_shuffle_preserves_multiset(seed_a in any::<u64>(), seed_b in any::<u64>()) {
        let settings = GameSettings::default().with_custom_grid(6, 6);
        let catalog = IconCatalog::builtin();
        let a = generate_deck(&settings, None, &catalog, &mut GameRng::new(seed_a));
        let b = generate_deck(&settings, None, &catalog, &mut GameRng::new(seed_b));
        prop_assert_eq!(value_counts(&a), value_counts(&b));
    }

    /// Property: flips never succeed outside `playing` or while checking,
    /// and a rejected flip leaves the state untouched.
    #[test]
    fn prop_rejected_flips_change_nothing(picks in proptest::collection::vec(0usize..16, 1..40)) {
        let (mut session, _) = common::session(GameSettings::default());
        for &pick in &picks {
            let id = memory_pairs::CardId::at(pick);
            let before = session.snapshot();
            let admissible = before.game_state == GameState::Playing
                && !before.is_checking
                && before.flipped_cards.len() < 2
                && before.card(&id).is_some_and(|c| c.is_available());

            let flipped = session.flip_card(&id);
            prop_assert_eq!(flipped, admissible);
            if !flipped {
                prop_assert_eq!(session.snapshot(), before);
            }

            if session.state().flipped_cards.len() == 2 {
                session.check_match();
            }
            if session.game_state() == GameState::Idle {
                session.initialize_game(None);
            }
        }
    }
}

/// Repeated deals with different seeds produce different orders.
#[test]
fn test_shuffle_varies_between_deals() {
    let settings = GameSettings::default();
    let catalog = IconCatalog::builtin();
    let mut rng = GameRng::new(99);
    let orders: Vec<Vec<CardValue>> = (0..20)
        .map(|_| {
            generate_deck(&settings, None, &catalog, &mut rng)
                .into_iter()
                .map(|c| c.value)
                .collect()
        })
        .collect();

    let distinct: std::collections::HashSet<&Vec<CardValue>> = orders.iter().collect();
    assert!(distinct.len() > 15);
}
