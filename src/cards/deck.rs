//! Deck generation.
//!
//! Builds a shuffled, paired deck for a session:
//!
//! - **Numbers**: values `1..=pairs`, each twice.
//! - **Bundled icons**: the first `pairs` catalog names, each twice.
//! - **Dynamic icons**: the first `min(items, pairs)` service items, each
//!   twice. A short item list yields a smaller deck; it is never padded.
//!
//! Cards receive ids `card-0..card-N` after shuffling.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::card::{Card, CardId, CardValue, ItemId};
use super::catalog::IconCatalog;
use crate::core::config::{GameSettings, Theme};
use crate::core::rng::GameRng;

/// An item supplied by the Themes service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeItem {
    pub id: ItemId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
}

impl ThemeItem {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            image: None,
            emoji: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }

    fn to_card(&self, id: CardId) -> Card {
        let mut card = Card::new(id, CardValue::Item(self.id.clone()));
        card.image = self.image.clone();
        card.emoji = self.emoji.clone();
        card.name = self.name.clone();
        card
    }
}

/// Generate a shuffled deck for `settings`.
///
/// `items` feeds dynamic icon themes. When a dynamic theme is selected but
/// no items are available the bundled catalog is used instead.
pub fn generate_deck(
    settings: &GameSettings,
    items: Option<&[ThemeItem]>,
    catalog: &IconCatalog,
    rng: &mut GameRng,
) -> Vec<Card> {
    let pairs = settings.pair_count();

    let cards = match settings.theme {
        Theme::Numbers => number_deck(pairs, rng),
        Theme::Icons => match items {
            Some(items) if settings.icon_theme.is_dynamic() && !items.is_empty() => {
                item_deck(items, pairs, rng)
            }
            _ => {
                if settings.icon_theme.is_dynamic() {
                    warn!(
                        theme = settings.icon_theme.name(),
                        "no theme items available, using bundled icons"
                    );
                }
                icon_deck(catalog, pairs, rng)
            }
        },
    };

    debug!(
        cards = cards.len(),
        requested_pairs = pairs,
        theme = settings.theme.label(),
        "deck generated"
    );
    cards
}

fn number_deck(pairs: usize, rng: &mut GameRng) -> Vec<Card> {
    let mut values: Vec<u32> = (1..=pairs as u32).flat_map(|v| [v, v]).collect();
    rng.shuffle(&mut values);
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| Card::new(CardId::at(i), CardValue::Number(v)))
        .collect()
}

fn icon_deck(catalog: &IconCatalog, pairs: usize, rng: &mut GameRng) -> Vec<Card> {
    let mut names: Vec<&str> = catalog
        .first(pairs)
        .iter()
        .flat_map(|name| [name.as_str(), name.as_str()])
        .collect();
    rng.shuffle(&mut names);
    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let mut card = Card::new(CardId::at(i), CardValue::Icon(name.to_string()));
            card.icon_name = Some(name.to_string());
            card
        })
        .collect()
}

fn item_deck(items: &[ThemeItem], pairs: usize, rng: &mut GameRng) -> Vec<Card> {
    let selected = &items[..items.len().min(pairs)];
    let mut doubled: Vec<&ThemeItem> = selected.iter().flat_map(|item| [item, item]).collect();
    rng.shuffle(&mut doubled);
    doubled
        .into_iter()
        .enumerate()
        .map(|(i, item)| item.to_card(CardId::at(i)))
        .collect()
}
