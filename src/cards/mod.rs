//! Card system: tiles, the bundled icon catalog, and deck generation.
//!
//! ## Key Types
//!
//! - `CardId`: Stable per-session identifier (`card-N`)
//! - `CardValue`: Match key (number, icon name, or service item id)
//! - `Card`: One tile with flip/match state and presentation data
//! - `IconCatalog`: Ordered built-in icon names
//! - `ThemeItem`: Item supplied by the Themes service
//!
//! Display fields never take part in matching; only `CardValue` does.

pub mod card;
pub mod catalog;
pub mod deck;

pub use card::{Card, CardId, CardValue, ItemId};
pub use catalog::{IconCatalog, BUILTIN_ICONS};
pub use deck::{generate_deck, ThemeItem};
