//! Card tiles - the runtime state of one deck position.
//!
//! A `Card` pairs a match key (`CardValue`) with presentation data. Only the
//! value takes part in matching; `image`, `emoji`, `icon_name` and `name`
//! exist for rendering.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Stable card identifier within a session (`"card-N"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub String);

impl CardId {
    /// Id for the card dealt at `index` (post-shuffle).
    #[must_use]
    pub fn at(index: usize) -> Self {
        Self(format!("card-{index}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of an item supplied by the Themes service.
///
/// The service sends numbers for some themes and strings for others; both
/// are normalized to their string form so `25` and `"25"` name one item.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub String);

impl ItemId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<i64> for ItemId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl Serialize for ItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

struct ItemIdVisitor;

impl Visitor<'_> for ItemIdVisitor {
    type Value = ItemId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an item id (string or integer)")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<ItemId, E> {
        Ok(ItemId(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<ItemId, E> {
        Ok(ItemId(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<ItemId, E> {
        Ok(ItemId(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<ItemId, E> {
        Ok(ItemId(v.to_string()))
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Binary formats cannot self-describe; they always carry the string form.
        if deserializer.is_human_readable() {
            deserializer.deserialize_any(ItemIdVisitor)
        } else {
            deserializer.deserialize_string(ItemIdVisitor)
        }
    }
}

/// Match key. Two cards match iff their values are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardValue {
    /// Numbers theme: the number shown on the card.
    Number(u32),
    /// Built-in icon catalog entry, by name.
    Icon(String),
    /// Dynamic theme item, by service id.
    Item(ItemId),
}

impl fmt::Display for CardValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardValue::Number(n) => write!(f, "{n}"),
            CardValue::Icon(name) => f.write_str(name),
            CardValue::Item(id) => write!(f, "item:{id}"),
        }
    }
}

/// One deck tile.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,

    pub value: CardValue,

    /// Face up. Always true once matched.
    pub is_flipped: bool,

    pub is_matched: bool,

    /// Image URL for dynamic themes.
    #[serde(default)]
    pub image: Option<String>,

    /// Emoji glyph for emoji-based themes.
    #[serde(default)]
    pub emoji: Option<String>,

    /// Catalog icon name for the bundled icon theme.
    #[serde(default)]
    pub icon_name: Option<String>,

    /// Item caption for dynamic themes.
    #[serde(default)]
    pub name: Option<String>,
}

impl Card {
    /// A face-down card with no presentation data.
    #[must_use]
    pub fn new(id: CardId, value: CardValue) -> Self {
        Self {
            id,
            value,
            is_flipped: false,
            is_matched: false,
            image: None,
            emoji: None,
            icon_name: None,
            name: None,
        }
    }

    /// Face down and still in play.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !self.is_flipped && !self.is_matched
    }

    /// Face up but not yet part of a pair.
    #[must_use]
    pub fn is_face_up_unmatched(&self) -> bool {
        self.is_flipped && !self.is_matched
    }

    #[must_use]
    pub fn matches(&self, other: &Card) -> bool {
        self.value == other.value
    }
}
