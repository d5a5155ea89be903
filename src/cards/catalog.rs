//! Built-in icon catalog for the bundled icon theme.
//!
//! The catalog is order-stable: a deck of `n` pairs always uses the first
//! `n` entries. It provides fast lookup by name for renderers that map names
//! back to glyphs.

use rustc_hash::FxHashMap;

/// Names of the bundled icons, in deal order.
pub const BUILTIN_ICONS: [&str; 40] = [
    "heart", "star", "zap", "moon", "sun", "music", "camera", "gamepad", "car", "plane",
    "ship", "bike", "coffee", "pizza", "cake", "icecream", "apple", "home", "leaf", "flower",
    "mountain", "umbrella", "gift", "book", "lightbulb", "palette", "scissors", "wrench", "key",
    "lock", "bell", "mail", "phone", "globe", "map", "compass", "flag", "crown", "trophy",
    "target",
];

/// Ordered set of icon names.
///
/// ## Example
///
/// ```
/// use memory_pairs::cards::IconCatalog;
///
/// let catalog = IconCatalog::builtin();
/// assert_eq!(catalog.first(2), ["heart", "star"]);
/// assert_eq!(catalog.position("star"), Some(1));
/// ```
#[derive(Clone, Debug)]
pub struct IconCatalog {
    names: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl IconCatalog {
    /// Build a catalog from names in deal order.
    ///
    /// Duplicate names keep their first position.
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        let mut catalog = Self {
            names: Vec::new(),
            index: FxHashMap::default(),
        };
        for name in names {
            let name = name.into();
            if catalog.index.contains_key(&name) {
                continue;
            }
            catalog.index.insert(name.clone(), catalog.names.len());
            catalog.names.push(name);
        }
        catalog
    }

    /// The bundled catalog.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(BUILTIN_ICONS)
    }

    /// The first `n` names, or every name when the catalog is smaller.
    #[must_use]
    pub fn first(&self, n: usize) -> &[String] {
        &self.names[..n.min(self.names.len())]
    }

    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for IconCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
