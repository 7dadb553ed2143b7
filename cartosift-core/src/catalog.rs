//! Static catalog of category definitions used for local search.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named category, e.g. `amenity/restaurant`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    /// Stable catalog key.
    pub key: String,
    /// Human-readable name; the key is shown when missing.
    #[serde(default)]
    pub name: Option<String>,
    /// Exact tag set identifying features of this category.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Alternative search terms.
    #[serde(default)]
    pub terms: Vec<String>,
}

impl CategoryEntry {
    /// Construct an entry.
    pub fn new<K, N, T, S>(key: K, name: N, tags: T, terms: S) -> Self
    where
        K: Into<String>,
        N: Into<String>,
        T: IntoIterator<Item = (String, String)>,
        S: IntoIterator<Item = String>,
    {
        Self {
            key: key.into(),
            name: Some(name.into()),
            tags: tags.into_iter().collect(),
            terms: terms.into_iter().collect(),
        }
    }

    /// Name shown to users.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.key)
    }

    /// Tags rendered as `key=value` strings.
    pub fn tag_strings(&self) -> impl Iterator<Item = String> + '_ {
        self.tags.iter().map(|(k, v)| format!("{k}={v}"))
    }

    /// Texts searched in addition to the name: the terms, the tag strings
    /// and the catalog key itself.
    #[must_use]
    pub fn search_texts(&self) -> Vec<String> {
        self.terms
            .iter()
            .cloned()
            .chain(self.tag_strings())
            .chain(std::iter::once(self.key.clone()))
            .collect()
    }
}

/// Errors raised while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog document could not be parsed.
    #[error("failed to parse category catalog")]
    Parse {
        /// Source error from `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// Two entries share the same key.
    #[error("duplicate category key {key:?}")]
    DuplicateKey {
        /// The repeated key.
        key: String,
    },
}

/// Immutable, ordered collection of [`CategoryEntry`] values.
///
/// # Examples
///
/// ```
/// use cartosift_core::Catalog;
///
/// let catalog = Catalog::from_json_str(r#"[
///     {"key": "amenity/cafe", "name": "Cafe", "tags": {"amenity": "cafe"}, "terms": ["coffee"]}
/// ]"#)?;
/// assert_eq!(catalog.len(), 1);
/// # Ok::<(), cartosift_core::CatalogError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CategoryEntry>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate keys.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateKey`] when two entries share a key.
    pub fn new(entries: Vec<CategoryEntry>) -> Result<Self, CatalogError> {
        let duplicate = {
            let mut seen = HashSet::new();
            entries
                .iter()
                .find(|entry| !seen.insert(entry.key.as_str()))
                .map(|entry| entry.key.clone())
        };
        if let Some(key) = duplicate {
            return Err(CatalogError::DuplicateKey { key });
        }
        Ok(Self { entries })
    }

    /// Parse a JSON array of entries.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] for malformed JSON or duplicate keys.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let entries =
            serde_json::from_str(json).map_err(|source| CatalogError::Parse { source })?;
        Self::new(entries)
    }

    /// Parse a JSON array of entries from a reader.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] for malformed JSON or duplicate keys.
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, CatalogError> {
        let entries =
            serde_json::from_reader(reader).map_err(|source| CatalogError::Parse { source })?;
        Self::new(entries)
    }

    /// Entries in catalog order.
    #[must_use]
    pub fn entries(&self) -> &[CategoryEntry] {
        &self.entries
    }

    /// Look up an entry by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CategoryEntry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Report whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
