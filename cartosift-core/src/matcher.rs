//! Fuzzy matching of query text against the category catalog.
//!
//! Scoring is a pure function of the catalog and the query. A match inside
//! the display name weighs [`NAME_WEIGHT`] times more than a match in any
//! other searchable text.

use std::cmp::Reverse;

use serde::Serialize;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::catalog::{Catalog, CategoryEntry};

/// Weight applied to each occurrence found in an entry's display name.
pub const NAME_WEIGHT: u32 = 10;

/// Score of one catalog entry for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredMatch {
    /// Position of the entry in the catalog.
    pub index: usize,
    /// The matched entry.
    pub entry: CategoryEntry,
    /// Weighted occurrences inside the display name.
    pub name_score: u32,
    /// Occurrences inside the remaining search texts.
    pub term_score: u32,
    /// `name_score + term_score`.
    pub total_score: u32,
}

/// Result of scoring a catalog against a query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryMatches {
    /// Hits whose display name matched, in catalog order.
    pub name_matches: Vec<ScoredMatch>,
    /// Hits matching only through terms, tags or key, in catalog order.
    pub rest: Vec<ScoredMatch>,
    /// All hits, highest total first; ties keep catalog order.
    pub ranked: Vec<ScoredMatch>,
}

impl CategoryMatches {
    /// Report whether nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

/// Count case-insensitive occurrences of the query words inside `text`.
///
/// Diacritics are ignored on both sides. Words are matched longest first,
/// including at word-internal positions, and every matched span is blanked
/// before the next word is tried, so no character counts twice.
///
/// ```
/// use cartosift_core::count_matches;
///
/// assert_eq!(count_matches("Restaurant", "rest"), 1);
/// assert_eq!(count_matches("banana", "an"), 2);
/// assert_eq!(count_matches("Fast Food", "fa fo"), 2);
/// assert_eq!(count_matches("Café", "cafe"), 1);
/// ```
#[must_use]
pub fn count_matches(text: &str, query: &str) -> u32 {
    let mut haystack = fold(text);
    let mut words: Vec<String> = query.split_whitespace().map(fold).collect();
    words.sort_by_key(|word| Reverse(word.chars().count()));

    let mut count: u32 = 0;
    for word in &words {
        while let Some(start) = haystack.find(word.as_str()) {
            let end = start + word.len();
            haystack.replace_range(start..end, &" ".repeat(word.len()));
            count = count.saturating_add(1);
        }
    }
    count
}

/// Strip combining marks after canonical decomposition, then lower-case.
fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Score one entry.
#[must_use]
pub fn score_entry(index: usize, entry: &CategoryEntry, query: &str) -> ScoredMatch {
    let name_score = count_matches(entry.display_name(), query).saturating_mul(NAME_WEIGHT);
    let term_score = entry
        .search_texts()
        .iter()
        .map(|text| count_matches(text, query))
        .fold(0, u32::saturating_add);
    ScoredMatch {
        index,
        entry: entry.clone(),
        name_score,
        term_score,
        total_score: name_score.saturating_add(term_score),
    }
}

/// Score every catalog entry against `query`.
///
/// Entries with a zero total are dropped. The caller composes the display
/// order, conventionally name matches first.
///
/// # Examples
///
/// ```
/// use cartosift_core::{Catalog, score};
///
/// let catalog = Catalog::from_json_str(r#"[
///     {"key": "amenity/restaurant", "name": "Restaurant", "tags": {"amenity": "restaurant"}},
///     {"key": "amenity/cafe", "name": "Cafe", "terms": ["coffee"]}
/// ]"#)?;
/// let matches = score(&catalog, "rest");
/// assert_eq!(matches.name_matches.len(), 1);
/// assert_eq!(matches.name_matches[0].name_score, 10);
/// # Ok::<(), cartosift_core::CatalogError>(())
/// ```
#[must_use]
pub fn score(catalog: &Catalog, query: &str) -> CategoryMatches {
    let hits: Vec<ScoredMatch> = catalog
        .entries()
        .iter()
        .enumerate()
        .map(|(index, entry)| score_entry(index, entry, query))
        .filter(|hit| hit.total_score > 0)
        .collect();

    let (name_matches, rest): (Vec<_>, Vec<_>) =
        hits.iter().cloned().partition(|hit| hit.name_score > 0);

    let mut ranked = hits;
    // `sort_by` is stable, so equal totals keep catalog order.
    ranked.sort_by(|a, b| b.total_score.cmp(&a.total_score));

    CategoryMatches {
        name_matches,
        rest,
        ranked,
    }
}
