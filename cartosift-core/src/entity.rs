//! Entity identifiers and their external encodings.
//!
//! An [`EntityRef`] names a single OpenStreetMap element. Three encodings are
//! supported:
//! - the compact short id used in links and cache keys (`n123`, `w42`, `r7`);
//! - the API path used by the primary data source (`node/123`);
//! - the numeric map id used by vector tiles, which appends a one-digit kind
//!   discriminator to the element id (`42` way becomes `421`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Kind of an OpenStreetMap element.
///
/// `Unknown` only appears when a payload carries an unrecognised `type`; it
/// is never produced by parsing an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// A single coordinate.
    Node,
    /// An ordered list of node references.
    Way,
    /// A collection of members with roles.
    Relation,
    /// Any other element type reported by a data source.
    #[serde(other)]
    Unknown,
}

impl ElementKind {
    /// Single-letter prefix used by the short id form.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Node => 'n',
            Self::Way => 'w',
            Self::Relation => 'r',
            Self::Unknown => '?',
        }
    }

    /// Lower-case name used by the API path form and by Overpass QL.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
            Self::Unknown => "unknown",
        }
    }

    fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'n' => Some(Self::Node),
            'w' => Some(Self::Way),
            'r' => Some(Self::Relation),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "node" => Some(Self::Node),
            "way" => Some(Self::Way),
            "relation" => Some(Self::Relation),
            _ => None,
        }
    }

    const fn from_discriminator(digit: u64) -> Option<Self> {
        match digit {
            0 => Some(Self::Node),
            1 => Some(Self::Way),
            4 => Some(Self::Relation),
            _ => None,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while parsing or converting identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The input is not a well-formed identifier.
    #[error("invalid entity identifier {input:?}")]
    InvalidIdentifier {
        /// The rejected input.
        input: String,
    },
    /// The element kind has no representation in the requested encoding.
    #[error("element kind {kind} has no aggregate query type")]
    UnsupportedKind {
        /// The offending kind.
        kind: ElementKind,
    },
}

/// Identifier of a single map element.
///
/// # Examples
///
/// ```
/// use cartosift_core::{ElementKind, EntityRef};
///
/// let way: EntityRef = "w51050330".parse()?;
/// assert_eq!(way, EntityRef::way(51_050_330));
/// assert_eq!(way.to_string(), "w51050330");
/// assert_eq!(way.kind, ElementKind::Way);
/// # Ok::<(), cartosift_core::IdentifierError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityRef {
    /// Element kind.
    pub kind: ElementKind,
    /// Numeric element id, unique within its kind.
    pub id: u64,
}

impl EntityRef {
    /// Construct a reference from its parts.
    #[must_use]
    pub const fn new(kind: ElementKind, id: u64) -> Self {
        Self { kind, id }
    }

    /// Reference to a node.
    #[must_use]
    pub const fn node(id: u64) -> Self {
        Self::new(ElementKind::Node, id)
    }

    /// Reference to a way.
    #[must_use]
    pub const fn way(id: u64) -> Self {
        Self::new(ElementKind::Way, id)
    }

    /// Reference to a relation.
    #[must_use]
    pub const fn relation(id: u64) -> Self {
        Self::new(ElementKind::Relation, id)
    }

    /// Numeric discriminator expected by the aggregate query endpoint and by
    /// the vector tile map ids.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::UnsupportedKind`] for [`ElementKind::Unknown`].
    pub const fn to_aggregate_query_type(self) -> Result<u8, IdentifierError> {
        match self.kind {
            ElementKind::Node => Ok(0),
            ElementKind::Way => Ok(1),
            ElementKind::Relation => Ok(4),
            ElementKind::Unknown => Err(IdentifierError::UnsupportedKind { kind: self.kind }),
        }
    }

    /// Numeric map id: the element id with the kind discriminator appended
    /// as a final decimal digit.
    ///
    /// Returns `None` when the kind is unsupported or the id would overflow.
    ///
    /// ```
    /// use cartosift_core::EntityRef;
    ///
    /// assert_eq!(EntityRef::relation(12).to_map_id(), Some(124));
    /// ```
    #[must_use]
    pub fn to_map_id(self) -> Option<u64> {
        let discriminator = self.to_aggregate_query_type().ok()?;
        self.id
            .checked_mul(10)?
            .checked_add(u64::from(discriminator))
    }

    /// Inverse of [`EntityRef::to_map_id`].
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::InvalidIdentifier`] when the trailing digit
    /// is not a known discriminator.
    pub fn from_map_id(map_id: u64) -> Result<Self, IdentifierError> {
        let kind = ElementKind::from_discriminator(map_id % 10).ok_or_else(|| {
            IdentifierError::InvalidIdentifier {
                input: map_id.to_string(),
            }
        })?;
        Ok(Self::new(kind, map_id / 10))
    }

    /// API path form, e.g. `way/51050330`.
    #[must_use]
    pub fn api_path(self) -> String {
        format!("{}/{}", self.kind, self.id)
    }

    /// Parse the API path form produced by [`EntityRef::api_path`].
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::InvalidIdentifier`] for malformed input.
    pub fn from_api_path(input: &str) -> Result<Self, IdentifierError> {
        let invalid = || IdentifierError::InvalidIdentifier {
            input: input.to_owned(),
        };
        let (kind, id) = input.split_once('/').ok_or_else(invalid)?;
        let kind = ElementKind::from_name(kind).ok_or_else(invalid)?;
        Ok(Self::new(kind, parse_id(id).ok_or_else(invalid)?))
    }
}

fn parse_id(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.letter(), self.id)
    }
}

impl FromStr for EntityRef {
    type Err = IdentifierError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || IdentifierError::InvalidIdentifier {
            input: input.to_owned(),
        };
        let mut chars = input.chars();
        let kind = chars
            .next()
            .and_then(ElementKind::from_letter)
            .ok_or_else(invalid)?;
        let id = parse_id(chars.as_str()).ok_or_else(invalid)?;
        Ok(Self::new(kind, id))
    }
}

impl Serialize for EntityRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntityRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Encode a reference into its short id form.
#[must_use]
pub fn encode(entity: EntityRef) -> String {
    entity.to_string()
}

/// Decode a short id such as `w51050330`.
///
/// # Errors
///
/// Returns [`IdentifierError::InvalidIdentifier`] when the input is empty,
/// starts with an unknown kind letter, or carries a non-numeric id.
pub fn decode(input: &str) -> Result<EntityRef, IdentifierError> {
    input.parse()
}
