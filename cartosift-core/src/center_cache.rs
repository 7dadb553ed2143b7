//! Session-wide store of entity centres.
//!
//! Entities are assumed geometrically static for the lifetime of a session,
//! so entries are never evicted. Concurrent writers for the same key race
//! harmlessly: the last writer wins and all writers carry equivalent values.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use geo::Coord;

use crate::entity::EntityRef;

/// Shared, cloneable handle to a centre cache.
///
/// Clones share the same underlying map, so a cache can be injected into
/// several resolvers belonging to one session. No lock is held beyond the
/// duration of a single call.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use cartosift_core::{CenterCache, EntityRef};
///
/// let cache = CenterCache::new();
/// cache.put(EntityRef::way(1), Coord { x: 14.0, y: 50.0 });
/// assert_eq!(cache.get(EntityRef::way(1)), Some(Coord { x: 14.0, y: 50.0 }));
/// assert_eq!(cache.get(EntityRef::way(2)), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CenterCache {
    entries: Arc<RwLock<HashMap<EntityRef, Coord<f64>>>>,
}

impl CenterCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `center` for `entity`, overwriting any previous value.
    pub fn put(&self, entity: EntityRef, center: Coord<f64>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity, center);
    }

    /// Look up the centre for `entity`.
    #[must_use]
    pub fn get(&self, entity: EntityRef) -> Option<Coord<f64>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&entity)
            .copied()
    }

    /// Return the cached centre, inserting `center` first when absent.
    ///
    /// The check and the insert happen under one write lock.
    pub fn get_or_insert(&self, entity: EntityRef, center: Coord<f64>) -> Coord<f64> {
        *self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(entity)
            .or_insert(center)
    }

    /// Number of cached centres.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Report whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
