//! Resolve an entity identifier into a complete [`Feature`].
//!
//! Resolution issues the primary fetch, builds geometry from the inline
//! elements and then looks for a centre: first from the geometry itself,
//! then from the [`CenterCache`], and finally from a narrow aggregate query
//! whose answer is cached for the rest of the session.
//!
//! The resolver keeps no per-call state. Callers displaying one selected
//! feature at a time pair it with a [`RequestTracker`] and drop completions
//! whose [`RequestTicket`] is no longer current.

use std::sync::atomic::{AtomicU64, Ordering};

use cartosift_core::{
    CenterCache, CenterResponse, Classifier, ElementsResponse, EntityRef, Feature, FetchError,
    FetchOptions, IdentifierError, JsonFetcher, TagClassifier, decode_body, resolve_elements,
};
use geo::Coord;
use log::debug;
use thiserror::Error;

use crate::endpoints::ServiceEndpoints;
use crate::error::EndpointError;

/// A resolved feature together with the identifier it was requested for.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// Identifier the resolution was started for.
    pub entity: EntityRef,
    /// The merged feature.
    pub feature: Feature,
}

/// Errors raised by [`FeatureResolver::resolve_feature`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The identifier cannot be resolved against the backing services.
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
    /// A service URL is misconfigured.
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    /// The primary fetch reported no such element.
    #[error("{entity} was not found or has been deleted")]
    NotFound {
        /// Requested identifier.
        entity: EntityRef,
    },
    /// Transport or service failure.
    #[error("failed to fetch {entity}: {source}")]
    Network {
        /// Requested identifier.
        entity: EntityRef,
        /// Underlying fetch failure.
        #[source]
        source: FetchError,
    },
    /// The request was superseded and aborted.
    #[error("request for {entity} was aborted: {source}")]
    Aborted {
        /// Requested identifier.
        entity: EntityRef,
        /// Underlying fetch failure.
        #[source]
        source: FetchError,
    },
    /// A response did not have the expected shape.
    #[error("malformed response for {entity}: {source}")]
    Decode {
        /// Requested identifier.
        entity: EntityRef,
        /// Underlying decode failure.
        #[source]
        source: FetchError,
    },
}

impl ResolveError {
    /// Report whether the element does not exist, as opposed to a failure
    /// to reach the service.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Map a failure of the primary fetch, where 404 and 410 mean the
    /// element does not exist.
    fn from_primary(entity: EntityRef, source: FetchError) -> Self {
        if source.is_gone() {
            Self::NotFound { entity }
        } else {
            Self::from_fetch(entity, source)
        }
    }

    /// Map any other fetch failure. The element is known to exist here, so
    /// even a 404 is a service failure.
    fn from_fetch(entity: EntityRef, source: FetchError) -> Self {
        match source {
            FetchError::Aborted { .. } => Self::Aborted { entity, source },
            FetchError::Decode { .. } => Self::Decode { entity, source },
            FetchError::Network { .. } | FetchError::Timeout { .. } | FetchError::Http { .. } => {
                Self::Network { entity, source }
            }
        }
    }
}

/// Orchestrates the primary fetch, geometry resolution and centre lookup.
///
/// # Examples
///
/// ```no_run
/// use cartosift_core::{CenterCache, EntityRef, JsonFetcher};
/// use cartosift_engine::FeatureResolver;
///
/// async fn show<F: JsonFetcher>(fetcher: F) -> Result<(), cartosift_engine::ResolveError> {
///     let resolver = FeatureResolver::new(fetcher, CenterCache::new());
///     let resolved = resolver.resolve_feature("w51050330".parse()?).await?;
///     assert_eq!(resolved.entity, EntityRef::way(51050330));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FeatureResolver<F, C = TagClassifier> {
    fetcher: F,
    cache: CenterCache,
    classifier: C,
    endpoints: ServiceEndpoints,
}

impl<F: JsonFetcher> FeatureResolver<F> {
    /// Create a resolver using the default classifier and public endpoints.
    pub fn new(fetcher: F, cache: CenterCache) -> Self {
        Self {
            fetcher,
            cache,
            classifier: TagClassifier,
            endpoints: ServiceEndpoints::default(),
        }
    }
}

impl<F, C> FeatureResolver<F, C>
where
    F: JsonFetcher,
    C: Classifier,
{
    /// Replace the classifier.
    pub fn with_classifier<D: Classifier>(self, classifier: D) -> FeatureResolver<F, D> {
        FeatureResolver {
            fetcher: self.fetcher,
            cache: self.cache,
            classifier,
            endpoints: self.endpoints,
        }
    }

    /// Replace the service endpoints.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: ServiceEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// The centre cache shared with this resolver.
    #[must_use]
    pub const fn cache(&self) -> &CenterCache {
        &self.cache
    }

    /// Record a centre learnt elsewhere, e.g. from a map click, so that a
    /// later resolution of `entity` skips the aggregate query.
    pub fn add_feature_center_to_cache(&self, entity: EntityRef, center: Coord<f64>) {
        self.cache.put(entity, center);
    }

    /// Resolve `entity` into a feature with geometry and, when obtainable, a
    /// centre.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotFound`] only when the primary fetch finds
    /// no such element, and the other variants for transport, decoding or
    /// configuration failures. A failed centre query is never `NotFound`.
    /// Nothing is cached when a fetch fails.
    pub async fn resolve_feature(&self, entity: EntityRef) -> Result<Resolved, ResolveError> {
        entity.to_aggregate_query_type()?;
        let url = self.endpoints.element_url(entity)?;
        let body = self
            .fetcher
            .fetch_json(url.as_str(), &FetchOptions::default())
            .await
            .map_err(|err| ResolveError::from_primary(entity, err))?;
        let response: ElementsResponse = decode_body(url.as_str(), body)
            .map_err(|err| ResolveError::from_primary(entity, err))?;

        let mut feature = resolve_elements(&response.elements, &self.classifier)
            .into_iter()
            .find(|feature| feature.entity == entity)
            .ok_or(ResolveError::NotFound { entity })?;

        if feature.center.is_none() {
            feature.center = match self.cache.get(entity) {
                Some(center) => {
                    debug!("centre of {entity} served from cache");
                    Some(center)
                }
                None => self.fetch_center(entity).await?,
            };
        }

        Ok(Resolved { entity, feature })
    }

    async fn fetch_center(&self, entity: EntityRef) -> Result<Option<Coord<f64>>, ResolveError> {
        let query = self.endpoints.center_query(entity)?;
        let url = self.endpoints.overpass_query_url(&query)?;
        debug!("querying centre of {entity}");
        let body = self
            .fetcher
            .fetch_json(url.as_str(), &FetchOptions::default())
            .await
            .map_err(|err| ResolveError::from_fetch(entity, err))?;
        let response: CenterResponse = decode_body(url.as_str(), body)
            .map_err(|err| ResolveError::from_fetch(entity, err))?;
        let center = response.first_center();
        match center {
            Some(coord) => self.cache.put(entity, coord),
            None => debug!("no centre reported for {entity}"),
        }
        Ok(center)
    }
}

/// Identifies one resolution started through a [`RequestTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    sequence: u64,
    entity: EntityRef,
}

impl RequestTicket {
    /// Identifier the request was started for.
    #[must_use]
    pub const fn entity(&self) -> EntityRef {
        self.entity
    }

    /// Position of the request in issue order, starting at 1.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Tracks the most recently requested feature for a single display slot.
///
/// # Examples
///
/// ```
/// use cartosift_core::EntityRef;
/// use cartosift_engine::RequestTracker;
///
/// let tracker = RequestTracker::new();
/// let first = tracker.begin(EntityRef::way(1));
/// let second = tracker.begin(EntityRef::way(2));
/// assert!(!tracker.is_current(&first));
/// assert!(tracker.is_current(&second));
/// ```
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: AtomicU64,
}

impl RequestTracker {
    /// Create a tracker with no request in flight.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latest: AtomicU64::new(0),
        }
    }

    /// Start a request for `entity`, superseding every earlier ticket.
    pub fn begin(&self, entity: EntityRef) -> RequestTicket {
        let sequence = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        RequestTicket { sequence, entity }
    }

    /// Report whether `ticket` belongs to the latest request.
    #[must_use]
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.sequence
    }

    /// Pass `resolved` through when `ticket` is still current and the result
    /// belongs to the ticket's identifier; drop it otherwise.
    #[must_use]
    pub fn accept(&self, ticket: RequestTicket, resolved: Resolved) -> Option<Resolved> {
        if self.is_current(&ticket) && resolved.entity == ticket.entity {
            Some(resolved)
        } else {
            debug!(
                "discarding stale result for {} (request {})",
                resolved.entity, ticket.sequence
            );
            None
        }
    }
}

#[cfg(test)]
mod tests;
