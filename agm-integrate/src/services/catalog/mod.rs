//! Catalog resolution
//!
//! Maps an item key to its catalog instance identifier and decides whether the
//! catalog already holds enough statements for that item.
//!
//! # Strategies
//! - [`RemoteCatalog`]: queries the collection site; reports instance ID and
//!   the number of existing statements
//! - [`FallbackTable`]: local `id,instanceID` file loaded once at startup;
//!   carries no statement count
//!
//! [`CatalogResolver`] probes the remote once and picks a strategy by
//! availability. With the remote selected, a failed or empty remote lookup is
//! answered from the fallback table for that key.
//!
//! Fallback answers never report existing metadata, so items that are already
//! well described in the catalog are treated as new whenever the remote
//! service cannot be used. Operators should read the fallback count in the run
//! summary with that in mind.

mod fallback;
mod remote;

pub use fallback::FallbackTable;
pub use remote::{parse_items_response, RemoteCatalog};

use async_trait::async_trait;
use thiserror::Error;

/// Remote catalog client errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Reference data for one catalogued item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogMapping {
    pub id: String,
    pub instance_id: String,
    /// Statements already attached to the instance (0 when unknown)
    pub existing_entity_count: usize,
}

/// Outcome of a single lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(CatalogMapping),
    NotFound,
}

/// A source of key → instance mappings
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Source identifier for logging
    fn source_id(&self) -> &'static str;

    /// Look up one item key
    async fn lookup(&self, key: &str) -> Result<Lookup, CatalogError>;

    /// Whether the source can currently answer lookups
    async fn probe(&self) -> bool {
        true
    }
}

/// Where a resolution came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOrigin {
    Remote,
    Fallback,
    Unmapped,
}

/// Resolved catalog fields for one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub instance_id: Option<String>,
    pub has_existing_metadata: bool,
    pub origin: ResolutionOrigin,
}

impl Resolution {
    fn unmapped() -> Self {
        Self {
            instance_id: None,
            has_existing_metadata: false,
            origin: ResolutionOrigin::Unmapped,
        }
    }
}

/// Resolution counters for the run summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    pub remote_resolutions: usize,
    pub fallback_resolutions: usize,
    pub remote_failures: usize,
    pub unmapped_keys: usize,
}

/// Catalog Resolver
///
/// Holds up to two [`CatalogSource`]s: the remote service (present only when
/// its probe succeeded) and the fallback table. Both are queried through
/// [`CatalogSource::lookup`].
pub struct CatalogResolver {
    remote: Option<Box<dyn CatalogSource>>,
    fallback: Box<dyn CatalogSource>,
    threshold: usize,
    stats: ResolverStats,
}

impl CatalogResolver {
    /// Resolver that never contacts a remote service
    pub fn fallback_only(fallback: impl CatalogSource + 'static, threshold: usize) -> Self {
        Self {
            remote: None,
            fallback: Box::new(fallback),
            threshold,
            stats: ResolverStats::default(),
        }
    }

    /// Probe `remote` and select the strategy for this run
    pub async fn select(
        remote: Box<dyn CatalogSource>,
        fallback: impl CatalogSource + 'static,
        threshold: usize,
    ) -> Self {
        let mut resolver = Self::fallback_only(fallback, threshold);
        if remote.probe().await {
            tracing::info!(source = remote.source_id(), "Catalog service available");
            resolver.remote = Some(remote);
        } else {
            tracing::warn!(
                source = remote.source_id(),
                fallback = resolver.fallback.source_id(),
                "Catalog service unavailable, resolving from fallback only \
                 (existing-metadata status cannot be determined)"
            );
        }
        resolver
    }

    /// True when the remote strategy was selected
    pub fn uses_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn stats(&self) -> ResolverStats {
        self.stats
    }

    /// Resolve one item key
    ///
    /// **Algorithm:**
    /// 1. Remote strategy: look the key up remotely; a hit sets
    ///    `has_existing_metadata` when the statement count reaches the threshold
    /// 2. Remote error or miss, or fallback-only strategy: look the key up in
    ///    the fallback source (`has_existing_metadata` is always false)
    /// 3. Neither knows the key: no instance ID, record still emitted
    pub async fn resolve(&mut self, key: &str) -> Resolution {
        if let Some(remote) = &self.remote {
            match remote.lookup(key).await {
                Ok(Lookup::Found(mapping)) => {
                    self.stats.remote_resolutions += 1;
                    let has_existing_metadata = mapping.existing_entity_count >= self.threshold;
                    tracing::debug!(
                        key = %key,
                        instance_id = %mapping.instance_id,
                        statements = mapping.existing_entity_count,
                        has_existing_metadata,
                        "Resolved from catalog service"
                    );
                    return Resolution {
                        instance_id: Some(mapping.instance_id),
                        has_existing_metadata,
                        origin: ResolutionOrigin::Remote,
                    };
                }
                Ok(Lookup::NotFound) => {
                    tracing::debug!(key = %key, "Key not found in catalog service");
                }
                Err(e) => {
                    self.stats.remote_failures += 1;
                    if self.stats.remote_failures == 1 {
                        tracing::warn!(
                            key = %key,
                            error = %e,
                            "Catalog lookup failed, using fallback"
                        );
                    } else {
                        tracing::debug!(key = %key, error = %e, "Catalog lookup failed");
                    }
                }
            }
        }

        match self.fallback.lookup(key).await {
            Ok(Lookup::Found(mapping)) => {
                self.stats.fallback_resolutions += 1;
                Resolution {
                    instance_id: Some(mapping.instance_id),
                    has_existing_metadata: false,
                    origin: ResolutionOrigin::Fallback,
                }
            }
            Ok(Lookup::NotFound) => {
                self.stats.unmapped_keys += 1;
                tracing::warn!(key = %key, "No instanceID found for key");
                Resolution::unmapped()
            }
            Err(e) => {
                self.stats.unmapped_keys += 1;
                tracing::warn!(
                    key = %key,
                    source = self.fallback.source_id(),
                    error = %e,
                    "Fallback lookup failed, key left unmapped"
                );
                Resolution::unmapped()
            }
        }
    }
}
