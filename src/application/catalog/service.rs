use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::{debug, warn};

use crate::application::repos::{ProductsRepo, ProductsWriteRepo};
use crate::cache::{CacheKey, CacheStore};
use crate::domain::entities::ProductRecord;
use crate::domain::types::ProductId;

use super::types::{CatalogError, ensure_valid_id};

pub(crate) const METRIC_CACHE_HIT_TOTAL: &str = "catalog_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS_TOTAL: &str = "catalog_cache_miss_total";
pub(crate) const METRIC_CACHE_ERROR_TOTAL: &str = "catalog_cache_error_total";
const METRIC_CACHE_INVALIDATION_FAILURE_TOTAL: &str = "catalog_cache_invalidation_failure_total";

/// Orchestrates the product store and the listing cache.
///
/// Store failures abort the operation and propagate. Cache failures never do:
/// reads degrade to the store and failed invalidations are logged.
#[derive(Clone)]
pub struct CatalogService {
    pub(crate) reader: Arc<dyn ProductsRepo>,
    pub(crate) writer: Arc<dyn ProductsWriteRepo>,
    pub(crate) cache: Arc<dyn CacheStore>,
    pub(crate) listing_ttl: Duration,
}

impl CatalogService {
    pub fn new(
        reader: Arc<dyn ProductsRepo>,
        writer: Arc<dyn ProductsWriteRepo>,
        cache: Arc<dyn CacheStore>,
        listing_ttl: Duration,
    ) -> Self {
        Self {
            reader,
            writer,
            cache,
            listing_ttl,
        }
    }

    /// Loads one product with its `liked_by` set. Point reads bypass the cache.
    pub async fn get(&self, id: ProductId) -> Result<ProductRecord, CatalogError> {
        self.load_product(id).await
    }

    pub(crate) async fn load_product(&self, id: ProductId) -> Result<ProductRecord, CatalogError> {
        let id = ensure_valid_id(id)?;
        self.reader
            .find_by_id(id, true)
            .await
            .map_err(|err| CatalogError::from_repo(err, id))?
            .ok_or(CatalogError::NotFound { id })
    }

    /// Makes every cached listing page unreachable.
    ///
    /// Runs after a committed store write, so a failure here is logged and
    /// swallowed; affected pages go stale until their TTL runs out.
    pub(crate) async fn invalidate_listing(&self, reason: &'static str) {
        let key = CacheKey::ListingGeneration.to_string();
        match self.cache.delete(&key).await {
            Ok(()) => debug!(reason, "listing cache invalidated"),
            Err(err) => {
                counter!(METRIC_CACHE_INVALIDATION_FAILURE_TOTAL).increment(1);
                warn!(
                    reason,
                    error = %err,
                    ttl_secs = self.listing_ttl.as_secs(),
                    "listing cache invalidation failed; cached pages expire with their TTL"
                );
            }
        }
    }
}
