use metrics::counter;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::application::pagination::{PageRequest, ProductPage};
use crate::application::repos::ListProductsParams;
use crate::cache::{CacheKey, LISTING_GENERATION_TTL};
use crate::domain::entities::ProductRecord;
use crate::domain::filters::ProductSort;

use super::service::{
    CatalogService, METRIC_CACHE_ERROR_TOTAL, METRIC_CACHE_HIT_TOTAL, METRIC_CACHE_MISS_TOTAL,
};
use super::types::CatalogError;

impl CatalogService {
    /// Returns one page of products, newest first, through the listing cache.
    #[instrument(skip(self), fields(page = request.page.get(), limit = request.limit.get()))]
    pub async fn list(&self, request: PageRequest) -> Result<ProductPage, CatalogError> {
        let key = self
            .listing_generation()
            .await
            .map(|generation| CacheKey::listing_page(&generation, request).to_string());

        if let Some(key) = key.as_deref()
            && let Some(page) = self.cached_page(key).await
        {
            counter!(METRIC_CACHE_HIT_TOTAL).increment(1);
            debug!(total = page.total, "listing served from cache");
            return Ok(page);
        }
        counter!(METRIC_CACHE_MISS_TOTAL).increment(1);

        let (items, total) = self
            .reader
            .list_products(ListProductsParams {
                offset: request.offset(),
                limit: request.limit.get(),
                sort: ProductSort::newest_first(),
            })
            .await
            .map_err(CatalogError::store)?;

        let items = items
            .into_iter()
            .map(ProductRecord::without_liked_by)
            .collect();
        let page = ProductPage::new(request, items, total);

        if let Some(key) = key.as_deref() {
            self.store_page(key, &page).await;
        }

        Ok(page)
    }

    /// Reads the current listing generation, minting one when absent.
    ///
    /// Returns `None` when the cache cannot be used, which disables caching
    /// for this call.
    async fn listing_generation(&self) -> Option<String> {
        let key = CacheKey::ListingGeneration.to_string();
        match self.cache.get(&key).await {
            Ok(Some(generation)) => Some(generation),
            Ok(None) => {
                let generation = Uuid::new_v4().simple().to_string();
                match self
                    .cache
                    .set(&key, generation.clone(), LISTING_GENERATION_TTL)
                    .await
                {
                    Ok(()) => Some(generation),
                    Err(err) => {
                        counter!(METRIC_CACHE_ERROR_TOTAL).increment(1);
                        warn!(error = %err, "failed to publish listing generation");
                        None
                    }
                }
            }
            Err(err) => {
                counter!(METRIC_CACHE_ERROR_TOTAL).increment(1);
                warn!(error = %err, "listing generation lookup failed; reading from store");
                None
            }
        }
    }

    async fn cached_page(&self, key: &str) -> Option<ProductPage> {
        let raw = match self.cache.get(key).await {
            Ok(raw) => raw?,
            Err(err) => {
                counter!(METRIC_CACHE_ERROR_TOTAL).increment(1);
                warn!(key, error = %err, "listing cache read failed; reading from store");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(page) => Some(page),
            Err(err) => {
                warn!(key, error = %err, "discarding unreadable listing snapshot");
                None
            }
        }
    }

    async fn store_page(&self, key: &str, page: &ProductPage) {
        let raw = match serde_json::to_string(page) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key, error = %err, "failed to serialize listing snapshot");
                return;
            }
        };

        if let Err(err) = self.cache.set(key, raw, self.listing_ttl).await {
            counter!(METRIC_CACHE_ERROR_TOTAL).increment(1);
            warn!(key, error = %err, "failed to cache listing snapshot");
        }
    }
}
