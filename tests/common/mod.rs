#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use catalog::application::catalog::CatalogService;
use catalog::application::repos::{
    CreateProductParams, LikeChangeOutcome, ListProductsParams, ProductQuery, ProductsRepo,
    ProductsWriteRepo, RepoError, UpdateProductParams,
};
use catalog::cache::{CacheConfig, CacheError, CacheStore, MemoryCache};
use catalog::domain::entities::{ProductFields, ProductRecord};
use catalog::domain::products::LikeChange;
use catalog::domain::types::ProductId;
use catalog::infra::memory::MemoryProductStore;

pub const LISTING_TTL: Duration = Duration::from_secs(300);

pub struct Harness {
    pub service: CatalogService,
    pub store: Arc<MemoryProductStore>,
    pub cache: Arc<CountingCache>,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryProductStore::new());
    let cache = Arc::new(CountingCache::new(MemoryCache::new(&CacheConfig::default())));
    let service = CatalogService::new(store.clone(), store.clone(), cache.clone(), LISTING_TTL);
    Harness {
        service,
        store,
        cache,
    }
}

pub fn service_with_cache(
    store: Arc<MemoryProductStore>,
    cache: Arc<dyn CacheStore>,
) -> CatalogService {
    CatalogService::new(store.clone(), store, cache, LISTING_TTL)
}

pub fn fields(name: &str, price: f64, category: &str) -> ProductFields {
    ProductFields {
        name: name.to_string(),
        description: format!("{name} description"),
        price,
        category: category.to_string(),
        subcategory: "General".to_string(),
        stock: 10,
    }
}

pub async fn seed(service: &CatalogService, count: usize) -> Vec<ProductRecord> {
    let mut created = Vec::with_capacity(count);
    for index in 0..count {
        let product = service
            .create(fields(&format!("product-{index}"), 10.0, "General"))
            .await
            .expect("seed product");
        created.push(product);
    }
    created
}

/// Memory cache that counts calls per operation.
pub struct CountingCache {
    inner: MemoryCache,
    gets: AtomicUsize,
    sets: AtomicUsize,
    deletes: AtomicUsize,
}

impl CountingCache {
    pub fn new(inner: MemoryCache) -> Self {
        Self {
            inner,
            gets: AtomicUsize::new(0),
            sets: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for CountingCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }
}

/// Cache whose every operation fails.
pub struct FailingCache;

#[async_trait]
impl CacheStore for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }
}

/// Product store that is always down.
pub struct UnavailableStore;

fn down() -> RepoError {
    RepoError::from_persistence("connection reset by peer")
}

#[async_trait]
impl ProductsRepo for UnavailableStore {
    async fn find_by_id(
        &self,
        _id: ProductId,
        _with_liked_by: bool,
    ) -> Result<Option<ProductRecord>, RepoError> {
        Err(down())
    }

    async fn list_products(
        &self,
        _params: ListProductsParams,
    ) -> Result<(Vec<ProductRecord>, u64), RepoError> {
        Err(down())
    }

    async fn query_products(
        &self,
        _query: &ProductQuery,
    ) -> Result<Vec<ProductRecord>, RepoError> {
        Err(down())
    }
}

#[async_trait]
impl ProductsWriteRepo for UnavailableStore {
    async fn create_product(
        &self,
        _params: CreateProductParams,
    ) -> Result<ProductRecord, RepoError> {
        Err(down())
    }

    async fn update_product(
        &self,
        _params: UpdateProductParams,
    ) -> Result<ProductRecord, RepoError> {
        Err(down())
    }

    async fn save_like_change(
        &self,
        _product_id: ProductId,
        _change: LikeChange,
    ) -> Result<LikeChangeOutcome, RepoError> {
        Err(down())
    }

    async fn delete_product(&self, _id: ProductId) -> Result<(), RepoError> {
        Err(down())
    }
}
