//! In-process product store.
//!
//! Backs the catalog in tests and in environments without Postgres. Every
//! mutation runs under one write lock, which gives the same per-product
//! serialization as the row lock taken by the Postgres adapter.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{
    CreateProductParams, LikeChangeOutcome, ListProductsParams, ProductQuery, ProductsRepo,
    ProductsWriteRepo, RepoError, UpdateProductParams,
};
use crate::domain::entities::ProductRecord;
use crate::domain::products::LikeChange;
use crate::domain::types::ProductId;
use crate::util::lock::{rw_read, rw_write};

const SOURCE: &str = "infra::memory";

#[derive(Default)]
struct State {
    products: BTreeMap<ProductId, ProductRecord>,
    last_id: ProductId,
}

#[derive(Default)]
pub struct MemoryProductStore {
    state: RwLock<State>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        rw_read(&self.state, SOURCE, "len").products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn projected(product: &ProductRecord, with_liked_by: bool) -> ProductRecord {
    if with_liked_by {
        product.clone()
    } else {
        product.clone().without_liked_by()
    }
}

#[async_trait]
impl ProductsRepo for MemoryProductStore {
    async fn find_by_id(
        &self,
        id: ProductId,
        with_liked_by: bool,
    ) -> Result<Option<ProductRecord>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "find_by_id");
        Ok(state
            .products
            .get(&id)
            .map(|product| projected(product, with_liked_by)))
    }

    async fn list_products(
        &self,
        params: ListProductsParams,
    ) -> Result<(Vec<ProductRecord>, u64), RepoError> {
        let offset = usize::try_from(params.offset).map_err(|_| RepoError::InvalidInput {
            message: format!("offset {} exceeds supported range", params.offset),
        })?;
        let limit = usize::try_from(params.limit).map_err(|_| RepoError::InvalidInput {
            message: format!("limit {} exceeds supported range", params.limit),
        })?;

        let state = rw_read(&self.state, SOURCE, "list_products");
        let mut ordered: Vec<&ProductRecord> = state.products.values().collect();
        ordered.sort_by(|left, right| params.sort.compare(left, right));

        let items = ordered
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|product| projected(product, false))
            .collect();
        Ok((items, state.products.len() as u64))
    }

    async fn query_products(&self, query: &ProductQuery) -> Result<Vec<ProductRecord>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "query_products");
        let mut matched: Vec<&ProductRecord> = state
            .products
            .values()
            .filter(|product| {
                query
                    .predicates
                    .iter()
                    .all(|predicate| predicate.matches(product))
            })
            .collect();
        matched.sort_by(|left, right| query.sort.compare(left, right));

        Ok(matched
            .into_iter()
            .map(|product| projected(product, false))
            .collect())
    }
}

#[async_trait]
impl ProductsWriteRepo for MemoryProductStore {
    async fn create_product(
        &self,
        params: CreateProductParams,
    ) -> Result<ProductRecord, RepoError> {
        let CreateProductParams { fields } = params;
        let now = OffsetDateTime::now_utc();

        let mut state = rw_write(&self.state, SOURCE, "create_product");
        let id = state
            .last_id
            .checked_add(1)
            .ok_or_else(|| RepoError::from_persistence("product id space exhausted"))?;
        state.last_id = id;

        let product = ProductRecord {
            id,
            name: fields.name,
            description: fields.description,
            price: fields.price,
            category: fields.category,
            subcategory: fields.subcategory,
            stock: fields.stock,
            likes_count: 0,
            liked_by: Some(BTreeSet::new()),
            created_at: now,
            updated_at: now,
        };
        state.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        params: UpdateProductParams,
    ) -> Result<ProductRecord, RepoError> {
        let UpdateProductParams { id, fields } = params;

        let mut state = rw_write(&self.state, SOURCE, "update_product");
        let product = state.products.get_mut(&id).ok_or(RepoError::NotFound)?;
        product.name = fields.name;
        product.description = fields.description;
        product.price = fields.price;
        product.category = fields.category;
        product.subcategory = fields.subcategory;
        product.stock = fields.stock;
        product.updated_at = OffsetDateTime::now_utc();
        Ok(product.clone())
    }

    async fn save_like_change(
        &self,
        product_id: ProductId,
        change: LikeChange,
    ) -> Result<LikeChangeOutcome, RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "save_like_change");
        let mut product = state
            .products
            .get(&product_id)
            .cloned()
            .ok_or(RepoError::NotFound)?;

        // Committed only once the changed record passes the likes invariant.
        let applied = product.apply_like_change(change, OffsetDateTime::now_utc());
        product
            .ensure_likes_consistent()
            .map_err(|err| RepoError::integrity(err.to_string()))?;

        if applied {
            state.products.insert(product_id, product.clone());
        }
        Ok(LikeChangeOutcome { product, applied })
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "delete_product");
        state
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}
