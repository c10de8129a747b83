//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{ProductFields, ProductRecord};
use crate::domain::filters::{ProductPredicate, ProductSort};
use crate::domain::products::LikeChange;
use crate::domain::types::ProductId;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateProductParams {
    pub fields: ProductFields,
}

#[derive(Debug, Clone)]
pub struct UpdateProductParams {
    pub id: ProductId,
    pub fields: ProductFields,
}

#[derive(Debug, Clone, Copy)]
pub struct ListProductsParams {
    pub offset: u64,
    pub limit: u32,
    pub sort: ProductSort,
}

#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Conjunction; an empty list matches every product.
    pub predicates: Vec<ProductPredicate>,
    pub sort: ProductSort,
}

/// Result of persisting a [`LikeChange`].
#[derive(Debug, Clone)]
pub struct LikeChangeOutcome {
    /// The product after the change, with `liked_by` loaded.
    pub product: ProductRecord,
    /// False when the membership already matched the requested state.
    pub applied: bool,
}

#[async_trait]
pub trait ProductsRepo: Send + Sync {
    async fn find_by_id(
        &self,
        id: ProductId,
        with_liked_by: bool,
    ) -> Result<Option<ProductRecord>, RepoError>;

    /// Returns one ordered slice together with the total number of products.
    async fn list_products(
        &self,
        params: ListProductsParams,
    ) -> Result<(Vec<ProductRecord>, u64), RepoError>;

    async fn query_products(&self, query: &ProductQuery) -> Result<Vec<ProductRecord>, RepoError>;
}

#[async_trait]
pub trait ProductsWriteRepo: Send + Sync {
    async fn create_product(&self, params: CreateProductParams)
    -> Result<ProductRecord, RepoError>;

    /// Overwrites the caller-editable fields; likes are left untouched.
    async fn update_product(&self, params: UpdateProductParams)
    -> Result<ProductRecord, RepoError>;

    /// Applies a single membership change and the matching count arithmetic as
    /// one atomic step, serialized per product.
    async fn save_like_change(
        &self,
        product_id: ProductId,
        change: LikeChange,
    ) -> Result<LikeChangeOutcome, RepoError>;

    async fn delete_product(&self, id: ProductId) -> Result<(), RepoError>;
}
