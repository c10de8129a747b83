use serde::Deserialize;
use thiserror::Error;

use crate::application::repos::RepoError;
use crate::domain::error::DomainError;
use crate::domain::filters::ProductSort;
use crate::domain::types::{ProductId, SortDirection, SortField, UserId};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("product {id} not found")]
    NotFound { id: ProductId },
    #[error("user {user_id} has already liked product {product_id}")]
    AlreadyLiked {
        product_id: ProductId,
        user_id: UserId,
    },
    #[error("invalid product identifier `{0}`")]
    InvalidIdentifier(String),
    #[error("invalid sort: {0}")]
    InvalidSort(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("product store unavailable")]
    StoreUnavailable(#[source] RepoError),
}

impl CatalogError {
    pub(crate) fn store(err: RepoError) -> Self {
        Self::StoreUnavailable(err)
    }

    /// Maps a store failure for an operation addressing a single product.
    pub(crate) fn from_repo(err: RepoError, id: ProductId) -> Self {
        match err {
            RepoError::NotFound => Self::NotFound { id },
            other => Self::StoreUnavailable(other),
        }
    }

    /// True for failures caused by the request rather than the backend.
    pub fn is_client_error(&self) -> bool {
        match self {
            CatalogError::NotFound { .. }
            | CatalogError::AlreadyLiked { .. }
            | CatalogError::InvalidIdentifier(_)
            | CatalogError::InvalidSort(_)
            | CatalogError::Domain(DomainError::Validation { .. }) => true,
            CatalogError::Domain(DomainError::Invariant { .. })
            | CatalogError::StoreUnavailable(_) => false,
        }
    }
}

pub(crate) fn ensure_valid_id(id: ProductId) -> Result<ProductId, CatalogError> {
    if id <= 0 {
        return Err(CatalogError::InvalidIdentifier(id.to_string()));
    }
    Ok(id)
}

/// Parses a textual product id as received by a transport.
pub fn parse_product_id(raw: &str) -> Result<ProductId, CatalogError> {
    let id = raw
        .trim()
        .parse::<ProductId>()
        .map_err(|_| CatalogError::InvalidIdentifier(raw.to_string()))?;
    ensure_valid_id(id)
}

/// Search inputs as handed over by the request validator.
///
/// Numeric bounds stay textual here; [`crate::application::catalog::SearchFilter`]
/// coerces them and ignores values that are not usable numbers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub min_likes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SortParams {
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

impl SortParams {
    /// Resolves against the sortable-field whitelist, applying defaults
    /// (`createdAt`, `DESC`) for absent values.
    pub fn resolve(&self) -> Result<ProductSort, CatalogError> {
        let field = match self.sort_by.as_deref().map(str::trim) {
            None | Some("") => SortField::default(),
            Some(name) => name.parse::<SortField>().map_err(|_| {
                CatalogError::InvalidSort(format!("unsupported sort field `{name}`"))
            })?,
        };
        let direction = match self.order.as_deref().map(str::trim) {
            None | Some("") => SortDirection::default(),
            Some(order) => order.parse::<SortDirection>().map_err(|_| {
                CatalogError::InvalidSort(format!("unsupported sort order `{order}`"))
            })?,
        };
        Ok(ProductSort::new(field, direction))
    }
}
