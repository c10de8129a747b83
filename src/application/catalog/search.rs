use tracing::{debug, instrument};

use crate::application::repos::ProductQuery;
use crate::domain::entities::ProductRecord;
use crate::domain::filters::{NumericField, ProductPredicate, TextField};

use super::service::CatalogService;
use super::types::{CatalogError, SearchParams, SortParams};

/// Search constraints after coercion. Absent fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    pub q: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_likes: Option<f64>,
}

impl SearchFilter {
    /// Coerces raw search parameters.
    ///
    /// Empty strings count as absent. Numeric values that do not parse, are
    /// not finite or are negative are dropped rather than rejected.
    pub fn from_params(params: &SearchParams) -> Self {
        Self {
            q: non_empty(params.q.as_deref()),
            category: non_empty(params.category.as_deref()),
            subcategory: non_empty(params.subcategory.as_deref()),
            min_price: coerce_bound("minPrice", params.min_price.as_deref()),
            max_price: coerce_bound("maxPrice", params.max_price.as_deref()),
            min_likes: coerce_bound("minLikes", params.min_likes.as_deref()),
        }
    }

    pub fn predicates(&self) -> Vec<ProductPredicate> {
        let mut predicates = Vec::new();

        if let Some(q) = self.q.as_ref() {
            predicates.push(ProductPredicate::Contains {
                field: TextField::Name,
                needle: q.clone(),
            });
        }
        if let Some(category) = self.category.as_ref() {
            predicates.push(ProductPredicate::Equals {
                field: TextField::Category,
                value: category.clone(),
            });
        }
        if let Some(subcategory) = self.subcategory.as_ref() {
            predicates.push(ProductPredicate::Equals {
                field: TextField::Subcategory,
                value: subcategory.clone(),
            });
        }
        if self.min_price.is_some() || self.max_price.is_some() {
            predicates.push(ProductPredicate::Range {
                field: NumericField::Price,
                min: self.min_price,
                max: self.max_price,
            });
        }
        if let Some(min_likes) = self.min_likes {
            predicates.push(ProductPredicate::Range {
                field: NumericField::LikesCount,
                min: Some(min_likes),
                max: None,
            });
        }

        predicates
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|value| !value.is_empty()).map(str::to_string)
}

fn coerce_bound(name: &'static str, raw: Option<&str>) -> Option<f64> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty())?;
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Some(value),
        _ => {
            debug!(filter = name, value = raw, "ignoring unusable numeric filter");
            None
        }
    }
}

impl CatalogService {
    /// Returns every product matching all present filters, in the requested order.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        params: &SearchParams,
        sort: &SortParams,
    ) -> Result<Vec<ProductRecord>, CatalogError> {
        let sort = sort.resolve()?;
        let query = ProductQuery {
            predicates: SearchFilter::from_params(params).predicates(),
            sort,
        };

        let products = self
            .reader
            .query_products(&query)
            .await
            .map_err(CatalogError::store)?;

        debug!(matches = products.len(), "search completed");
        Ok(products
            .into_iter()
            .map(ProductRecord::without_liked_by)
            .collect())
    }
}
