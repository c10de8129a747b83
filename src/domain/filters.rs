//! Typed search predicates and orderings over product fields.
//!
//! Stores translate these through their own field mapping table; no caller
//! supplied text is ever used as a field or column name.

use std::cmp::Ordering;

use crate::domain::entities::ProductRecord;
use crate::domain::types::{SortDirection, SortField};

/// Text-valued product fields usable in predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    Name,
    Category,
    Subcategory,
}

impl TextField {
    fn value(self, product: &ProductRecord) -> &str {
        match self {
            TextField::Name => &product.name,
            TextField::Category => &product.category,
            TextField::Subcategory => &product.subcategory,
        }
    }
}

/// Numeric product fields usable in range predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    Price,
    LikesCount,
}

impl NumericField {
    fn value(self, product: &ProductRecord) -> f64 {
        match self {
            NumericField::Price => product.price,
            NumericField::LikesCount => f64::from(product.likes_count),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProductPredicate {
    /// Exact match.
    Equals { field: TextField, value: String },
    /// Literal, case-sensitive substring match.
    Contains { field: TextField, needle: String },
    /// Inclusive bounds; an absent bound is unconstrained.
    Range {
        field: NumericField,
        min: Option<f64>,
        max: Option<f64>,
    },
}

impl ProductPredicate {
    pub fn matches(&self, product: &ProductRecord) -> bool {
        match self {
            ProductPredicate::Equals { field, value } => field.value(product) == value,
            ProductPredicate::Contains { field, needle } => {
                field.value(product).contains(needle.as_str())
            }
            ProductPredicate::Range { field, min, max } => {
                let value = field.value(product);
                min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
            }
        }
    }
}

/// Single-field ordering; ties fall back to `id` in the same direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ProductSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl ProductSort {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Listing order: newest first, highest id first among equal timestamps.
    pub fn newest_first() -> Self {
        Self::new(SortField::CreatedAt, SortDirection::Desc)
    }

    pub fn compare(&self, left: &ProductRecord, right: &ProductRecord) -> Ordering {
        let ordering = compare_field(self.field, left, right).then(left.id.cmp(&right.id));
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

fn compare_field(field: SortField, left: &ProductRecord, right: &ProductRecord) -> Ordering {
    match field {
        SortField::Id => left.id.cmp(&right.id),
        SortField::Name => left.name.cmp(&right.name),
        SortField::Description => left.description.cmp(&right.description),
        SortField::Price => left.price.total_cmp(&right.price),
        SortField::Category => left.category.cmp(&right.category),
        SortField::Subcategory => left.subcategory.cmp(&right.subcategory),
        SortField::Stock => left.stock.cmp(&right.stock),
        SortField::LikesCount => left.likes_count.cmp(&right.likes_count),
        SortField::CreatedAt => left.created_at.cmp(&right.created_at),
        SortField::UpdatedAt => left.updated_at.cmp(&right.updated_at),
    }
}
