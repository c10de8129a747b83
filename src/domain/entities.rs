//! Domain entities mirrored from persistent storage.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::types::{ProductId, UserRef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub subcategory: String,
    pub stock: u32,
    pub likes_count: u32,
    /// Loaded only when the read asked for it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liked_by: Option<BTreeSet<UserRef>>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Caller-editable product attributes. Likes are never part of this set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFields {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub subcategory: String,
    pub stock: u32,
}

impl ProductRecord {
    /// Drops the `liked_by` projection, as listing and search reads return it.
    pub fn without_liked_by(mut self) -> Self {
        self.liked_by = None;
        self
    }
}
