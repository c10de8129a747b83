//! Offset pagination for catalog listings.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::domain::entities::ProductRecord;

/// A validated `(page, limit)` pair; both are one-based and positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub page: NonZeroU32,
    pub limit: NonZeroU32,
}

impl PageRequest {
    pub const DEFAULT_PAGE: NonZeroU32 = NonZeroU32::MIN;
    pub const DEFAULT_LIMIT: NonZeroU32 = match NonZeroU32::new(10) {
        Some(limit) => limit,
        None => NonZeroU32::MIN,
    };

    pub fn new(page: NonZeroU32, limit: NonZeroU32) -> Self {
        Self { page, limit }
    }

    /// Builds a request from raw integers, returning `None` if either is zero.
    pub fn from_raw(page: u32, limit: u32) -> Option<Self> {
        Some(Self::new(NonZeroU32::new(page)?, NonZeroU32::new(limit)?))
    }

    /// Number of products preceding this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.get() - 1) * u64::from(self.limit.get())
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PAGE, Self::DEFAULT_LIMIT)
    }
}

/// One page of the catalog listing. This is also the cached snapshot shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub items: Vec<ProductRecord>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl ProductPage {
    pub fn new(request: PageRequest, items: Vec<ProductRecord>, total: u64) -> Self {
        Self {
            items,
            total,
            page: request.page.get(),
            limit: request.limit.get(),
        }
    }
}
