//! Cache key definitions.
//!
//! Listing pages are namespaced by a generation token held under a single
//! umbrella key. Deleting the umbrella key orphans every cached page at once;
//! the orphans age out through their TTL.

use std::fmt;
use std::time::Duration;

use crate::application::pagination::PageRequest;

/// Lifetime of the generation token. Expiry only costs a cold listing cache.
pub const LISTING_GENERATION_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Umbrella key holding the current listing generation.
    ListingGeneration,
    /// One `(page, limit)` listing snapshot within a generation.
    ListingPage {
        generation: String,
        page: u32,
        limit: u32,
    },
}

impl CacheKey {
    pub fn listing_page(generation: &str, request: PageRequest) -> Self {
        Self::ListingPage {
            generation: generation.to_string(),
            page: request.page.get(),
            limit: request.limit.get(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::ListingGeneration => f.write_str("catalog:products:generation"),
            CacheKey::ListingPage {
                generation,
                page,
                limit,
            } => write!(f, "catalog:products:{generation}:{page}:{limit}"),
        }
    }
}
