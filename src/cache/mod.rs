//! Catalog cache.
//!
//! The catalog only talks to a [`CacheStore`]: a string key/value store with a
//! per-entry TTL. Entries are advisory; a miss or a failing backend only costs
//! a store read.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! capacity = 1024
//! listing_ttl_seconds = 300
//! ```

mod config;
mod keys;
mod memory;
mod store;

pub use config::CacheConfig;
pub use keys::{CacheKey, LISTING_GENERATION_TTL};
pub use memory::MemoryCache;
pub use store::{CacheError, CacheStore, DisabledCache};

use std::sync::Arc;

/// Builds the cache backend selected by `config`.
pub fn build_cache(config: &CacheConfig) -> Arc<dyn CacheStore> {
    if config.enabled {
        Arc::new(MemoryCache::new(config))
    } else {
        Arc::new(DisabledCache)
    }
}
