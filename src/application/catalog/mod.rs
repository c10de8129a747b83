//! Catalog read/write engine: cache-aside listings, whitelisted search and the
//! like/unlike protocol.

mod commands;
mod likes;
mod listing;
mod search;
mod service;
mod types;

pub use search::SearchFilter;
pub use service::CatalogService;
pub use types::{CatalogError, SearchParams, SortParams, parse_product_id};
