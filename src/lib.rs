// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod crawl;
pub mod metrics;
pub mod middleware;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, router, AppState};
pub use crate::crawl::types::ArticleRecord;
pub use crate::store::NewsStore;
