// Service exports
pub mod cache;
pub mod store;

pub use cache::{CacheManager, CacheKey, CacheError, CacheStats};
pub use store::{DocumentStoreClient, StoreError};
