// Service exports
pub mod cache;
pub mod events;
pub mod memory;
pub mod postgres;
pub mod store;

pub use cache::{CacheError, CacheKey, CacheManager, CacheStats, CachedExclusions};
pub use events::{BlockEvent, BlockService};
pub use memory::InMemoryStore;
pub use postgres::PostgresClient;
pub use store::{AttributeStore, BlockStore, ExclusionResolver, StoreError};
