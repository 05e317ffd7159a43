//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and bounded namespaces.

mod entry;
mod namespaces;
mod order;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use namespaces::{CacheNamespace, NamespaceStats, NamespacedCache};
pub use order::InsertionOrder;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
