//! Cache backends for resolved records.
//!
//! Available backends:
//! - `MemoryCache` - bounded LRU with a fixed TTL (always available)

pub mod memory;

pub use memory::MemoryCache;
