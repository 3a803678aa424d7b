//! Checksum caching with explicit invalidation.
//!
//! This module provides:
//! - The key/value store contract and an in-memory TTL store ([`CacheStore`], [`MemoryCacheStore`])
//! - The reverse dependency index used for fan-out ([`DependencyIndex`], [`DeviceDependencies`])
//! - The cache itself, with per-device single-flight renders ([`ChecksumCache`], [`DocumentSource`])
//! - Error handling ([`CacheError`], [`StoreError`])

mod checksum;
mod error;
mod index;
mod store;

#[cfg(test)]
mod checksum_tests;
#[cfg(test)]
mod store_tests;

pub use checksum::{ChecksumCache, DocumentSource, cache_key, checksum};
pub use error::{CacheError, StoreError};
pub use index::{DependencyIndex, DeviceDependencies};
pub use store::{CacheStore, MemoryCacheStore};
