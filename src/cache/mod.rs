//! Cache module for holding upstream responses in memory
//!
//! This module provides a keyed TTL cache. Each resource class (calendar week
//! files, quote symbol sets, the headline feed) owns its own `CacheManager`
//! and passes its own TTL, so expiry policies stay independent.

mod manager;

pub use manager::{CacheManager, CachedData};
