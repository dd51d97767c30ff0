//! deskproxy library
//!
//! Exposes the cache, upstream clients, calendar resolver and HTTP router so
//! the binary and the integration tests share one implementation.

pub mod cache;
pub mod cli;
pub mod data;
pub mod readiness;
pub mod server;
