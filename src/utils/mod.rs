//! # Utility Modules
//!
//! Supporting utilities around packet assembly.
//!
//! ## Components
//! - **Buffer Pool**: reuse of packet buffers across short-lived assemblies
//! - **Cache**: pull-or-create lookup contract for event glue, TTL memory cache
//! - **Logging**: Structured logging configuration
//! - **Metrics**: Thread-safe observability counters

pub mod buffer_pool;
pub mod cache;
pub mod logging;
pub mod metrics;

// Re-export public types for advanced users
pub use buffer_pool::{BufferPool, PooledBuffer};
pub use cache::{pull_or_create, Fetched, MemoryCache, Part, PartCache};
