//! Key-value cache used in front of the users store and the joke upstream.
//!
//! - [`CacheStore`] is the raw seam, implemented by [`RedisStore`] and [`MemoryStore`].
//! - [`CacheClient`] adds JSON (de)serialization and the fail-open read / fail-loud write split.
//! - [`CacheAside`] is the read-through, commit and evict policy the services share.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! backend = "redis"          # or "memory"
//! redis_url = "redis://127.0.0.1:6379"
//! collection_policy = "expire_only"
//! user_update_ttl_seconds = 3600
//! ```

mod aside;
mod client;
mod config;
mod keys;
mod lock;
mod memory;
mod redis_store;
mod store;

pub use aside::{CacheAside, Source, Sourced};
pub use client::{CacheClient, CacheWriteError};
pub use config::{CacheBackend, CacheTtls, CollectionPolicy};
pub use keys::CacheKey;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use store::{CacheError, CacheStore, KeyTtl};

pub(crate) use aside::{METRIC_CACHE_HIT, METRIC_CACHE_MISS};
pub(crate) use client::{METRIC_CACHE_READ_DEGRADED, METRIC_CACHE_WRITE_ERROR};
