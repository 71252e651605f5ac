//! Cache-aside access shared by the joke and user services.
//!
//! Reads consult the cache first and fall back to the origin on a miss, storing what the origin
//! returned. Mutations are applied to the origin by the caller; only then does it [`commit`] or
//! [`evict`] the affected keys.
//!
//! [`commit`]: CacheAside::commit
//! [`evict`]: CacheAside::evict

use std::future::Future;
use std::time::Duration;

use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::client::{CacheClient, CacheWriteError};
use super::keys::CacheKey;

pub(crate) const METRIC_CACHE_HIT: &str = "jester_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "jester_cache_miss_total";

/// Where a returned value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Origin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub source: Source,
    pub value: T,
}

impl<T> Sourced<T> {
    pub fn is_cached(&self) -> bool {
        self.source == Source::Cache
    }
}

#[derive(Clone)]
pub struct CacheAside {
    client: CacheClient,
}

impl CacheAside {
    pub fn new(client: CacheClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &CacheClient {
        &self.client
    }

    /// Serve `key` from cache, or call `fetch` and cache its result for `ttl`.
    ///
    /// Hits do not refresh the TTL. An origin result of `None` is returned as-is and never
    /// cached, so the next read asks the origin again.
    pub async fn read_through<T, E, F, Fut>(
        &self,
        key: CacheKey,
        ttl: Duration,
        fetch: F,
    ) -> Result<Option<Sourced<T>>, E>
    where
        T: Serialize + DeserializeOwned + Sync,
        E: From<CacheWriteError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let rendered = key.to_string();

        if let Some(value) = self.client.get::<T>(&rendered).await {
            counter!(METRIC_CACHE_HIT, "resource" => key.resource()).increment(1);
            debug!(target = "jester::cache::aside", key = %rendered, "Cache hit");
            return Ok(Some(Sourced {
                source: Source::Cache,
                value,
            }));
        }

        counter!(METRIC_CACHE_MISS, "resource" => key.resource()).increment(1);
        debug!(target = "jester::cache::aside", key = %rendered, "Cache miss");

        let Some(value) = fetch().await? else {
            return Ok(None);
        };

        self.client.set(&rendered, &value, Some(ttl)).await?;

        Ok(Some(Sourced {
            source: Source::Origin,
            value,
        }))
    }

    /// Overwrite `key` after the origin accepted a mutation.
    pub async fn commit<T>(&self, key: CacheKey, value: &T, ttl: Duration) -> Result<(), CacheWriteError>
    where
        T: Serialize + Sync,
    {
        let rendered = key.to_string();
        self.client.set(&rendered, value, Some(ttl)).await?;
        debug!(target = "jester::cache::aside", key = %rendered, ttl_secs = ttl.as_secs(), "Cache entry committed");
        Ok(())
    }

    /// Drop `key` after the origin removed or changed what it described.
    pub async fn evict(&self, key: CacheKey) -> Result<bool, CacheWriteError> {
        let rendered = key.to_string();
        let existed = self.client.del(&rendered).await?;
        debug!(target = "jester::cache::aside", key = %rendered, existed, "Cache entry evicted");
        Ok(existed)
    }
}
