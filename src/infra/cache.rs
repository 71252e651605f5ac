//! Cache backend bootstrap.

use std::sync::Arc;

use tracing::info;

use crate::cache::{CacheBackend, CacheStore, MemoryStore, RedisStore};
use crate::config::CacheSettings;

use super::error::InfraError;

/// Open the configured cache backend.
///
/// A Redis backend that cannot be reached at startup is an error; once running, cache
/// failures are absorbed or reported per request.
pub async fn connect_store(settings: &CacheSettings) -> Result<Arc<dyn CacheStore>, InfraError> {
    let store: Arc<dyn CacheStore> = match settings.backend {
        CacheBackend::Redis => Arc::new(RedisStore::connect(&settings.redis_url).await?),
        CacheBackend::Memory => {
            info!(
                target = "jester::infra::cache",
                capacity = settings.memory_capacity.get(),
                "Using in-process cache"
            );
            Arc::new(MemoryStore::new(settings.memory_capacity))
        }
    };

    store.ping().await?;
    Ok(store)
}
