use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::cache::{CacheAside, CacheKey, CacheWriteError, Sourced};
use crate::domain::jokes::Joke;

#[derive(Debug, Error)]
pub enum JokeSourceError {
    #[error("joke upstream request failed: {0}")]
    Request(String),
    #[error("joke upstream responded with status {status}")]
    Status { status: u16 },
    #[error("joke upstream returned an unreadable body: {0}")]
    Decode(String),
}

/// Upstream that produces one joke per call.
#[async_trait]
pub trait JokeSource: Send + Sync {
    async fn fetch_one(&self) -> Result<Joke, JokeSourceError>;
}

#[derive(Debug, Error)]
pub enum JokeError {
    #[error("failed to get joke")]
    Origin(#[from] JokeSourceError),
    #[error(transparent)]
    CacheWrite(#[from] CacheWriteError),
}

/// Serves one shared joke, refreshed from upstream once the cached copy expires.
#[derive(Clone)]
pub struct JokeService {
    source: Arc<dyn JokeSource>,
    cache: CacheAside,
    ttl: std::time::Duration,
}

impl JokeService {
    pub fn new(source: Arc<dyn JokeSource>, cache: CacheAside, ttl: std::time::Duration) -> Self {
        Self { source, cache, ttl }
    }

    pub async fn get_joke(&self) -> Result<Sourced<Joke>, JokeError> {
        let source = &self.source;
        let joke = self
            .cache
            .read_through(CacheKey::RandomJoke, self.ttl, || async move {
                source.fetch_one().await.map(Some).map_err(JokeError::from)
            })
            .await?
            .ok_or_else(|| {
                JokeError::Origin(JokeSourceError::Decode(
                    "upstream produced no joke".to_string(),
                ))
            })?;

        info!(
            target = "jester::application::jokes",
            cached = joke.is_cached(),
            "Joke served"
        );
        Ok(joke)
    }
}
