//! Raw store seam shared by the Redis and in-process backends.
//!
//! Values cross this boundary as text; typing and the fail-open/fail-loud split live in
//! [`super::client::CacheClient`].

use std::collections::HashMap;
use std::fmt::Display;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache transport error: {0}")]
    Transport(String),
    #[error("key `{key}` holds the wrong kind of value")]
    WrongType { key: String },
    #[error("failed to serialize cache value: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to deserialize cache value: {0}")]
    Deserialize(#[source] serde_json::Error),
    #[error("expiry of {ttl:?} for `{key}` is out of range")]
    TtlOutOfRange { key: String, ttl: Duration },
}

impl CacheError {
    pub fn transport(err: impl Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn wrong_type(key: &str) -> Self {
        Self::WrongType {
            key: key.to_string(),
        }
    }
}

/// Remaining lifetime of a key as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// The key does not exist (or already expired).
    Missing,
    /// The key exists without an expiry.
    Persistent,
    Expires(Duration),
}

impl KeyTtl {
    /// Decode a `PTTL` reply: `-2` missing, `-1` no expiry, otherwise milliseconds left.
    pub fn from_pttl(reply: i64) -> Self {
        match reply {
            -1 => Self::Persistent,
            millis if millis >= 0 => Self::Expires(Duration::from_millis(millis as u64)),
            _ => Self::Missing,
        }
    }

    /// Seconds in the `TTL` reply convention (`-2` missing, `-1` persistent).
    pub fn as_seconds(&self) -> i64 {
        match self {
            Self::Missing => -2,
            Self::Persistent => -1,
            Self::Expires(left) => left.as_secs() as i64,
        }
    }
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value`, replacing any previous value and expiry. `None` stores without expiry.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>)
    -> Result<(), CacheError>;

    async fn del(&self, key: &str) -> Result<bool, CacheError>;

    /// Returns `false` when the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError>;

    async fn ttl(&self, key: &str) -> Result<KeyTtl, CacheError>;

    async fn hset(&self, key: &str, fields: Vec<(String, String)>) -> Result<(), CacheError>;

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, CacheError>;

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, CacheError>;

    async fn hdel(&self, key: &str, field: &str) -> Result<bool, CacheError>;

    /// Returns the list length after the push.
    async fn lpush(&self, key: &str, value: String) -> Result<usize, CacheError>;

    async fn rpop(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn lrange(&self, key: &str, start: isize, stop: isize)
    -> Result<Vec<String>, CacheError>;

    /// Returns `true` when the member was not already present.
    async fn sadd(&self, key: &str, member: String) -> Result<bool, CacheError>;

    async fn smembers(&self, key: &str) -> Result<Vec<String>, CacheError>;

    async fn srem(&self, key: &str, member: &str) -> Result<usize, CacheError>;

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError>;

    async fn flushall(&self) -> Result<(), CacheError>;

    async fn ping(&self) -> Result<(), CacheError>;
}
