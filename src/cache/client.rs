//! Typed cache client.
//!
//! Values are stored as JSON text. Reads never fail: transport or decoding problems are logged,
//! counted and reported as "no value". Writes return [`CacheWriteError`] so callers can surface
//! them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use super::store::{CacheError, CacheStore, KeyTtl};

pub(crate) const METRIC_CACHE_READ_DEGRADED: &str = "jester_cache_read_degraded_total";
pub(crate) const METRIC_CACHE_WRITE_ERROR: &str = "jester_cache_write_error_total";

/// A cache mutation that did not take effect.
#[derive(Debug, Error)]
#[error("cache {op} failed for `{key}`")]
pub struct CacheWriteError {
    pub op: &'static str,
    pub key: String,
    #[source]
    pub source: CacheError,
}

#[derive(Clone)]
pub struct CacheClient {
    store: Arc<dyn CacheStore>,
}

impl CacheClient {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let result = self
            .store
            .get(key)
            .await
            .and_then(|raw| raw.as_deref().map(decode).transpose());
        absorb("get", key, result).flatten()
    }

    /// Store `value` under `key`. A zero or absent `ttl` stores it without expiry.
    pub async fn set<T>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheWriteError>
    where
        T: Serialize + ?Sized + Sync,
    {
        let payload = encode(value).map_err(|err| write_failed("set", key, err))?;
        let ttl = ttl.filter(|ttl| !ttl.is_zero());
        self.store
            .set(key, payload, ttl)
            .await
            .map_err(|err| write_failed("set", key, err))
    }

    /// Returns whether the key existed.
    pub async fn del(&self, key: &str) -> Result<bool, CacheWriteError> {
        self.store
            .del(key)
            .await
            .map_err(|err| write_failed("del", key, err))
    }

    pub async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheWriteError> {
        self.store
            .expire(key, ttl)
            .await
            .map_err(|err| write_failed("expire", key, err))
    }

    /// Remaining lifetime; an unreachable store reports the key as missing.
    pub async fn ttl(&self, key: &str) -> KeyTtl {
        absorb("ttl", key, self.store.ttl(key).await).unwrap_or(KeyTtl::Missing)
    }

    pub async fn hset<T>(&self, key: &str, fields: &HashMap<String, T>) -> Result<(), CacheWriteError>
    where
        T: Serialize + Sync,
    {
        let encoded = fields
            .iter()
            .map(|(field, value)| Ok::<_, CacheError>((field.clone(), encode(value)?)))
            .collect::<Result<Vec<_>, CacheError>>()
            .map_err(|err| write_failed("hset", key, err))?;
        self.store
            .hset(key, encoded)
            .await
            .map_err(|err| write_failed("hset", key, err))
    }

    pub async fn hget<T: DeserializeOwned>(&self, key: &str, field: &str) -> Option<T> {
        let result = self
            .store
            .hget(key, field)
            .await
            .and_then(|raw| raw.as_deref().map(decode).transpose());
        absorb("hget", key, result).flatten()
    }

    pub async fn hgetall<T: DeserializeOwned>(&self, key: &str) -> HashMap<String, T> {
        let result = self.store.hgetall(key).await.and_then(|fields| {
            fields
                .into_iter()
                .map(|(field, raw)| Ok::<_, CacheError>((field, decode(&raw)?)))
                .collect()
        });
        absorb("hgetall", key, result).unwrap_or_default()
    }

    pub async fn hdel(&self, key: &str, field: &str) -> Result<bool, CacheWriteError> {
        self.store
            .hdel(key, field)
            .await
            .map_err(|err| write_failed("hdel", key, err))
    }

    /// Returns the list length after the push.
    pub async fn lpush<T>(&self, key: &str, value: &T) -> Result<usize, CacheWriteError>
    where
        T: Serialize + ?Sized + Sync,
    {
        let payload = encode(value).map_err(|err| write_failed("lpush", key, err))?;
        self.store
            .lpush(key, payload)
            .await
            .map_err(|err| write_failed("lpush", key, err))
    }

    pub async fn rpop<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let result = self
            .store
            .rpop(key)
            .await
            .and_then(|raw| raw.as_deref().map(decode).transpose());
        absorb("rpop", key, result).flatten()
    }

    /// Inclusive range; negative indexes count from the tail.
    pub async fn lrange<T: DeserializeOwned>(&self, key: &str, start: isize, stop: isize) -> Vec<T> {
        let result = self
            .store
            .lrange(key, start, stop)
            .await
            .and_then(|items| items.iter().map(|raw| decode(raw)).collect());
        absorb("lrange", key, result).unwrap_or_default()
    }

    pub async fn sadd<T>(&self, key: &str, member: &T) -> Result<bool, CacheWriteError>
    where
        T: Serialize + ?Sized + Sync,
    {
        let payload = encode(member).map_err(|err| write_failed("sadd", key, err))?;
        self.store
            .sadd(key, payload)
            .await
            .map_err(|err| write_failed("sadd", key, err))
    }

    pub async fn smembers<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let result = self
            .store
            .smembers(key)
            .await
            .and_then(|members| members.iter().map(|raw| decode(raw)).collect());
        absorb("smembers", key, result).unwrap_or_default()
    }

    /// Returns the number of members removed.
    pub async fn srem<T>(&self, key: &str, member: &T) -> Result<usize, CacheWriteError>
    where
        T: Serialize + ?Sized + Sync,
    {
        let payload = encode(member).map_err(|err| write_failed("srem", key, err))?;
        self.store
            .srem(key, &payload)
            .await
            .map_err(|err| write_failed("srem", key, err))
    }

    pub async fn keys(&self, pattern: &str) -> Vec<String> {
        absorb("keys", pattern, self.store.keys(pattern).await).unwrap_or_default()
    }

    pub async fn flushall(&self) -> Result<(), CacheWriteError> {
        self.store
            .flushall()
            .await
            .map_err(|err| write_failed("flushall", "*", err))
    }

    pub async fn ping(&self) -> bool {
        absorb("ping", "", self.store.ping().await).is_some()
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, CacheError> {
    serde_json::to_string(value).map_err(CacheError::Serialize)
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, CacheError> {
    serde_json::from_str(raw).map_err(CacheError::Deserialize)
}

fn absorb<T>(op: &'static str, key: &str, result: Result<T, CacheError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                target = "jester::cache::client",
                op,
                key,
                error = %err,
                "Cache read degraded, treating as miss"
            );
            counter!(METRIC_CACHE_READ_DEGRADED, "op" => op).increment(1);
            None
        }
    }
}

fn write_failed(op: &'static str, key: &str, source: CacheError) -> CacheWriteError {
    counter!(METRIC_CACHE_WRITE_ERROR, "op" => op).increment(1);
    CacheWriteError {
        op,
        key: key.to_string(),
        source,
    }
}
