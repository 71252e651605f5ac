//! Redis backend over a single multiplexed connection.
//!
//! The connection is opened once at startup and shared by cloning the handle; it is not
//! re-established if the server goes away, so every later command surfaces a transport error.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};
use tracing::info;

use super::store::{CacheError, CacheStore, KeyTtl};

#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url).map_err(CacheError::transport)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(CacheError::transport)?;

        let endpoint = url::Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(str::to_owned))
            .unwrap_or_else(|| "unix".to_string());
        info!(
            target = "jester::cache::redis",
            endpoint = %endpoint,
            "Connected to Redis"
        );

        Ok(Self { conn })
    }

    fn conn(&self) -> MultiplexedConnection {
        self.conn.clone()
    }
}

fn map_redis_error(key: &str, err: RedisError) -> CacheError {
    if err.code() == Some("WRONGTYPE") {
        CacheError::wrong_type(key)
    } else {
        CacheError::transport(err)
    }
}

fn millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.conn()
            .get(key)
            .await
            .map_err(|err| map_redis_error(key, err))
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let mut conn = self.conn();
        let result: Result<(), RedisError> = match ttl {
            Some(ttl) if !ttl.is_zero() => conn.pset_ex(key, value, millis(ttl)).await,
            _ => conn.set(key, value).await,
        };
        result.map_err(|err| map_redis_error(key, err))
    }

    async fn del(&self, key: &str) -> Result<bool, CacheError> {
        let removed: i64 = self
            .conn()
            .del(key)
            .await
            .map_err(|err| map_redis_error(key, err))?;
        Ok(removed > 0)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        let ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        self.conn()
            .pexpire(key, ms)
            .await
            .map_err(|err| map_redis_error(key, err))
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl, CacheError> {
        let reply: i64 = self
            .conn()
            .pttl(key)
            .await
            .map_err(|err| map_redis_error(key, err))?;
        Ok(KeyTtl::from_pttl(reply))
    }

    async fn hset(&self, key: &str, fields: Vec<(String, String)>) -> Result<(), CacheError> {
        if fields.is_empty() {
            return Ok(());
        }
        self.conn()
            .hset_multiple(key, fields.as_slice())
            .await
            .map_err(|err| map_redis_error(key, err))
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, CacheError> {
        self.conn()
            .hget(key, field)
            .await
            .map_err(|err| map_redis_error(key, err))
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, CacheError> {
        self.conn()
            .hgetall(key)
            .await
            .map_err(|err| map_redis_error(key, err))
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool, CacheError> {
        let removed: i64 = self
            .conn()
            .hdel(key, field)
            .await
            .map_err(|err| map_redis_error(key, err))?;
        Ok(removed > 0)
    }

    async fn lpush(&self, key: &str, value: String) -> Result<usize, CacheError> {
        self.conn()
            .lpush(key, value)
            .await
            .map_err(|err| map_redis_error(key, err))
    }

    async fn rpop(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.conn()
            .rpop(key, None)
            .await
            .map_err(|err| map_redis_error(key, err))
    }

    async fn lrange(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, CacheError> {
        self.conn()
            .lrange(key, start, stop)
            .await
            .map_err(|err| map_redis_error(key, err))
    }

    async fn sadd(&self, key: &str, member: String) -> Result<bool, CacheError> {
        let added: i64 = self
            .conn()
            .sadd(key, member)
            .await
            .map_err(|err| map_redis_error(key, err))?;
        Ok(added > 0)
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, CacheError> {
        self.conn()
            .smembers(key)
            .await
            .map_err(|err| map_redis_error(key, err))
    }

    async fn srem(&self, key: &str, member: &str) -> Result<usize, CacheError> {
        self.conn()
            .srem(key, member)
            .await
            .map_err(|err| map_redis_error(key, err))
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut keys: Vec<String> = self
            .conn()
            .keys(pattern)
            .await
            .map_err(CacheError::transport)?;
        keys.sort();
        Ok(keys)
    }

    async fn flushall(&self) -> Result<(), CacheError> {
        let mut conn = self.conn();
        redis::cmd("FLUSHALL")
            .query_async::<()>(&mut conn)
            .await
            .map_err(CacheError::transport)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(CacheError::transport)?;
        Ok(())
    }
}
