//! Live checks of the Redis backend.
//!
//! - Marked `#[ignore]`; run with `JESTER_TEST_REDIS_URL=redis://127.0.0.1:6379 cargo test -- --ignored`.
//! - Every key is namespaced by a random prefix and removed afterwards; nothing is flushed.

use std::collections::HashMap;
use std::time::Duration;

use jester::cache::{CacheClient, CacheStore, KeyTtl, RedisStore};
use std::sync::Arc;
use uuid::Uuid;

type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

async fn connect() -> TestResult<RedisStore> {
    let url = std::env::var("JESTER_TEST_REDIS_URL")
        .map_err(|_| "JESTER_TEST_REDIS_URL must point at a disposable Redis")?;
    Ok(RedisStore::connect(&url).await?)
}

fn namespaced(name: &str) -> String {
    format!("jester-test:{}:{name}", Uuid::new_v4())
}

#[tokio::test]
#[ignore]
async fn live_strings_expire() -> TestResult<()> {
    let store = connect().await?;
    let key = namespaced("greeting");

    store
        .set(&key, "\"hello\"".to_string(), Some(Duration::from_secs(10)))
        .await?;
    assert_eq!(store.get(&key).await?.as_deref(), Some("\"hello\""));
    match store.ttl(&key).await? {
        KeyTtl::Expires(left) => assert!(left <= Duration::from_secs(10)),
        other => panic!("expected expiring key, got {other:?}"),
    }

    assert!(store.expire(&key, Duration::from_secs(3600)).await?);
    match store.ttl(&key).await? {
        KeyTtl::Expires(left) => assert!(left > Duration::from_secs(3500)),
        other => panic!("expected expiring key, got {other:?}"),
    }

    assert!(store.del(&key).await?);
    assert_eq!(store.ttl(&key).await?, KeyTtl::Missing);
    Ok(())
}

#[tokio::test]
#[ignore]
async fn live_collections_follow_redis_semantics() -> TestResult<()> {
    let client = CacheClient::new(Arc::new(connect().await?));
    let hash = namespaced("hash");
    let list = namespaced("list");
    let set = namespaced("set");

    let mut fields = HashMap::new();
    fields.insert("a".to_string(), 1u32);
    fields.insert("b".to_string(), 2u32);
    client.hset(&hash, &fields).await?;
    assert_eq!(client.hget::<u32>(&hash, "b").await, Some(2));
    assert_eq!(client.hgetall::<u32>(&hash).await, fields);

    for value in ["one", "two", "three"] {
        client.lpush(&list, &value).await?;
    }
    assert_eq!(
        client.lrange::<String>(&list, 0, -1).await,
        vec!["three", "two", "one"]
    );
    assert_eq!(client.rpop::<String>(&list).await.as_deref(), Some("one"));

    assert!(client.sadd(&set, &"x").await?);
    assert!(!client.sadd(&set, &"x").await?);
    assert_eq!(client.srem(&set, &"x").await?, 1);
    assert!(client.smembers::<String>(&set).await.is_empty());

    client.del(&hash).await?;
    client.del(&list).await?;
    Ok(())
}

#[tokio::test]
#[ignore]
async fn live_wrong_type_reads_as_miss() -> TestResult<()> {
    let store = connect().await?;
    let key = namespaced("list");
    store.lpush(&key, "\"item\"".to_string()).await?;

    let client = CacheClient::new(Arc::new(store));
    assert!(client.get::<String>(&key).await.is_none());
    assert!(client.set(&key, &"value", None).await.is_ok());
    client.del(&key).await?;
    Ok(())
}
