//! Shared fixtures for the integration tests: an in-memory user store, a counting joke
//! upstream and a cache store that can be switched off mid-test.

#![allow(dead_code)]

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use jester::application::jokes::{JokeService, JokeSource, JokeSourceError};
use jester::application::repos::{RepoError, UsersRepo};
use jester::application::users::UserService;
use jester::cache::{
    CacheAside, CacheClient, CacheError, CacheStore, CacheTtls, CollectionPolicy, KeyTtl,
    MemoryStore,
};
use jester::domain::jokes::Joke;
use jester::domain::users::{NewUser, UserChanges, UserRecord};
use jester::infra::http::{HttpState, build_router};
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Default)]
pub struct RepoCalls {
    pub insert: AtomicUsize,
    pub find: AtomicUsize,
    pub update: AtomicUsize,
    pub delete: AtomicUsize,
    pub list: AtomicUsize,
}

/// User store kept in a vector, counting calls and optionally refusing all requests.
#[derive(Default)]
pub struct MemoryUsers {
    rows: Mutex<Vec<UserRecord>>,
    pub calls: RepoCalls,
    down: AtomicBool,
}

impl MemoryUsers {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn finds(&self) -> usize {
        self.calls.find.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.calls.list.load(Ordering::SeqCst)
    }

    pub fn stored(&self, id: Uuid) -> Option<UserRecord> {
        self.rows
            .lock()
            .expect("rows lock")
            .iter()
            .find(|row| row.id == id)
            .cloned()
    }

    fn check(&self) -> Result<(), RepoError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl UsersRepo for MemoryUsers {
    async fn insert(&self, user: NewUser) -> Result<UserRecord, RepoError> {
        self.calls.insert.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut rows = self.rows.lock().expect("rows lock");
        if rows.iter().any(|row| row.email == user.email) {
            return Err(RepoError::Duplicate {
                constraint: "users_email_key".to_string(),
            });
        }
        let now = OffsetDateTime::now_utc();
        let record = UserRecord {
            id: Uuid::new_v4(),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone: user.phone,
            created_at: now,
            updated_at: now,
        };
        rows.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        self.calls.find.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.stored(id))
    }

    async fn update(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<UserRecord>, RepoError> {
        self.calls.update.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut rows = self.rows.lock().expect("rows lock");
        let Some(row) = rows.iter_mut().find(|row| row.id == id) else {
            return Ok(None);
        };
        if let Some(first_name) = changes.first_name {
            row.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            row.last_name = last_name;
        }
        if let Some(email) = changes.email {
            row.email = email;
        }
        if let Some(phone) = changes.phone {
            row.phone = Some(phone);
        }
        row.updated_at = OffsetDateTime::now_utc();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut rows = self.rows.lock().expect("rows lock");
        let position = rows.iter().position(|row| row.id == id);
        Ok(position.map(|index| rows.remove(index)))
    }

    async fn list_all(&self) -> Result<Vec<UserRecord>, RepoError> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.rows.lock().expect("rows lock").clone())
    }

    async fn ping(&self) -> Result<(), RepoError> {
        self.check()
    }
}

/// Joke upstream returning a numbered joke per call.
#[derive(Default)]
pub struct CountingJokes {
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl CountingJokes {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl JokeSource for CountingJokes {
    async fn fetch_one(&self) -> Result<Joke, JokeSourceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing.load(Ordering::SeqCst) {
            return Err(JokeSourceError::Status { status: 503 });
        }
        Ok(Joke(json!({
            "id": call,
            "type": "general",
            "setup": format!("Setup number {call}"),
            "punchline": "Punchline."
        })))
    }
}

/// In-process store that answers every call with a transport error while switched off.
pub struct SwitchableStore {
    inner: MemoryStore,
    down: AtomicBool,
}

impl SwitchableStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(NonZeroUsize::new(1024).expect("non-zero")),
            down: AtomicBool::new(false),
        }
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), CacheError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(CacheError::transport("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for SwitchableStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        self.check()?;
        self.inner.set(key, value, ttl).await
    }

    async fn del(&self, key: &str) -> Result<bool, CacheError> {
        self.check()?;
        self.inner.del(key).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        self.check()?;
        self.inner.expire(key, ttl).await
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl, CacheError> {
        self.check()?;
        self.inner.ttl(key).await
    }

    async fn hset(&self, key: &str, fields: Vec<(String, String)>) -> Result<(), CacheError> {
        self.check()?;
        self.inner.hset(key, fields).await
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, CacheError> {
        self.check()?;
        self.inner.hget(key, field).await
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, CacheError> {
        self.check()?;
        self.inner.hgetall(key).await
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool, CacheError> {
        self.check()?;
        self.inner.hdel(key, field).await
    }

    async fn lpush(&self, key: &str, value: String) -> Result<usize, CacheError> {
        self.check()?;
        self.inner.lpush(key, value).await
    }

    async fn rpop(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check()?;
        self.inner.rpop(key).await
    }

    async fn lrange(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, CacheError> {
        self.check()?;
        self.inner.lrange(key, start, stop).await
    }

    async fn sadd(&self, key: &str, member: String) -> Result<bool, CacheError> {
        self.check()?;
        self.inner.sadd(key, member).await
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, CacheError> {
        self.check()?;
        self.inner.smembers(key).await
    }

    async fn srem(&self, key: &str, member: &str) -> Result<usize, CacheError> {
        self.check()?;
        self.inner.srem(key, member).await
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        self.check()?;
        self.inner.keys(pattern).await
    }

    async fn flushall(&self) -> Result<(), CacheError> {
        self.check()?;
        self.inner.flushall().await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.check()
    }
}

/// Services wired against in-memory fakes, sharing one cache store.
pub struct Harness {
    pub users: Arc<MemoryUsers>,
    pub jokes: Arc<CountingJokes>,
    pub store: Arc<SwitchableStore>,
    pub client: CacheClient,
    pub user_service: Arc<UserService>,
    pub joke_service: Arc<JokeService>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(CollectionPolicy::ExpireOnly)
    }

    pub fn with_policy(policy: CollectionPolicy) -> Self {
        let users = Arc::new(MemoryUsers::default());
        let jokes = Arc::new(CountingJokes::default());
        let store = Arc::new(SwitchableStore::new());
        let client = CacheClient::new(store.clone());
        let aside = CacheAside::new(client.clone());
        let ttls = CacheTtls::default();

        let user_service = Arc::new(UserService::new(users.clone(), aside.clone(), ttls, policy));
        let joke_service = Arc::new(JokeService::new(jokes.clone(), aside, ttls.joke));

        Self {
            users,
            jokes,
            store,
            client,
            user_service,
            joke_service,
        }
    }

    pub fn router(&self) -> Router {
        build_router(HttpState {
            users: self.user_service.clone(),
            jokes: self.joke_service.clone(),
            cache: self.client.clone(),
        })
    }
}

pub fn alice() -> NewUser {
    NewUser {
        first_name: "Alice".to_string(),
        last_name: "Liddell".to_string(),
        email: "alice@example.com".to_string(),
        phone: Some("+44 20 7946 0000".to_string()),
    }
}
