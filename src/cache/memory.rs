//! In-process store with Redis semantics for strings, hashes, lists and sets.
//!
//! Used when `cache.backend = "memory"` and by the test suites. Entries expire lazily on
//! access; the map is bounded by an LRU capacity.

use std::collections::{HashMap, HashSet, VecDeque};
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use tokio::time::Instant;
use tracing::debug;

use super::lock::mutex_lock;
use super::store::{CacheError, CacheStore, KeyTtl};

const SOURCE: &str = "cache::memory";

enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    List(VecDeque<String>),
    Set(HashSet<String>),
}

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

type Entries = LruCache<String, Entry>;

pub struct MemoryStore {
    entries: Mutex<Entries>,
}

impl MemoryStore {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn with_entries<R>(&self, op: &'static str, f: impl FnOnce(&mut Entries) -> R) -> R {
        let mut guard = mutex_lock(&self.entries, SOURCE, op);
        f(&mut guard)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(10_000).unwrap_or(NonZeroUsize::MIN))
    }
}

fn live<'a>(entries: &'a mut Entries, key: &str, now: Instant) -> Option<&'a mut Entry> {
    if entries.peek(key).is_some_and(|entry| entry.is_expired(now)) {
        entries.pop(key);
        return None;
    }
    entries.get_mut(key)
}

fn insert(entries: &mut Entries, key: &str, entry: Entry) {
    if let Some((evicted, _)) = entries.push(key.to_string(), entry) {
        if evicted != key {
            debug!(
                target = "jester::cache::memory",
                evicted = %evicted,
                "Evicted least recently used key"
            );
        }
    }
}

/// Resolve Redis-style inclusive range indexes against a collection length.
fn range_bounds(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start >= len || start > stop {
        return None;
    }
    Some((start as usize, stop as usize))
}

fn deadline(key: &str, now: Instant, ttl: Duration) -> Result<Instant, CacheError> {
    now.checked_add(ttl).ok_or_else(|| CacheError::TtlOutOfRange {
        key: key.to_string(),
        ttl,
    })
}

/// Redis `KEYS` glob: `*`, `?`, `[...]` classes (with `^` and ranges) and `\` escapes.
pub(crate) fn glob_match(pattern: &str, key: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let key: Vec<char> = key.chars().collect();
    match_chars(&pattern, &key)
}

fn match_chars(pattern: &[char], key: &[char]) -> bool {
    match pattern.split_first() {
        None => key.is_empty(),
        Some(('*', rest)) => (0..=key.len()).any(|skip| match_chars(rest, &key[skip..])),
        Some(('?', rest)) => !key.is_empty() && match_chars(rest, &key[1..]),
        Some(('[', rest)) => {
            let Some((&ch, key_rest)) = key.split_first() else {
                return false;
            };
            match match_class(rest, ch) {
                Some((matched, after)) => matched && match_chars(after, key_rest),
                // Unterminated class matches a literal bracket.
                None => ch == '[' && match_chars(rest, key_rest),
            }
        }
        Some(('\\', rest)) if !rest.is_empty() => {
            key.first() == Some(&rest[0]) && match_chars(&rest[1..], &key[1..])
        }
        Some((literal, rest)) => key.first() == Some(literal) && match_chars(rest, &key[1..]),
    }
}

fn match_class(class: &[char], ch: char) -> Option<(bool, &[char])> {
    let (negated, mut rest) = match class.split_first() {
        Some(('^', rest)) => (true, rest),
        _ => (false, class),
    };
    let mut matched = false;
    loop {
        match rest {
            [] => return None,
            [']', tail @ ..] => return Some((matched != negated, tail)),
            ['\\', escaped, tail @ ..] => {
                matched |= *escaped == ch;
                rest = tail;
            }
            [lo, '-', hi, tail @ ..] if *hi != ']' => {
                let (lo, hi) = if lo <= hi { (*lo, *hi) } else { (*hi, *lo) };
                matched |= (lo..=hi).contains(&ch);
                rest = tail;
            }
            [single, tail @ ..] => {
                matched |= *single == ch;
                rest = tail;
            }
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.with_entries("get", |entries| {
            match live(entries, key, Instant::now()) {
                Some(Entry {
                    value: Value::Str(value),
                    ..
                }) => Ok(Some(value.clone())),
                Some(_) => Err(CacheError::wrong_type(key)),
                None => Ok(None),
            }
        })
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let expires_at = ttl.map(|ttl| deadline(key, Instant::now(), ttl)).transpose()?;
        self.with_entries("set", |entries| {
            let entry = Entry {
                value: Value::Str(value),
                expires_at,
            };
            insert(entries, key, entry);
            Ok(())
        })
    }

    async fn del(&self, key: &str) -> Result<bool, CacheError> {
        self.with_entries("del", |entries| {
            let existed = live(entries, key, Instant::now()).is_some();
            if existed {
                entries.pop(key);
            }
            Ok(existed)
        })
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        self.with_entries("expire", |entries| {
            let now = Instant::now();
            if ttl.is_zero() {
                let existed = live(entries, key, now).is_some();
                if existed {
                    entries.pop(key);
                }
                return Ok(existed);
            }
            let at = deadline(key, now, ttl)?;
            Ok(live(entries, key, now)
                .map(|entry| entry.expires_at = Some(at))
                .is_some())
        })
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl, CacheError> {
        self.with_entries("ttl", |entries| {
            let now = Instant::now();
            Ok(match live(entries, key, now) {
                Some(Entry {
                    expires_at: Some(at),
                    ..
                }) => KeyTtl::Expires(at.saturating_duration_since(now)),
                Some(_) => KeyTtl::Persistent,
                None => KeyTtl::Missing,
            })
        })
    }

    async fn hset(&self, key: &str, fields: Vec<(String, String)>) -> Result<(), CacheError> {
        if fields.is_empty() {
            return Ok(());
        }
        self.with_entries("hset", |entries| {
            match live(entries, key, Instant::now()) {
                Some(Entry {
                    value: Value::Hash(map),
                    ..
                }) => map.extend(fields),
                Some(_) => return Err(CacheError::wrong_type(key)),
                None => {
                    let map = fields.into_iter().collect();
                    insert(entries, key, Entry::new(Value::Hash(map)));
                }
            }
            Ok(())
        })
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, CacheError> {
        self.with_entries("hget", |entries| {
            match live(entries, key, Instant::now()) {
                Some(Entry {
                    value: Value::Hash(map),
                    ..
                }) => Ok(map.get(field).cloned()),
                Some(_) => Err(CacheError::wrong_type(key)),
                None => Ok(None),
            }
        })
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, CacheError> {
        self.with_entries("hgetall", |entries| {
            match live(entries, key, Instant::now()) {
                Some(Entry {
                    value: Value::Hash(map),
                    ..
                }) => Ok(map.clone()),
                Some(_) => Err(CacheError::wrong_type(key)),
                None => Ok(HashMap::new()),
            }
        })
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool, CacheError> {
        self.with_entries("hdel", |entries| {
            let (removed, drained) = match live(entries, key, Instant::now()) {
                Some(Entry {
                    value: Value::Hash(map),
                    ..
                }) => {
                    let removed = map.remove(field).is_some();
                    (removed, map.is_empty())
                }
                Some(_) => return Err(CacheError::wrong_type(key)),
                None => (false, false),
            };
            if drained {
                entries.pop(key);
            }
            Ok(removed)
        })
    }

    async fn lpush(&self, key: &str, value: String) -> Result<usize, CacheError> {
        self.with_entries("lpush", |entries| {
            match live(entries, key, Instant::now()) {
                Some(Entry {
                    value: Value::List(list),
                    ..
                }) => {
                    list.push_front(value);
                    Ok(list.len())
                }
                Some(_) => Err(CacheError::wrong_type(key)),
                None => {
                    insert(entries, key, Entry::new(Value::List(VecDeque::from([value]))));
                    Ok(1)
                }
            }
        })
    }

    async fn rpop(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.with_entries("rpop", |entries| {
            let (popped, drained) = match live(entries, key, Instant::now()) {
                Some(Entry {
                    value: Value::List(list),
                    ..
                }) => {
                    let popped = list.pop_back();
                    (popped, list.is_empty())
                }
                Some(_) => return Err(CacheError::wrong_type(key)),
                None => (None, false),
            };
            if drained {
                entries.pop(key);
            }
            Ok(popped)
        })
    }

    async fn lrange(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, CacheError> {
        self.with_entries("lrange", |entries| {
            match live(entries, key, Instant::now()) {
                Some(Entry {
                    value: Value::List(list),
                    ..
                }) => Ok(match range_bounds(list.len(), start, stop) {
                    Some((from, to)) => list.range(from..=to).cloned().collect(),
                    None => Vec::new(),
                }),
                Some(_) => Err(CacheError::wrong_type(key)),
                None => Ok(Vec::new()),
            }
        })
    }

    async fn sadd(&self, key: &str, member: String) -> Result<bool, CacheError> {
        self.with_entries("sadd", |entries| {
            match live(entries, key, Instant::now()) {
                Some(Entry {
                    value: Value::Set(set),
                    ..
                }) => Ok(set.insert(member)),
                Some(_) => Err(CacheError::wrong_type(key)),
                None => {
                    insert(entries, key, Entry::new(Value::Set(HashSet::from([member]))));
                    Ok(true)
                }
            }
        })
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, CacheError> {
        self.with_entries("smembers", |entries| {
            match live(entries, key, Instant::now()) {
                Some(Entry {
                    value: Value::Set(set),
                    ..
                }) => Ok(set.iter().cloned().collect()),
                Some(_) => Err(CacheError::wrong_type(key)),
                None => Ok(Vec::new()),
            }
        })
    }

    async fn srem(&self, key: &str, member: &str) -> Result<usize, CacheError> {
        self.with_entries("srem", |entries| {
            let (removed, drained) = match live(entries, key, Instant::now()) {
                Some(Entry {
                    value: Value::Set(set),
                    ..
                }) => {
                    let removed = usize::from(set.remove(member));
                    (removed, set.is_empty())
                }
                Some(_) => return Err(CacheError::wrong_type(key)),
                None => (0, false),
            };
            if drained {
                entries.pop(key);
            }
            Ok(removed)
        })
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        self.with_entries("keys", |entries| {
            let now = Instant::now();
            let mut keys: Vec<String> = entries
                .iter()
                .filter(|(key, entry)| !entry.is_expired(now) && glob_match(pattern, key))
                .map(|(key, _)| key.clone())
                .collect();
            keys.sort();
            Ok(keys)
        })
    }

    async fn flushall(&self) -> Result<(), CacheError> {
        self.with_entries("flushall", |entries| {
            entries.clear();
            Ok(())
        })
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
