//! Cache backend selection and per-operation TTLs.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_JOKE_TTL_SECS: u64 = 10;
const DEFAULT_USER_READ_TTL_SECS: u64 = 10;
const DEFAULT_USER_CREATE_TTL_SECS: u64 = 10;
const DEFAULT_USER_UPDATE_TTL_SECS: u64 = 3600;
const DEFAULT_USERS_ALL_TTL_SECS: u64 = 10;

/// Where cache entries live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    #[default]
    Redis,
    /// In-process store; entries do not survive a restart and are not shared between processes.
    Memory,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown cache backend `{other}` (expected redis|memory)")),
        }
    }
}

impl fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Redis => "redis",
            Self::Memory => "memory",
        })
    }
}

/// How the cached user listing reacts to single-user mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionPolicy {
    /// `users:all` is only refreshed once its TTL runs out; listings may lag behind writes.
    #[default]
    ExpireOnly,
    /// `users:all` is deleted after every successful create, update or delete.
    InvalidateOnWrite,
}

impl FromStr for CollectionPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "expire_only" => Ok(Self::ExpireOnly),
            "invalidate_on_write" => Ok(Self::InvalidateOnWrite),
            other => Err(format!(
                "unknown collection policy `{other}` (expected expire_only|invalidate_on_write)"
            )),
        }
    }
}

/// Lifetimes assigned when an entry is written, one per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub joke: Duration,
    pub user_read: Duration,
    pub user_create: Duration,
    pub user_update: Duration,
    pub users_all: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            joke: Duration::from_secs(DEFAULT_JOKE_TTL_SECS),
            user_read: Duration::from_secs(DEFAULT_USER_READ_TTL_SECS),
            user_create: Duration::from_secs(DEFAULT_USER_CREATE_TTL_SECS),
            user_update: Duration::from_secs(DEFAULT_USER_UPDATE_TTL_SECS),
            users_all: Duration::from_secs(DEFAULT_USERS_ALL_TTL_SECS),
        }
    }
}
