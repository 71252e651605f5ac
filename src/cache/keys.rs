//! Cache key layout.

use std::fmt;

use uuid::Uuid;

const RANDOM_JOKE: &str = "random_joke";
const USERS_ALL: &str = "users:all";
const USER_PREFIX: &str = "user:";

/// Every key the services read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The single joke shared by all callers.
    RandomJoke,
    User(Uuid),
    /// Snapshot of the full user listing.
    UsersAll,
}

impl CacheKey {
    /// Label used on hit/miss metrics.
    pub fn resource(&self) -> &'static str {
        match self {
            Self::RandomJoke => "joke",
            Self::User(_) => "user",
            Self::UsersAll => "users",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RandomJoke => f.write_str(RANDOM_JOKE),
            Self::User(id) => write!(f, "{USER_PREFIX}{id}"),
            Self::UsersAll => f.write_str(USERS_ALL),
        }
    }
}
