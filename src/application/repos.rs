//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::users::{NewUser, UserChanges, UserRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Origin store for user records.
///
/// Lookups and mutations that target a missing id return `Ok(None)` rather than
/// [`RepoError::NotFound`].
#[async_trait]
pub trait UsersRepo: Send + Sync {
    /// Persist a new user; the store assigns the id and timestamps.
    async fn insert(&self, user: NewUser) -> Result<UserRecord, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;

    /// Apply the present attributes of `changes` and return the stored result.
    async fn update(&self, id: Uuid, changes: UserChanges)
    -> Result<Option<UserRecord>, RepoError>;

    /// Remove the user, returning the record as it was before deletion.
    async fn delete(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;

    async fn list_all(&self) -> Result<Vec<UserRecord>, RepoError>;

    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}
