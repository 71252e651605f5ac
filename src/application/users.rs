use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::repos::{RepoError, UsersRepo};
use crate::cache::{CacheAside, CacheKey, CacheTtls, CacheWriteError, CollectionPolicy, Source, Sourced};
use crate::domain::error::DomainError;
use crate::domain::users::{NewUser, UserChanges, UserRecord};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user `{id}` not found")]
    NotFound { id: Uuid },
    #[error(transparent)]
    InvalidInput(#[from] DomainError),
    #[error("user store request failed")]
    Origin(#[from] RepoError),
    #[error(transparent)]
    CacheWrite(#[from] CacheWriteError),
}

/// User CRUD with the record cache kept in step with the store.
///
/// Every mutation reaches the store first; cache entries are written or removed only once the
/// store accepted the change.
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UsersRepo>,
    cache: CacheAside,
    ttls: CacheTtls,
    collection_policy: CollectionPolicy,
}

impl UserService {
    pub fn new(
        repo: Arc<dyn UsersRepo>,
        cache: CacheAside,
        ttls: CacheTtls,
        collection_policy: CollectionPolicy,
    ) -> Self {
        Self {
            repo,
            cache,
            ttls,
            collection_policy,
        }
    }

    pub async fn create_user(&self, input: NewUser) -> Result<UserRecord, UserError> {
        let input = input.validate()?;
        let user = self.repo.insert(input).await?;

        self.cache
            .commit(CacheKey::User(user.id), &user, self.ttls.user_create)
            .await?;
        self.invalidate_listing().await?;

        info!(
            target = "jester::application::users",
            user_id = %user.id,
            "User created"
        );
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Sourced<UserRecord>, UserError> {
        let repo = &self.repo;
        self.cache
            .read_through(CacheKey::User(id), self.ttls.user_read, || async move {
                repo.find_by_id(id).await.map_err(UserError::from)
            })
            .await?
            .ok_or(UserError::NotFound { id })
    }

    pub async fn get_all_users(&self) -> Result<Sourced<Vec<UserRecord>>, UserError> {
        let repo = &self.repo;
        let listing = self
            .cache
            .read_through(CacheKey::UsersAll, self.ttls.users_all, || async move {
                repo.list_all().await.map(Some).map_err(UserError::from)
            })
            .await?;

        Ok(listing.unwrap_or(Sourced {
            source: Source::Origin,
            value: Vec::new(),
        }))
    }

    pub async fn update_user(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<UserRecord, UserError> {
        let changes = changes.validate()?;
        let user = self
            .repo
            .update(id, changes)
            .await?
            .ok_or(UserError::NotFound { id })?;

        self.cache
            .commit(CacheKey::User(id), &user, self.ttls.user_update)
            .await?;
        self.invalidate_listing().await?;

        info!(
            target = "jester::application::users",
            user_id = %id,
            "User updated"
        );
        Ok(user)
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<UserRecord, UserError> {
        let user = self
            .repo
            .delete(id)
            .await?
            .ok_or(UserError::NotFound { id })?;

        self.cache.evict(CacheKey::User(id)).await?;
        self.invalidate_listing().await?;

        info!(
            target = "jester::application::users",
            user_id = %id,
            "User deleted"
        );
        Ok(user)
    }

    /// Probe the user store without touching the cache.
    pub async fn check_origin(&self) -> Result<(), RepoError> {
        self.repo.ping().await
    }

    async fn invalidate_listing(&self) -> Result<(), CacheWriteError> {
        if self.collection_policy == CollectionPolicy::InvalidateOnWrite {
            let existed = self.cache.evict(CacheKey::UsersAll).await?;
            debug!(
                target = "jester::application::users",
                existed,
                "Invalidated cached user listing"
            );
        }
        Ok(())
    }
}
