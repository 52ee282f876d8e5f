//! Identity resolution: username to user id.
//!
//! Sharing by name goes through this single lookup path.

use crate::model::user::UserId;
use crate::repo::user_repo::UserRepository;
use crate::service::error::{ServiceError, ServiceResult};
use log::debug;

/// Maps a username to the id of the unique user carrying it.
pub trait IdentityResolver {
    /// Fails with `UsernameNotFound` when no user matches exactly.
    fn resolve_user_id(&self, username: &str) -> ServiceResult<UserId>;
}

/// Resolver backed by the user row store.
pub struct UserDirectory<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserDirectory<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }
}

impl<R: UserRepository> IdentityResolver for UserDirectory<R> {
    fn resolve_user_id(&self, username: &str) -> ServiceResult<UserId> {
        if username.is_empty() {
            return Err(ServiceError::InvalidInput(
                "username must not be empty".to_string(),
            ));
        }

        match self.repo.find_user_id_by_username(username)? {
            Some(user_id) => Ok(user_id),
            None => {
                debug!("event=identity_resolve module=identity status=not_found");
                Err(ServiceError::UsernameNotFound(username.to_string()))
            }
        }
    }
}
