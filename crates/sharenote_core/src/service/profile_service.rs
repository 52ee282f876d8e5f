//! Profile use-case service.
//!
//! Read-only user lookups for display: by id, or by username fragment.
//! Credential fields never leave this layer.

use crate::model::user::{UserId, UserProfile};
use crate::repo::user_repo::UserRepository;
use crate::service::error::{ServiceError, ServiceResult};

pub struct ProfileService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> ProfileService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Gets the public profile of one user.
    pub fn get_profile(&self, user_id: UserId) -> ServiceResult<UserProfile> {
        self.repo
            .get_user(user_id)?
            .map(|user| user.profile())
            .ok_or(ServiceError::UserNotFound(user_id))
    }

    /// Finds users whose username contains `fragment`, ignoring case.
    ///
    /// Returns an empty list for a blank fragment instead of every user.
    pub fn search_profiles(&self, fragment: &str) -> ServiceResult<Vec<UserProfile>> {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return Ok(Vec::new());
        }
        let users = self.repo.search_users_by_username(fragment)?;
        Ok(users.iter().map(|user| user.profile()).collect())
    }

    /// Changes a user's email; a taken email surfaces as a store failure.
    pub fn update_email(&self, user_id: UserId, email: &str) -> ServiceResult<UserProfile> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ServiceError::InvalidInput(
                "email must not be empty".to_string(),
            ));
        }
        self.repo.update_email(user_id, email)?;
        self.get_profile(user_id)
    }
}
