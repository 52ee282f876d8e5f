//! User model.
//!
//! Registration and password hashing happen outside core; a user row only
//! carries an opaque password hash string.

use serde::{Deserialize, Serialize};

/// Storage-assigned user identifier.
pub type UserId = i64;

/// Full user row as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    /// Unique, stored case-sensitively.
    pub username: String,
    /// Unique; the only mutable identity field.
    pub email: String,
    /// Opaque hash produced by the credential flow.
    pub password_hash: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl User {
    /// Returns the public projection without credential material.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

/// Public user projection returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: i64,
}

/// Insert payload for a new user row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
        }
    }
}
