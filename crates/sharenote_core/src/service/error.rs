//! Service-level error taxonomy.
//!
//! Callers map [`ErrorKind`] to their transport: `NotFound` to a 404,
//! `BadRequest` to a 400, `StoreFailure` propagated as a server error.

use crate::model::note::{NoteId, NoteValidationError};
use crate::model::user::UserId;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Coarse classification of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    StoreFailure,
}

#[derive(Debug)]
pub enum ServiceError {
    /// Malformed request payload.
    InvalidInput(String),
    NoteNotFound(NoteId),
    UserNotFound(UserId),
    UsernameNotFound(String),
    /// Caller lacks the relationship the operation needs.
    Forbidden(&'static str),
    /// Store reported an error; never retried.
    Store(RepoError),
    /// Write succeeded but the read-back did not find the row.
    InconsistentState(&'static str),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoteNotFound(_) | Self::UserNotFound(_) | Self::UsernameNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::InvalidInput(_) | Self::Forbidden(_) => ErrorKind::BadRequest,
            Self::Store(_) | Self::InconsistentState(_) => ErrorKind::StoreFailure,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::NoteNotFound(_) => write!(f, "Note not found"),
            Self::UserNotFound(_) => write!(f, "User not found"),
            Self::UsernameNotFound(username) => {
                write!(f, "User with username \"{username}\" not found")
            }
            Self::Forbidden(message) => write!(f, "{message}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NoteNotFound(id) => Self::NoteNotFound(id),
            RepoError::UserNotFound(id) => Self::UserNotFound(id),
            other => Self::Store(other),
        }
    }
}

impl From<NoteValidationError> for ServiceError {
    fn from(value: NoteValidationError) -> Self {
        Self::InvalidInput(value.to_string())
    }
}
