//! Core domain logic for sharenote.
//! Notes with one owner, a shared-with list, and a per-note sort order.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod policy;
pub mod repo;
pub mod service;

pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{
    NewNote, Note, NoteId, NotePatch, NoteValidationError, DEFAULT_NOTE_COLOR, SORT_ORDER_LAST,
};
pub use model::user::{NewUser, User, UserId, UserProfile};
pub use policy::{can_access, can_manage_sharing, deletion_effect, DeletionEffect, NoteAccess};
pub use repo::note_repo::{NoteListQuery, NoteRepository, SqliteNoteRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::error::{ErrorKind, ServiceError, ServiceResult};
pub use service::identity::{IdentityResolver, UserDirectory};
pub use service::note_service::{NoteService, ReorderReceipt, RemovalOutcome};
pub use service::profile_service::ProfileService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
