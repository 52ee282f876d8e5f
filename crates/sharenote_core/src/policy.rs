//! Note access policy.
//!
//! # Responsibility
//! - Decide what a user may do with a note from its owner and shared-with
//!   list alone.
//!
//! # Invariants
//! - Decisions are pure; no storage access happens here.
//! - Access is binary: owner or shared user gets read/write, nobody else
//!   gets anything.
//! - Only the owner manages sharing or deletes for everyone.

use crate::model::note::Note;
use crate::model::user::UserId;

/// Content access a user holds on a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteAccess {
    None,
    ReadWrite,
}

impl NoteAccess {
    pub fn is_granted(self) -> bool {
        matches!(self, Self::ReadWrite)
    }
}

/// What a remove request by a given user does to a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionEffect {
    /// User is neither owner nor shared.
    Forbidden,
    /// Owner: the row goes away for everyone.
    HardDelete,
    /// Shared user: only their own grant is dropped.
    SelfUnshare,
}

/// Returns the content access `user_id` holds on `note`.
pub fn can_access(note: &Note, user_id: UserId) -> NoteAccess {
    if note.is_owned_by(user_id) || note.is_shared_with(user_id) {
        NoteAccess::ReadWrite
    } else {
        NoteAccess::None
    }
}

/// Returns whether `user_id` may grant access to `note`.
pub fn can_manage_sharing(note: &Note, user_id: UserId) -> bool {
    note.is_owned_by(user_id)
}

/// Classifies a remove request.
pub fn deletion_effect(note: &Note, user_id: UserId) -> DeletionEffect {
    if note.is_owned_by(user_id) {
        DeletionEffect::HardDelete
    } else if note.is_shared_with(user_id) {
        DeletionEffect::SelfUnshare
    } else {
        DeletionEffect::Forbidden
    }
}
