//! Note use-case service.
//!
//! # Responsibility
//! - Provide list/create/get/update/share/remove/reorder for notes.
//! - Apply the access policy to the freshly read note before each write.
//!
//! # Invariants
//! - Owner or shared user may read and update; only the owner shares or
//!   deletes for everyone.
//! - A shared user's remove only drops their own grant.
//! - Reorder writes are filtered per note by visibility and applied one by
//!   one without rollback; invisible ids are skipped silently.
//! - Store errors propagate unchanged and are never retried.

use crate::model::note::{NewNote, Note, NoteId, NotePatch};
use crate::model::user::UserId;
use crate::policy::{can_access, can_manage_sharing, deletion_effect, DeletionEffect};
use crate::repo::note_repo::{NoteListQuery, NoteRepository};
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::identity::IdentityResolver;
use log::{debug, info, warn};

/// Outcome of a remove request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// Owner removed the note for every user.
    DeletedForEveryone,
    /// Shared user dropped only their own access.
    RemovedForUser,
}

impl RemovalOutcome {
    pub fn message(self) -> &'static str {
        match self {
            Self::DeletedForEveryone => "Note deleted from system",
            Self::RemovedForUser => "Note removed for this user only",
        }
    }
}

/// Confirmation returned by [`NoteService::reorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderReceipt {
    /// Ids in the request.
    pub requested: usize,
    /// Writes that matched a note visible to the caller.
    pub applied: usize,
}

impl ReorderReceipt {
    pub fn message(&self) -> &'static str {
        "Notes reordered"
    }
}

/// Note service facade over a note store and an identity resolver.
pub struct NoteService<R: NoteRepository, I: IdentityResolver> {
    repo: R,
    identities: I,
}

impl<R: NoteRepository, I: IdentityResolver> NoteService<R, I> {
    pub fn new(repo: R, identities: I) -> Self {
        Self { repo, identities }
    }

    /// Lists notes owned by or shared with `user_id`.
    ///
    /// Ordered by `sort_order` ascending, then newest id first. Empty
    /// `search_text`/`tag` values are treated as absent.
    pub fn list_visible(
        &self,
        user_id: UserId,
        search_text: Option<&str>,
        tag: Option<&str>,
    ) -> ServiceResult<Vec<Note>> {
        let query = NoteListQuery {
            visible_to: user_id,
            title_contains: search_text
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            tag: tag.filter(|value| !value.is_empty()).map(str::to_string),
        };
        let notes = self.repo.list_visible_notes(&query)?;
        debug!(
            "event=note_list module=note_service status=ok user_id={user_id} count={} filtered={}",
            notes.len(),
            query.title_contains.is_some() || query.tag.is_some()
        );
        Ok(notes)
    }

    /// Creates an unshared, unpinned note sorted last.
    ///
    /// Fails with `InvalidInput` when title or content is blank.
    pub fn create(&self, request: NewNote) -> ServiceResult<Note> {
        let draft = request.into_draft()?;
        let owner_id = draft.owner_id;
        let id = self.repo.insert_note(&draft)?;
        info!("event=note_create module=note_service status=ok note_id={id} owner_id={owner_id}");

        self.read_back(id, "created note not found in read-back")
    }

    /// Gets one note the caller can access.
    pub fn get(&self, note_id: NoteId, user_id: UserId) -> ServiceResult<Note> {
        let note = self.fetch(note_id)?;
        if !can_access(&note, user_id).is_granted() {
            return Err(ServiceError::Forbidden("You cannot view this note"));
        }
        Ok(note)
    }

    /// Applies a partial update of mutable fields.
    ///
    /// Owner and shared users alike may update; ownership and sharing are
    /// not reachable through `patch`. Missing note and access are checked
    /// before the patch contents.
    pub fn update(
        &self,
        note_id: NoteId,
        user_id: UserId,
        patch: &NotePatch,
    ) -> ServiceResult<Note> {
        let note = self.fetch(note_id)?;
        if !can_access(&note, user_id).is_granted() {
            warn!(
                "event=note_update module=note_service status=forbidden note_id={note_id} user_id={user_id}"
            );
            return Err(ServiceError::Forbidden("You cannot update this note"));
        }
        patch.validate()?;

        if patch.is_empty() {
            return Ok(note);
        }

        if !self
            .repo
            .update_note_if_accessible(note_id, user_id, patch)?
        {
            return Err(self.classify_lost_write(
                note_id,
                user_id,
                "You cannot update this note",
            )?);
        }
        info!("event=note_update module=note_service status=ok note_id={note_id} user_id={user_id}");

        self.read_back(note_id, "updated note not found in read-back")
    }

    /// Grants `target_username` access to an owned note.
    ///
    /// Idempotent: an existing grant leaves the list untouched.
    pub fn share_with(
        &self,
        note_id: NoteId,
        owner_id: UserId,
        target_username: &str,
    ) -> ServiceResult<Note> {
        let target_id = self.identities.resolve_user_id(target_username)?;
        let note = self.fetch(note_id)?;
        if !can_manage_sharing(&note, owner_id) {
            warn!(
                "event=note_share module=note_service status=forbidden note_id={note_id} user_id={owner_id}"
            );
            return Err(ServiceError::Forbidden("You are not the owner of this note"));
        }
        if note.is_owned_by(target_id) {
            return Err(ServiceError::InvalidInput(
                "a note cannot be shared with its owner".to_string(),
            ));
        }
        if note.is_shared_with(target_id) {
            debug!("event=note_share module=note_service status=noop note_id={note_id}");
            return Ok(note);
        }

        let mut shared_with = note.shared_with;
        shared_with.push(target_id);
        if !self
            .repo
            .replace_shared_with_if_owner(note_id, owner_id, &shared_with)?
        {
            return Err(self.classify_lost_write(
                note_id,
                owner_id,
                "You are not the owner of this note",
            )?);
        }
        info!(
            "event=note_share module=note_service status=ok note_id={note_id} target_user_id={target_id} shared_count={}",
            shared_with.len()
        );

        self.read_back(note_id, "shared note not found in read-back")
    }

    /// Removes a note for the caller.
    ///
    /// The owner deletes the row for everyone; a shared user only drops
    /// their own grant.
    pub fn remove(&self, note_id: NoteId, user_id: UserId) -> ServiceResult<RemovalOutcome> {
        let note = self.fetch(note_id)?;
        let outcome = match deletion_effect(&note, user_id) {
            DeletionEffect::Forbidden => {
                warn!(
                    "event=note_remove module=note_service status=forbidden note_id={note_id} user_id={user_id}"
                );
                return Err(ServiceError::Forbidden(
                    "You do not have access to remove this note",
                ));
            }
            DeletionEffect::HardDelete => {
                if !self.repo.delete_note_if_owner(note_id, user_id)? {
                    return Err(ServiceError::NoteNotFound(note_id));
                }
                RemovalOutcome::DeletedForEveryone
            }
            DeletionEffect::SelfUnshare => {
                if !self.repo.remove_share(note_id, user_id)? {
                    return Err(self.classify_lost_write(
                        note_id,
                        user_id,
                        "You do not have access to remove this note",
                    )?);
                }
                RemovalOutcome::RemovedForUser
            }
        };

        info!(
            "event=note_remove module=note_service status=ok note_id={note_id} user_id={user_id} outcome={outcome:?}"
        );
        Ok(outcome)
    }

    /// Sets each listed note's `sort_order` to its zero-based position.
    ///
    /// Writes run sequentially; ids not visible to `user_id` match no row
    /// and are skipped. A store error stops the loop and earlier writes
    /// stay applied.
    pub fn reorder(
        &self,
        user_id: UserId,
        ordered_note_ids: &[NoteId],
    ) -> ServiceResult<ReorderReceipt> {
        let mut applied = 0;
        for (position, note_id) in ordered_note_ids.iter().enumerate() {
            if self
                .repo
                .set_sort_order_if_accessible(*note_id, user_id, position as i64)?
            {
                applied += 1;
            }
        }

        let receipt = ReorderReceipt {
            requested: ordered_note_ids.len(),
            applied,
        };
        info!(
            "event=note_reorder module=note_service status=ok user_id={user_id} requested={} applied={}",
            receipt.requested, receipt.applied
        );
        Ok(receipt)
    }

    fn fetch(&self, note_id: NoteId) -> ServiceResult<Note> {
        self.repo
            .get_note(note_id)?
            .ok_or(ServiceError::NoteNotFound(note_id))
    }

    fn read_back(&self, note_id: NoteId, details: &'static str) -> ServiceResult<Note> {
        self.repo
            .get_note(note_id)?
            .ok_or(ServiceError::InconsistentState(details))
    }

    // A conditional write matched nothing although the check passed: the
    // note changed in between. Re-read to report what the caller would see now.
    fn classify_lost_write(
        &self,
        note_id: NoteId,
        user_id: UserId,
        forbidden: &'static str,
    ) -> ServiceResult<ServiceError> {
        warn!(
            "event=note_write_race module=note_service status=lost note_id={note_id} user_id={user_id}"
        );
        Ok(match self.repo.get_note(note_id)? {
            None => ServiceError::NoteNotFound(note_id),
            Some(_) => ServiceError::Forbidden(forbidden),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteService, ServiceError};
    use crate::model::note::{Note, NoteDraft, NoteId, NotePatch};
    use crate::model::user::UserId;
    use crate::repo::note_repo::{NoteListQuery, NoteRepository};
    use crate::repo::{RepoError, RepoResult};
    use crate::service::error::ServiceResult;
    use crate::service::identity::IdentityResolver;
    use std::cell::RefCell;

    /// Records sort-order writes and fails on one chosen id.
    #[derive(Default)]
    struct FlakyOrderStore {
        fail_on: Option<NoteId>,
        writes: RefCell<Vec<(NoteId, i64)>>,
    }

    impl NoteRepository for FlakyOrderStore {
        fn insert_note(&self, _draft: &NoteDraft) -> RepoResult<NoteId> {
            unimplemented!()
        }
        fn get_note(&self, _id: NoteId) -> RepoResult<Option<Note>> {
            Ok(None)
        }
        fn list_visible_notes(&self, _query: &NoteListQuery) -> RepoResult<Vec<Note>> {
            Ok(Vec::new())
        }
        fn update_note_if_accessible(
            &self,
            _id: NoteId,
            _user_id: UserId,
            _patch: &NotePatch,
        ) -> RepoResult<bool> {
            unimplemented!()
        }
        fn replace_shared_with_if_owner(
            &self,
            _id: NoteId,
            _owner_id: UserId,
            _shared_with: &[UserId],
        ) -> RepoResult<bool> {
            unimplemented!()
        }
        fn delete_note_if_owner(&self, _id: NoteId, _owner_id: UserId) -> RepoResult<bool> {
            unimplemented!()
        }
        fn remove_share(&self, _id: NoteId, _user_id: UserId) -> RepoResult<bool> {
            unimplemented!()
        }
        fn set_sort_order_if_accessible(
            &self,
            id: NoteId,
            _user_id: UserId,
            sort_order: i64,
        ) -> RepoResult<bool> {
            if self.fail_on == Some(id) {
                return Err(RepoError::InvalidData("store offline".to_string()));
            }
            self.writes.borrow_mut().push((id, sort_order));
            Ok(true)
        }
    }

    struct NoIdentities;

    impl IdentityResolver for NoIdentities {
        fn resolve_user_id(&self, username: &str) -> ServiceResult<UserId> {
            Err(ServiceError::UsernameNotFound(username.to_string()))
        }
    }

    #[test]
    fn reorder_stops_at_store_error_without_rollback() {
        let store = FlakyOrderStore {
            fail_on: Some(7),
            ..FlakyOrderStore::default()
        };
        let service = NoteService::new(store, NoIdentities);

        let err = service.reorder(1, &[5, 6, 7, 8]).unwrap_err();
        assert!(matches!(err, ServiceError::Store(_)));
        assert_eq!(*service.repo.writes.borrow(), vec![(5, 0), (6, 1)]);
    }

    #[test]
    fn missing_note_fails_before_any_write() {
        let service = NoteService::new(FlakyOrderStore::default(), NoIdentities);

        assert!(matches!(
            service.remove(3, 1).unwrap_err(),
            ServiceError::NoteNotFound(3)
        ));
        assert!(matches!(
            service.update(3, 1, &NotePatch::default()).unwrap_err(),
            ServiceError::NoteNotFound(3)
        ));
    }

    #[test]
    fn blank_title_patch_on_missing_note_reports_not_found() {
        let service = NoteService::new(FlakyOrderStore::default(), NoIdentities);
        let patch = NotePatch {
            title: Some("   ".to_string()),
            ..NotePatch::default()
        };

        assert!(matches!(
            service.update(3, 1, &patch).unwrap_err(),
            ServiceError::NoteNotFound(3)
        ));
    }

    #[test]
    fn unknown_share_target_fails_before_note_lookup() {
        let service = NoteService::new(FlakyOrderStore::default(), NoIdentities);

        assert!(matches!(
            service.share_with(3, 1, "ghost").unwrap_err(),
            ServiceError::UsernameNotFound(_)
        ));
    }
}
