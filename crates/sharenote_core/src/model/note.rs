//! Note domain model.
//!
//! # Responsibility
//! - Define the note record returned to callers and its wire shape.
//! - Turn create requests into fully-defaulted drafts.
//! - Bound the set of fields a partial update may touch.
//!
//! # Invariants
//! - `owner_id` and `shared_with` are never writable through `NotePatch`.
//! - New notes start unpinned, unshared, and sorted last.
//! - Title is non-empty; content is non-empty at creation only.

use crate::model::user::UserId;
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned note identifier.
pub type NoteId = i64;

/// Sort order given to new notes so they list after reordered ones.
pub const SORT_ORDER_LAST: i64 = 999_999;

/// Placeholder color used when a create request carries none.
pub const DEFAULT_NOTE_COLOR: &str = "#ffffff";

/// Note as seen by callers.
///
/// Serialized in camelCase, matching the transport shape
/// `{id, ownerId, title, content, tags, dueDate, color, pinned,
/// sharedWithUserIds, sortOrder, username}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub owner_id: UserId,
    pub title: String,
    pub content: String,
    /// Ordered as written; may be empty.
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub pinned: bool,
    /// Ordered by grant time. Never contains `owner_id`.
    #[serde(rename = "sharedWithUserIds")]
    pub shared_with: Vec<UserId>,
    pub sort_order: i64,
    /// Owner's display name, present when the owner row could be joined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Note {
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    pub fn is_shared_with(&self, user_id: UserId) -> bool {
        self.shared_with.contains(&user_id)
    }
}

/// Validation failure for note input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Title is empty after trimming.
    EmptyTitle,
    /// Content is empty after trimming (create only).
    EmptyContent,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::EmptyContent => write!(f, "content must not be empty"),
        }
    }
}

impl Error for NoteValidationError {}

/// Create request for a note.
///
/// Optional fields fall back to defaults in [`NewNote::into_draft`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub owner_id: UserId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl NewNote {
    pub fn new(owner_id: UserId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            owner_id,
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Checks create-time requirements without consuming the request.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.title.trim().is_empty() {
            return Err(NoteValidationError::EmptyTitle);
        }
        if self.content.trim().is_empty() {
            return Err(NoteValidationError::EmptyContent);
        }
        Ok(())
    }

    /// Validates and applies creation defaults.
    ///
    /// Empty `color`/`due_date` strings count as absent.
    pub fn into_draft(self) -> Result<NoteDraft, NoteValidationError> {
        self.validate()?;
        Ok(NoteDraft {
            owner_id: self.owner_id,
            title: self.title,
            content: self.content,
            tags: self.tags.unwrap_or_default(),
            due_date: self.due_date.filter(|value| !value.is_empty()),
            color: self
                .color
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| DEFAULT_NOTE_COLOR.to_string()),
            pinned: false,
            shared_with: Vec::new(),
            sort_order: SORT_ORDER_LAST,
        })
    }
}

/// Fully-defaulted row handed to the store on create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub owner_id: UserId,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub due_date: Option<String>,
    pub color: String,
    pub pinned: bool,
    pub shared_with: Vec<UserId>,
    pub sort_order: i64,
}

/// Partial update over the mutable note fields.
///
/// Unknown keys are rejected at deserialization, so ownership and sharing
/// cannot be smuggled through this path. `dueDate: null` clears the date;
/// an absent key leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NotePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "present_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

impl NotePatch {
    /// True when the patch would not change any field.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.tags.is_none()
            && self.due_date.is_none()
            && self.color.is_none()
            && self.pinned.is_none()
            && self.sort_order.is_none()
    }

    /// Rejects a title that would become blank. Content may be emptied.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        match self.title.as_deref() {
            Some(title) if title.trim().is_empty() => Err(NoteValidationError::EmptyTitle),
            _ => Ok(()),
        }
    }
}

fn present_field<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}
