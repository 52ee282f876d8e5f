//! Note store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide filtered, ordered note queries scoped to one viewer.
//! - Provide single-note writes whose row predicate embeds the ownership or
//!   sharing condition, so a stale check cannot widen a write.
//! - Own ordered tag and shared-with lists in `note_tags` / `note_shares`.
//!
//! # Invariants
//! - Visible notes are ordered by `sort_order ASC, id DESC`.
//! - Tag and shared-with lists keep their written order.
//! - Multi-statement writes run in one immediate transaction.

use crate::model::note::{Note, NoteDraft, NoteId, NotePatch};
use crate::model::user::UserId;
use crate::repo::{bool_to_int, ensure_tables, int_to_bool, unicode_contains, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const NOTE_SELECT_SQL: &str = "SELECT
    n.id,
    n.user_id,
    n.title,
    n.content,
    n.due_date,
    n.color,
    n.pinned,
    n.sort_order,
    u.username
FROM notes n
LEFT JOIN users u ON u.id = n.user_id";

/// Row predicate for `UPDATE notes`: `?1` is the note id, `?2` the viewer.
const ACCESSIBLE_NOTE_SQL: &str = "id = ?1
    AND (
        user_id = ?2
        OR EXISTS (
            SELECT 1
            FROM note_shares s
            WHERE s.note_id = notes.id AND s.user_id = ?2
        )
    )";

/// Query options for the per-viewer note list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteListQuery {
    /// Only notes this user owns or has been shared.
    pub visible_to: UserId,
    /// Case-insensitive title substring.
    pub title_contains: Option<String>,
    /// Exact tag membership.
    pub tag: Option<String>,
}

impl NoteListQuery {
    pub fn visible_to(user_id: UserId) -> Self {
        Self {
            visible_to: user_id,
            title_contains: None,
            tag: None,
        }
    }
}

/// Store capability the note service depends on.
///
/// The `*_if_*` writes return `false` when the row predicate matched
/// nothing (missing note or condition not met); they never error for that.
pub trait NoteRepository {
    /// Inserts a note with its tags and shares; returns the assigned id.
    fn insert_note(&self, draft: &NoteDraft) -> RepoResult<NoteId>;
    /// Gets one note by id regardless of viewer.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Lists notes visible to `query.visible_to` with optional filters.
    fn list_visible_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>>;
    /// Applies `patch` when `user_id` owns or is shared on the note.
    fn update_note_if_accessible(
        &self,
        id: NoteId,
        user_id: UserId,
        patch: &NotePatch,
    ) -> RepoResult<bool>;
    /// Replaces the shared-with list when `owner_id` owns the note.
    fn replace_shared_with_if_owner(
        &self,
        id: NoteId,
        owner_id: UserId,
        shared_with: &[UserId],
    ) -> RepoResult<bool>;
    /// Deletes the note row when `owner_id` owns it.
    fn delete_note_if_owner(&self, id: NoteId, owner_id: UserId) -> RepoResult<bool>;
    /// Drops `user_id` from the note's shared-with list.
    fn remove_share(&self, id: NoteId, user_id: UserId) -> RepoResult<bool>;
    /// Sets `sort_order` when `user_id` owns or is shared on the note.
    fn set_sort_order_if_accessible(
        &self,
        id: NoteId,
        user_id: UserId,
        sort_order: i64,
    ) -> RepoResult<bool>;
}

/// SQLite-backed note store.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["users", "notes", "note_tags", "note_shares"])?;
        Ok(Self { conn })
    }

    fn begin(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn insert_note(&self, draft: &NoteDraft) -> RepoResult<NoteId> {
        let tx = self.begin()?;
        tx.execute(
            "INSERT INTO notes (
                user_id,
                title,
                content,
                due_date,
                color,
                pinned,
                sort_order
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                draft.owner_id,
                draft.title.as_str(),
                draft.content.as_str(),
                draft.due_date.as_deref(),
                draft.color.as_str(),
                bool_to_int(draft.pinned),
                draft.sort_order,
            ],
        )?;
        let id = tx.last_insert_rowid();
        write_tags(&tx, id, &draft.tags)?;
        write_shares(&tx, id, &draft.shared_with)?;
        tx.commit()?;
        Ok(id)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE n.id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(self.conn, row)?));
        }
        Ok(None)
    }

    fn list_visible_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>> {
        let mut sql = format!(
            "{NOTE_SELECT_SQL}
             WHERE (
                n.user_id = ?
                OR EXISTS (
                    SELECT 1
                    FROM note_shares s
                    WHERE s.note_id = n.id AND s.user_id = ?
                )
             )"
        );
        let mut bind_values = vec![
            Value::Integer(query.visible_to),
            Value::Integer(query.visible_to),
        ];

        if let Some(text) = query.title_contains.as_deref() {
            let (predicate, pattern) = unicode_contains("n.title", text);
            sql.push_str(&format!(" AND {predicate}"));
            bind_values.push(Value::Text(pattern));
        }

        if let Some(tag) = query.tag.as_ref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM note_tags t
                    WHERE t.note_id = n.id AND t.tag = ?
                )",
            );
            bind_values.push(Value::Text(tag.clone()));
        }

        sql.push_str(" ORDER BY n.sort_order ASC, n.id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(self.conn, row)?);
        }
        Ok(notes)
    }

    fn update_note_if_accessible(
        &self,
        id: NoteId,
        user_id: UserId,
        patch: &NotePatch,
    ) -> RepoResult<bool> {
        let tx = self.begin()?;
        let accessible: i64 = tx.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM notes WHERE {ACCESSIBLE_NOTE_SQL});"),
            params![id, user_id],
            |row| row.get(0),
        )?;
        if accessible != 1 {
            return Ok(false);
        }

        let mut assignments: Vec<&str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(title) = patch.title.as_ref() {
            assignments.push("title = ?");
            bind_values.push(Value::Text(title.clone()));
        }
        if let Some(content) = patch.content.as_ref() {
            assignments.push("content = ?");
            bind_values.push(Value::Text(content.clone()));
        }
        if let Some(due_date) = patch.due_date.as_ref() {
            assignments.push("due_date = ?");
            bind_values.push(due_date.clone().map_or(Value::Null, Value::Text));
        }
        if let Some(color) = patch.color.as_ref() {
            assignments.push("color = ?");
            bind_values.push(Value::Text(color.clone()));
        }
        if let Some(pinned) = patch.pinned {
            assignments.push("pinned = ?");
            bind_values.push(Value::Integer(bool_to_int(pinned)));
        }
        if let Some(sort_order) = patch.sort_order {
            assignments.push("sort_order = ?");
            bind_values.push(Value::Integer(sort_order));
        }

        if !assignments.is_empty() {
            let sql = format!("UPDATE notes SET {} WHERE id = ?;", assignments.join(", "));
            bind_values.push(Value::Integer(id));
            tx.execute(&sql, params_from_iter(bind_values))?;
        }

        if let Some(tags) = patch.tags.as_ref() {
            tx.execute("DELETE FROM note_tags WHERE note_id = ?1;", [id])?;
            write_tags(&tx, id, tags)?;
        }

        tx.commit()?;
        Ok(true)
    }

    fn replace_shared_with_if_owner(
        &self,
        id: NoteId,
        owner_id: UserId,
        shared_with: &[UserId],
    ) -> RepoResult<bool> {
        let tx = self.begin()?;
        let owned: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM notes WHERE id = ?1 AND user_id = ?2);",
            params![id, owner_id],
            |row| row.get(0),
        )?;
        if owned != 1 {
            return Ok(false);
        }

        tx.execute("DELETE FROM note_shares WHERE note_id = ?1;", [id])?;
        write_shares(&tx, id, shared_with)?;
        tx.commit()?;
        Ok(true)
    }

    fn delete_note_if_owner(&self, id: NoteId, owner_id: UserId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM notes WHERE id = ?1 AND user_id = ?2;",
            params![id, owner_id],
        )?;
        Ok(changed > 0)
    }

    fn remove_share(&self, id: NoteId, user_id: UserId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM note_shares WHERE note_id = ?1 AND user_id = ?2;",
            params![id, user_id],
        )?;
        Ok(changed > 0)
    }

    fn set_sort_order_if_accessible(
        &self,
        id: NoteId,
        user_id: UserId,
        sort_order: i64,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            &format!("UPDATE notes SET sort_order = ?3 WHERE {ACCESSIBLE_NOTE_SQL};"),
            params![id, user_id, sort_order],
        )?;
        Ok(changed > 0)
    }
}

fn parse_note_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Note> {
    let id: NoteId = row.get("id")?;
    Ok(Note {
        id,
        owner_id: row.get("user_id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        tags: load_tags(conn, id)?,
        due_date: row.get("due_date")?,
        color: row.get("color")?,
        pinned: int_to_bool(row.get("pinned")?, "notes.pinned")?,
        shared_with: load_shared_with(conn, id)?,
        sort_order: row.get("sort_order")?,
        username: row.get("username")?,
    })
}

fn load_tags(conn: &Connection, note_id: NoteId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT tag
         FROM note_tags
         WHERE note_id = ?1
         ORDER BY position ASC;",
    )?;
    let tags = stmt
        .query_map([note_id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tags)
}

// No share rows means nobody else has access; there is no "unknown" state.
fn load_shared_with(conn: &Connection, note_id: NoteId) -> RepoResult<Vec<UserId>> {
    let mut stmt = conn.prepare(
        "SELECT user_id
         FROM note_shares
         WHERE note_id = ?1
         ORDER BY position ASC;",
    )?;
    let user_ids = stmt
        .query_map([note_id], |row| row.get::<_, UserId>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(user_ids)
}

fn write_tags(conn: &Connection, note_id: NoteId, tags: &[String]) -> RepoResult<()> {
    let mut stmt =
        conn.prepare("INSERT INTO note_tags (note_id, position, tag) VALUES (?1, ?2, ?3);")?;
    for (position, tag) in tags.iter().enumerate() {
        stmt.execute(params![note_id, position as i64, tag.as_str()])?;
    }
    Ok(())
}

fn write_shares(conn: &Connection, note_id: NoteId, user_ids: &[UserId]) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO note_shares (note_id, user_id, position) VALUES (?1, ?2, ?3);",
    )?;
    for (position, user_id) in user_ids.iter().enumerate() {
        stmt.execute(params![note_id, user_id, position as i64])?;
    }
    Ok(())
}
