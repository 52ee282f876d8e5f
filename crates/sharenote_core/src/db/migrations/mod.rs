//! Ordered schema scripts for the notes store.
//!
//! | Version | Script                         | Adds                                  |
//! |---------|--------------------------------|---------------------------------------|
//! | 1       | `0001_init.sql`                | `users`, `notes`                      |
//! | 2       | `0002_note_tags_shares.sql`    | ordered `note_tags`, `note_shares`    |
//! | 3       | `0003_visibility_indexes.sql`  | owner/share/tag lookup indexes        |
//!
//! The applied version lives in `PRAGMA user_version`. Pending scripts run
//! in one transaction.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    script: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        script: include_str!("0001_init.sql"),
    },
    SchemaStep {
        version: 2,
        script: include_str!("0002_note_tags_shares.sql"),
    },
    SchemaStep {
        version: 3,
        script: include_str!("0003_visibility_indexes.sql"),
    },
];

/// Newest schema version this build can create.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Schema version stamped on the connected database; `0` when fresh.
pub fn current_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Brings the notes schema up to [`latest_version`].
///
/// Fails with `UnsupportedSchemaVersion` when the file was written by a
/// newer build.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current = current_version(conn)?;
    let latest = latest_version();

    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }

    if current == latest {
        return Ok(());
    }

    let pending: Vec<&SchemaStep> = SCHEMA_STEPS
        .iter()
        .filter(|step| step.version > current)
        .collect();
    let tx = conn.transaction()?;
    for step in &pending {
        tx.execute_batch(step.script)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", step.version))?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={current} to_version={latest} steps={}",
        pending.len()
    );
    Ok(())
}
