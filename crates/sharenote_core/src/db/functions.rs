//! Application-defined SQL functions.
//!
//! SQLite's built-in `LIKE` and `lower()` fold ASCII letters only, so
//! case-insensitive text search compares through `unicode_lower` instead.

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

/// SQL name of the full Unicode lowercase function.
pub const UNICODE_LOWER: &str = "unicode_lower";

/// Registers every application function on `conn`.
pub fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        UNICODE_LOWER,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|text| text.to_lowercase()))
        },
    )
}
