//! Schema bootstrap for the notes database.
//!
//! The schema is a single table. Bootstrap is idempotent so callers can run
//! it on every open.

use sqlx::sqlite::SqlitePool;

use scribe_core::Result;

/// Timestamps are stored as milliseconds since the Unix epoch. Tags are
/// stored in their normalized comma-joined encoding.
const CREATE_NOTES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS notes (
    id              TEXT PRIMARY KEY,
    title           TEXT NOT NULL DEFAULT '',
    content         TEXT NOT NULL DEFAULT '',
    image_uri       TEXT,
    tags            TEXT NOT NULL DEFAULT '',
    note_type       TEXT NOT NULL DEFAULT 'text',
    created_at_utc  INTEGER NOT NULL,
    updated_at_utc  INTEGER NOT NULL
)
"#;

/// Bulk reads are always ordered by creation time descending.
const CREATE_CREATED_AT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_notes_created_at ON notes (created_at_utc DESC)";

/// Create the notes table and its indexes if they do not exist yet.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(CREATE_NOTES_TABLE).execute(pool).await?;
    sqlx::query(CREATE_CREATED_AT_INDEX).execute(pool).await?;
    Ok(())
}
