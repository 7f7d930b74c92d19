//! Note store implementation.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use scribe_core::{
    decode_tags, defaults, encode_tags, normalize_tags, CreateNoteRequest, Error, Note, NoteStore,
    NoteType, Result, StoreChange,
};

use crate::escape_like;
use crate::pool::{create_memory_pool, create_pool};
use crate::schema::init_schema;

const SELECT_COLUMNS: &str =
    "id, title, content, image_uri, tags, note_type, created_at_utc, updated_at_utc";

/// SQLite implementation of [`NoteStore`].
///
/// Every committed mutation is broadcast as a [`StoreChange`], which is what
/// turns the plain snapshot reads into live queries downstream.
pub struct SqliteNoteStore {
    pool: SqlitePool,
    changes: broadcast::Sender<StoreChange>,
}

impl SqliteNoteStore {
    /// Open (or create) a file-backed store and bootstrap the schema.
    pub async fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let pool = create_pool(path).await?;
        init_schema(&pool).await?;
        Ok(Self::from_pool(pool))
    }

    /// Open an in-memory store (tests, demos) and bootstrap the schema.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = create_memory_pool().await?;
        init_schema(&pool).await?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool. The schema must already be initialized (see
    /// [`crate::schema::init_schema`]).
    pub fn from_pool(pool: SqlitePool) -> Self {
        let (changes, _) = broadcast::channel(defaults::CHANGE_BUS_CAPACITY);
        Self { pool, changes }
    }

    /// Access the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn emit(&self, change: StoreChange) {
        // No receivers is fine; the send result only reports that.
        let _ = self.changes.send(change);
    }

    async fn select_ordered(&self, where_clause: &str, binds: &[String]) -> Result<Vec<Note>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM notes {where_clause} \
             ORDER BY created_at_utc DESC, id DESC"
        );
        let mut query = sqlx::query(&sql);
        for bind in binds {
            query = query.bind(bind.as_str());
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(note_from_row).collect()
    }
}

/// Case-insensitive containment pattern for a LIKE clause: lowercased,
/// wildcard-escaped, wrapped in `%`.
fn containment_pattern(needle: &str) -> String {
    format!("%{}%", escape_like(&needle.to_lowercase()))
}

fn note_from_row(row: &SqliteRow) -> Result<Note> {
    let id: String = row.try_get("id")?;
    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::Internal(format!("invalid note id in row: {e}")))?;
    let tags: String = row.try_get("tags")?;
    let note_type: String = row.try_get("note_type")?;
    Ok(Note {
        id,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        image_uri: row.try_get("image_uri")?,
        tags: decode_tags(&tags),
        note_type: NoteType::parse(&note_type),
        created_at_utc: timestamp_from_millis(row.try_get("created_at_utc")?)?,
        updated_at_utc: timestamp_from_millis(row.try_get("updated_at_utc")?)?,
    })
}

fn timestamp_from_millis(millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| Error::Internal(format!("timestamp out of range: {millis}")))
}

#[async_trait]
impl NoteStore for SqliteNoteStore {
    async fn insert(&self, req: CreateNoteRequest) -> Result<Note> {
        let id = Uuid::now_v7();
        // Truncate to the stored millisecond precision so the returned
        // record equals what a later fetch reads back.
        let created_at = req.created_at_utc.unwrap_or_else(Utc::now);
        let created_at = timestamp_from_millis(created_at.timestamp_millis())?;
        let updated_at = created_at;
        let tags = normalize_tags(&req.tags);

        sqlx::query(
            "INSERT INTO notes \
             (id, title, content, image_uri, tags, note_type, created_at_utc, updated_at_utc) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(id.to_string())
        .bind(&req.title)
        .bind(&req.content)
        .bind(&req.image_uri)
        .bind(encode_tags(&tags))
        .bind(req.note_type.as_str())
        .bind(created_at.timestamp_millis())
        .bind(updated_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        debug!(note_id = %id, "Inserted note");
        self.emit(StoreChange::Inserted { id });

        Ok(Note {
            id,
            title: req.title,
            content: req.content,
            image_uri: req.image_uri,
            tags,
            note_type: req.note_type,
            created_at_utc: created_at,
            updated_at_utc: updated_at,
        })
    }

    async fn update(&self, note: &Note) -> Result<Note> {
        let tags = normalize_tags(&note.tags);
        let updated_at = Utc::now();

        let result = sqlx::query(
            "UPDATE notes SET title = ?1, content = ?2, image_uri = ?3, tags = ?4, \
             note_type = ?5, updated_at_utc = ?6 WHERE id = ?7",
        )
        .bind(&note.title)
        .bind(&note.content)
        .bind(&note.image_uri)
        .bind(encode_tags(&tags))
        .bind(note.note_type.as_str())
        .bind(updated_at.timestamp_millis())
        .bind(note.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(note.id));
        }

        debug!(note_id = %note.id, "Updated note");
        self.emit(StoreChange::Updated { id: note.id });

        self.fetch(note.id)
            .await?
            .ok_or(Error::NoteNotFound(note.id))
    }

    async fn delete(&self, note: &Note) -> Result<()> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?1")
            .bind(note.id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            debug!(note_id = %note.id, "Deleted note");
            self.emit(StoreChange::Deleted { id: note.id });
        }
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Note>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM notes WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(note_from_row).transpose()
    }

    async fn all_notes(&self) -> Result<Vec<Note>> {
        self.select_ordered("", &[]).await
    }

    async fn search_notes(&self, needle: &str) -> Result<Vec<Note>> {
        self.select_ordered(
            r"WHERE (LOWER(title) LIKE ?1 ESCAPE '\' OR LOWER(content) LIKE ?1 ESCAPE '\')",
            &[containment_pattern(needle)],
        )
        .await
    }

    async fn notes_with_tag(&self, tag: &str) -> Result<Vec<Note>> {
        self.select_ordered(
            r"WHERE tags != '' AND LOWER(tags) LIKE ?1 ESCAPE '\'",
            &[containment_pattern(tag)],
        )
        .await
    }

    async fn notes_of_type(&self, note_type: NoteType) -> Result<Vec<Note>> {
        self.select_ordered("WHERE note_type = ?1", &[note_type.as_str().to_string()])
            .await
    }

    async fn raw_tag_strings(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT tags FROM notes WHERE tags IS NOT NULL AND tags != ''")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("tags").map_err(Error::from))
            .collect()
    }

    fn changes(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}
