//! Core traits for scribenote abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability. The query engine
//! depends only on [`NoteStore`]; live queries are composed from the
//! snapshot reads plus the [`NoteStore::changes`] notification bus.

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{CreateNoteRequest, Note, NoteType};

/// A mutation committed by the store.
///
/// Emitted on the store's broadcast bus after the write is durable, so a
/// receiver re-reading on receipt always observes store-confirmed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    Inserted { id: Uuid },
    Updated { id: Uuid },
    Deleted { id: Uuid },
}

impl StoreChange {
    /// The id of the note this change relates to.
    pub fn note_id(&self) -> Uuid {
        match self {
            StoreChange::Inserted { id }
            | StoreChange::Updated { id }
            | StoreChange::Deleted { id } => *id,
        }
    }
}

/// Durable keyed collection of note records.
///
/// Bulk reads are ordered by `created_at_utc` descending (most recent
/// first). Implementations own all `Note` records exclusively; callers
/// mutate only through this interface.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Insert a new note. The store assigns the id.
    async fn insert(&self, req: CreateNoteRequest) -> Result<Note>;

    /// Update an existing note in place. `created_at_utc` is preserved;
    /// `updated_at_utc` is bumped. Returns the stored record.
    async fn update(&self, note: &Note) -> Result<Note>;

    /// Delete a note. Deleting an id that is already gone is a no-op.
    async fn delete(&self, note: &Note) -> Result<()>;

    /// Fetch a single note by id.
    async fn fetch(&self, id: Uuid) -> Result<Option<Note>>;

    /// All notes, most recent first.
    async fn all_notes(&self) -> Result<Vec<Note>>;

    /// Notes whose title or content contains `needle`, case-insensitive,
    /// most recent first.
    async fn search_notes(&self, needle: &str) -> Result<Vec<Note>>;

    /// Notes whose *encoded* tag string contains `tag` as a substring,
    /// case-insensitive.
    ///
    /// This is a containment match on the stored comma-joined form, so
    /// `"CS 10"` also matches a note tagged `"CS 101"`. Callers needing
    /// exact tag filtering must match on decoded tags instead (see
    /// [`Note::has_any_tag`]).
    async fn notes_with_tag(&self, tag: &str) -> Result<Vec<Note>>;

    /// Notes of a given capture type, most recent first.
    async fn notes_of_type(&self, note_type: NoteType) -> Result<Vec<Note>>;

    /// One encoded tag string per note that has at least one tag. Input for
    /// building the filter-tag universe.
    async fn raw_tag_strings(&self) -> Result<Vec<String>>;

    /// Subscribe to mutation notifications.
    ///
    /// Receivers that fall behind get `Lagged` and should collapse the
    /// missed ticks into a single re-read.
    fn changes(&self) -> broadcast::Receiver<StoreChange>;
}
