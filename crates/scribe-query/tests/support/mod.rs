//! Shared test support: a scripted in-memory note store and feed helpers.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use scribe_core::{
    defaults, encode_tags, normalize_tags, CreateNoteRequest, Error, Note, NoteStore, NoteType,
    Result, StoreChange,
};
use scribe_query::NoteFeed;

/// One base-query read served by the store, in order of arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadKind {
    All,
    Search(String),
}

/// In-memory [`NoteStore`] that records which reads it served and can delay
/// individual searches to simulate a slow store.
pub struct StubStore {
    notes: Mutex<Vec<Note>>,
    reads: Mutex<Vec<ReadKind>>,
    search_delays: Mutex<HashMap<String, Duration>>,
    changes: broadcast::Sender<StoreChange>,
}

impl StubStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(defaults::CHANGE_BUS_CAPACITY);
        Self {
            notes: Mutex::new(Vec::new()),
            reads: Mutex::new(Vec::new()),
            search_delays: Mutex::new(HashMap::new()),
            changes,
        }
    }

    /// Seed a note directly, bypassing the trait (no change event).
    pub fn seed(&self, title: &str, content: &str, tags: &[&str], created_ms: i64) -> Note {
        let note = make_note(title, content, tags, created_ms);
        self.notes.lock().unwrap().push(note.clone());
        note
    }

    /// Make searches for `needle` take `delay` before returning.
    pub fn set_search_delay(&self, needle: &str, delay: Duration) {
        self.search_delays
            .lock()
            .unwrap()
            .insert(needle.to_string(), delay);
    }

    /// Every base-query read served so far.
    pub fn reads(&self) -> Vec<ReadKind> {
        self.reads.lock().unwrap().clone()
    }

    pub fn search_read_count(&self) -> usize {
        self.reads()
            .iter()
            .filter(|r| matches!(r, ReadKind::Search(_)))
            .count()
    }

    fn record(&self, read: ReadKind) {
        self.reads.lock().unwrap().push(read);
    }

    fn emit(&self, change: StoreChange) {
        let _ = self.changes.send(change);
    }

    fn sorted_desc(mut notes: Vec<Note>) -> Vec<Note> {
        notes.sort_by(|a, b| {
            b.created_at_utc
                .cmp(&a.created_at_utc)
                .then(b.id.cmp(&a.id))
        });
        notes
    }
}

#[async_trait]
impl NoteStore for StubStore {
    async fn insert(&self, req: CreateNoteRequest) -> Result<Note> {
        let created = req.created_at_utc.unwrap_or_else(Utc::now);
        let note = Note {
            id: Uuid::now_v7(),
            title: req.title,
            content: req.content,
            image_uri: req.image_uri,
            tags: normalize_tags(&req.tags),
            note_type: req.note_type,
            created_at_utc: created,
            updated_at_utc: created,
        };
        self.notes.lock().unwrap().push(note.clone());
        self.emit(StoreChange::Inserted { id: note.id });
        Ok(note)
    }

    async fn update(&self, note: &Note) -> Result<Note> {
        let mut notes = self.notes.lock().unwrap();
        let slot = notes
            .iter_mut()
            .find(|n| n.id == note.id)
            .ok_or(Error::NoteNotFound(note.id))?;
        *slot = Note {
            updated_at_utc: Utc::now(),
            created_at_utc: slot.created_at_utc,
            tags: normalize_tags(&note.tags),
            ..note.clone()
        };
        let updated = slot.clone();
        drop(notes);
        self.emit(StoreChange::Updated { id: note.id });
        Ok(updated)
    }

    async fn delete(&self, note: &Note) -> Result<()> {
        let removed = {
            let mut notes = self.notes.lock().unwrap();
            let before = notes.len();
            notes.retain(|n| n.id != note.id);
            notes.len() < before
        };
        if removed {
            self.emit(StoreChange::Deleted { id: note.id });
        }
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Note>> {
        Ok(self.notes.lock().unwrap().iter().find(|n| n.id == id).cloned())
    }

    async fn all_notes(&self) -> Result<Vec<Note>> {
        self.record(ReadKind::All);
        Ok(Self::sorted_desc(self.notes.lock().unwrap().clone()))
    }

    async fn search_notes(&self, needle: &str) -> Result<Vec<Note>> {
        self.record(ReadKind::Search(needle.to_string()));
        let delay = self.search_delays.lock().unwrap().get(needle).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let needle = needle.to_lowercase();
        let notes = self.notes.lock().unwrap().clone();
        Ok(Self::sorted_desc(
            notes
                .into_iter()
                .filter(|n| {
                    n.title.to_lowercase().contains(&needle)
                        || n.content.to_lowercase().contains(&needle)
                })
                .collect(),
        ))
    }

    async fn notes_with_tag(&self, tag: &str) -> Result<Vec<Note>> {
        let tag = tag.to_lowercase();
        let notes = self.notes.lock().unwrap().clone();
        Ok(Self::sorted_desc(
            notes
                .into_iter()
                .filter(|n| encode_tags(&n.tags).to_lowercase().contains(&tag))
                .collect(),
        ))
    }

    async fn notes_of_type(&self, note_type: NoteType) -> Result<Vec<Note>> {
        let notes = self.notes.lock().unwrap().clone();
        Ok(Self::sorted_desc(
            notes.into_iter().filter(|n| n.note_type == note_type).collect(),
        ))
    }

    async fn raw_tag_strings(&self) -> Result<Vec<String>> {
        Ok(self
            .notes
            .lock()
            .unwrap()
            .iter()
            .filter(|n| !n.tags.is_empty())
            .map(|n| encode_tags(&n.tags))
            .collect())
    }

    fn changes(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

pub fn make_note(title: &str, content: &str, tags: &[&str], created_ms: i64) -> Note {
    let at = Utc.timestamp_millis_opt(created_ms).single().unwrap();
    Note {
        id: Uuid::now_v7(),
        title: title.to_string(),
        content: content.to_string(),
        image_uri: None,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        note_type: NoteType::Text,
        created_at_utc: at,
        updated_at_utc: at,
    }
}

pub fn ids(notes: &[Note]) -> Vec<Uuid> {
    notes.iter().map(|n| n.id).collect()
}

/// Consume emissions until one carries exactly `want` (in order). Callers
/// wrap this in a timeout for both positive and negative assertions.
pub async fn wait_for_ids(feed: &mut NoteFeed, want: &[Uuid]) {
    loop {
        let snapshot = feed.next().await.expect("engine stopped while waiting");
        if ids(&snapshot) == want {
            return;
        }
    }
}
