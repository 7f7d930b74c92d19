//! Core data models for scribenote.
//!
//! These types are shared across all scribenote crates and represent the
//! note domain entities.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// NOTE TYPES
// =============================================================================

/// Discriminator for how a note was captured.
///
/// The query engine treats this as opaque payload; it only matters to the
/// capture and rendering layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    /// Typed note.
    Text,
    /// Digital handwritten note.
    Handwritten,
    /// Note created from an image via OCR.
    Image,
}

impl NoteType {
    /// Storage representation of the discriminator.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::Text => "text",
            NoteType::Handwritten => "handwritten",
            NoteType::Image => "image",
        }
    }

    /// Parse the storage representation. Unknown values fall back to `Text`
    /// rather than failing the whole row.
    pub fn parse(value: &str) -> Self {
        match value {
            "handwritten" => NoteType::Handwritten,
            "image" => NoteType::Image,
            _ => NoteType::Text,
        }
    }
}

impl Default for NoteType {
    fn default() -> Self {
        NoteType::Text
    }
}

/// A persisted note record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Unique id, assigned by the store at insert; immutable thereafter.
    pub id: Uuid,
    pub title: String,
    /// Typed content or extracted text.
    pub content: String,
    /// URI of the original image, if applicable.
    pub image_uri: Option<String>,
    /// Decoded tag set; members are non-empty and trimmed.
    pub tags: Vec<String>,
    pub note_type: NoteType,
    /// Set at creation; never touched by updates.
    pub created_at_utc: DateTime<Utc>,
    /// Bumped on every update.
    pub updated_at_utc: DateTime<Utc>,
}

impl Note {
    /// Whether this note's tag set intersects `selected` (OR semantics).
    ///
    /// Matching is exact on decoded tags, never substring on the encoded
    /// form, so `"CS 10"` does not match a note tagged `"CS 101"`.
    pub fn has_any_tag(&self, selected: &HashSet<String>) -> bool {
        self.tags.iter().any(|tag| selected.contains(tag))
    }
}

/// Request for creating a new note.
#[derive(Debug, Clone, Default)]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
    pub image_uri: Option<String>,
    pub tags: Vec<String>,
    pub note_type: NoteType,
    /// Explicit creation timestamp; `None` means "now". Used by importers
    /// that preserve the capture time of migrated notes.
    pub created_at_utc: Option<DateTime<Utc>>,
}
