//! # scribe-core
//!
//! Core types, traits, and abstractions for the scribenote library.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other scribenote crates depend on: the note domain model, the tag
//! codec, the error type, and the [`NoteStore`] contract the query engine is
//! built against.

pub mod defaults;
pub mod error;
pub mod models;
pub mod tags;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::{CreateNoteRequest, Note, NoteType};
pub use tags::{decode_tags, encode_tags, extract_unique_tags, normalize_tags};
pub use traits::{NoteStore, StoreChange};
