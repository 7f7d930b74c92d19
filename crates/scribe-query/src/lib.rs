//! # scribe-query
//!
//! The incremental note query and filter engine.
//!
//! [`QueryEngine`] turns three independently changing inputs — a free-text
//! search string, a set of selected tags, and the live note store — into a
//! single, continuously updated, ordered result list:
//!
//! - search-text changes are debounced; a burst of keystrokes yields one
//!   derivation for the final text only
//! - switching the base query cancels the superseded one immediately; a
//!   stale result is never delivered after a newer one
//! - store mutations republish without the consumer re-issuing a request
//! - emissions are multicast with last-value caching, so late subscribers
//!   are served the cached snapshot synchronously
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scribe_db::SqliteNoteStore;
//! use scribe_query::QueryEngine;
//!
//! let store = Arc::new(SqliteNoteStore::open("notes.db").await?);
//! let engine = QueryEngine::new(store);
//! let mut feed = engine.subscribe().await?;
//!
//! engine.set_search_query("calculus");
//! while let Some(notes) = feed.next().await {
//!     println!("{} notes", notes.len());
//! }
//! ```

pub mod engine;
pub mod feed;
pub mod live;

pub use engine::{EngineConfig, QueryEngine};
pub use feed::NoteFeed;
pub use live::{LiveNotes, LiveTagUniverse, NoteQuery};
