//! # scribe-db
//!
//! SQLite database layer for scribenote.
//!
//! This crate provides:
//! - Connection pool management for file-backed and in-memory databases
//! - Schema bootstrap for the `notes` table
//! - The [`SqliteNoteStore`] implementation of the [`NoteStore`] contract,
//!   including mutation notifications on a broadcast bus
//!
//! ## Example
//!
//! ```rust,ignore
//! use scribe_db::SqliteNoteStore;
//! use scribe_core::{CreateNoteRequest, NoteStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SqliteNoteStore::open("notes.db").await?;
//!
//!     let note = store.insert(CreateNoteRequest {
//!         title: "Hello".to_string(),
//!         content: "world".to_string(),
//!         tags: vec!["greeting".to_string()],
//!         ..Default::default()
//!     }).await?;
//!
//!     println!("Created note: {}", note.id);
//!     Ok(())
//! }
//! ```

pub mod notes;
pub mod pool;
pub mod schema;

// Re-export core types
pub use scribe_core::*;

pub use notes::SqliteNoteStore;
pub use pool::{create_memory_pool, create_pool, create_pool_with_config, PoolConfig};
pub use schema::init_schema;

/// Escape LIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn test_escape_like_wildcards() {
        assert_eq!(escape_like("50%_done"), "50\\%\\_done");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
