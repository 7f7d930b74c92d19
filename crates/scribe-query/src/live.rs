//! Live queries composed from store snapshot reads and change notifications.
//!
//! The store contract exposes plain ordered reads plus a mutation broadcast
//! bus. A live query pairs the two: emit the initial snapshot, then re-read
//! and re-emit on every mutation. Receivers that fall behind the bus collapse
//! the missed ticks into a single refresh, so a burst of writes costs one
//! re-read, not one per write.

use std::sync::Arc;

use futures::Stream;
use tokio::sync::broadcast;
use tracing::warn;

use scribe_core::{extract_unique_tags, Note, NoteStore, StoreChange};

/// The unfiltered base query selected before tag filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteQuery {
    /// All notes, most recent first.
    All,
    /// Case-insensitive substring match over title or content.
    Matching(String),
}

impl NoteQuery {
    /// Select the base query for a search text: blank (after trim) means all
    /// notes, anything else a substring search.
    pub fn for_search_text(text: &str) -> Self {
        if text.trim().is_empty() {
            NoteQuery::All
        } else {
            NoteQuery::Matching(text.to_string())
        }
    }
}

/// Wait for the next mutation on `changes`, then drain whatever else is
/// already queued. `Lagged` counts as a change. Returns `None` when the bus
/// has closed (store dropped).
async fn next_change(changes: &mut broadcast::Receiver<StoreChange>) -> Option<()> {
    use broadcast::error::{RecvError, TryRecvError};

    match changes.recv().await {
        Ok(_) | Err(RecvError::Lagged(_)) => {}
        Err(RecvError::Closed) => return None,
    }
    loop {
        match changes.try_recv() {
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
    Some(())
}

/// A live sequence of note-list snapshots for one base query.
///
/// Store-confirmed state only: every snapshot is a fresh read issued after
/// the mutation that triggered it was committed. A failed read degrades to an
/// empty snapshot rather than surfacing the error.
pub struct LiveNotes {
    store: Arc<dyn NoteStore>,
    query: NoteQuery,
    changes: broadcast::Receiver<StoreChange>,
    primed: bool,
}

impl LiveNotes {
    pub fn new(store: Arc<dyn NoteStore>, query: NoteQuery) -> Self {
        let changes = store.changes();
        Self {
            store,
            query,
            changes,
            primed: false,
        }
    }

    /// The base query this sequence is bound to.
    pub fn query(&self) -> &NoteQuery {
        &self.query
    }

    /// Next snapshot: the initial read on the first call, then one re-read
    /// per store mutation. Returns `None` once the store's change bus closes.
    pub async fn next(&mut self) -> Option<Vec<Note>> {
        if self.primed {
            next_change(&mut self.changes).await?;
        }
        self.primed = true;
        Some(self.read().await)
    }

    /// Adapt into a [`futures::Stream`] of snapshots.
    pub fn into_stream(self) -> impl Stream<Item = Vec<Note>> {
        futures::stream::unfold(self, |mut live| async move {
            live.next().await.map(|notes| (notes, live))
        })
    }

    async fn read(&self) -> Vec<Note> {
        let result = match &self.query {
            NoteQuery::All => self.store.all_notes().await,
            NoteQuery::Matching(needle) => self.store.search_notes(needle).await,
        };
        match result {
            Ok(notes) => notes,
            Err(error) => {
                warn!(%error, query = ?self.query, "base query failed, emitting empty snapshot");
                Vec::new()
            }
        }
    }
}

/// A live sequence of the tag universe: every tag seen across stored notes,
/// de-duplicated, first-seen order. Drives the filter-tag picker.
pub struct LiveTagUniverse {
    store: Arc<dyn NoteStore>,
    changes: broadcast::Receiver<StoreChange>,
    primed: bool,
}

impl LiveTagUniverse {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        let changes = store.changes();
        Self {
            store,
            changes,
            primed: false,
        }
    }

    /// Next universe snapshot, same cadence as [`LiveNotes::next`].
    pub async fn next(&mut self) -> Option<Vec<String>> {
        if self.primed {
            next_change(&mut self.changes).await?;
        }
        self.primed = true;
        let raw = match self.store.raw_tag_strings().await {
            Ok(raw) => raw,
            Err(error) => {
                warn!(%error, "tag projection failed, emitting empty universe");
                Vec::new()
            }
        };
        Some(extract_unique_tags(raw))
    }

    /// Adapt into a [`futures::Stream`] of tag universes.
    pub fn into_stream(self) -> impl Stream<Item = Vec<String>> {
        futures::stream::unfold(self, |mut live| async move {
            live.next().await.map(|tags| (tags, live))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_search_selects_all_notes() {
        assert_eq!(NoteQuery::for_search_text(""), NoteQuery::All);
        assert_eq!(NoteQuery::for_search_text("   "), NoteQuery::All);
        assert_eq!(NoteQuery::for_search_text("\t\n"), NoteQuery::All);
    }

    #[test]
    fn test_nonblank_search_selects_substring_match() {
        assert_eq!(
            NoteQuery::for_search_text("cat"),
            NoteQuery::Matching("cat".to_string())
        );
        // Inner whitespace is part of the needle, only fully-blank text
        // falls back to the all-notes query.
        assert_eq!(
            NoteQuery::for_search_text(" cat "),
            NoteQuery::Matching(" cat ".to_string())
        );
    }
}
