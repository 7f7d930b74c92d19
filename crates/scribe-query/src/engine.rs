//! The query engine: derives a continuously updated, ordered note list from
//! the current search text, the selected tag set, and the live note store.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use scribe_core::{defaults, Error, Note, NoteStore, Result};

use crate::feed::NoteFeed;
use crate::live::{LiveNotes, LiveTagUniverse, NoteQuery};

/// Configuration for the query engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Quiet period applied to search-text changes. A newer keystroke inside
    /// the window discards the pending text; only the latest proceeds.
    pub search_debounce: Duration,
    /// How long the derivation pipeline stays live after the last subscriber
    /// detaches. Within this window a new subscriber reattaches with no
    /// recomputation gap.
    pub subscriber_grace: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            search_debounce: Duration::from_millis(defaults::SEARCH_DEBOUNCE_MS),
            subscriber_grace: Duration::from_millis(defaults::SUBSCRIBER_GRACE_MS),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `SCRIBE_SEARCH_DEBOUNCE_MS` | `300` | Search-text quiet period |
    /// | `SCRIBE_SUBSCRIBER_GRACE_MS` | `5000` | Pipeline keep-alive after the last subscriber |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let search_debounce = std::env::var("SCRIBE_SEARCH_DEBOUNCE_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.search_debounce);

        let subscriber_grace = std::env::var("SCRIBE_SUBSCRIBER_GRACE_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.subscriber_grace);

        Self {
            search_debounce,
            subscriber_grace,
        }
    }

    /// Set the search-text quiet period.
    pub fn with_search_debounce(mut self, debounce: Duration) -> Self {
        self.search_debounce = debounce;
        self
    }

    /// Set the no-subscriber keep-alive window.
    pub fn with_subscriber_grace(mut self, grace: Duration) -> Self {
        self.subscriber_grace = grace;
        self
    }
}

/// Input changes and subscription lifecycle, serialized through the driver.
pub(crate) enum Command {
    SetSearch(String),
    SetTags(HashSet<String>),
    Attach(oneshot::Sender<watch::Receiver<Vec<Note>>>),
    Detach,
    Shutdown,
}

/// Handle to a running query engine.
///
/// Cheap to clone; all clones address the same driver task. Setters are
/// fire-and-forget and safe to call from any context — the driver serializes
/// them before they reach the derivation pipeline. The driver exits when
/// every handle is dropped or [`QueryEngine::shutdown`] is called.
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn NoteStore>,
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl QueryEngine {
    /// Create an engine with default configuration over an injected store.
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    /// Create an engine with explicit configuration.
    pub fn with_config(store: Arc<dyn NoteStore>, config: EngineConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (snap_tx, snap_rx) = mpsc::channel(defaults::SNAPSHOT_CHANNEL_CAPACITY);
        let (out, _) = watch::channel(Vec::new());

        let driver = Driver {
            store: store.clone(),
            config,
            cmd_rx,
            snap_tx,
            snap_rx,
            out,
            settled_search: String::new(),
            pending_search: None,
            debounce_deadline: None,
            selected_tags: HashSet::new(),
            generation: 0,
            pipeline: None,
            active_pair: None,
            subscribers: 0,
            park_deadline: None,
        };
        tokio::spawn(driver.run());

        Self { store, cmd_tx }
    }

    /// Replace the current search text.
    ///
    /// The derivation runs after the text has been quiet for the debounce
    /// window; a burst of calls yields one derivation for the last value.
    pub fn set_search_query(&self, text: impl Into<String>) {
        let _ = self.cmd_tx.send(Command::SetSearch(text.into()));
    }

    /// Replace the tag filter atomically with the full desired set (clearing
    /// passes the empty set). Takes effect immediately — tag changes are
    /// discrete user actions, not keystrokes.
    pub fn set_selected_tags(&self, tags: HashSet<String>) {
        let _ = self.cmd_tx.send(Command::SetTags(tags));
    }

    /// Subscribe to the live result list.
    ///
    /// The feed's first emission is the cached snapshot; subsequent emissions
    /// follow input changes and store mutations. All concurrent feeds share
    /// the same upstream derivation.
    pub async fn subscribe(&self) -> Result<NoteFeed> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Attach(reply_tx))
            .map_err(|_| Error::EngineStopped("driver task exited".into()))?;
        let rx = reply_rx
            .await
            .map_err(|_| Error::EngineStopped("driver task exited".into()))?;
        Ok(NoteFeed::new(rx, self.cmd_tx.clone()))
    }

    /// Forward a delete to the store.
    ///
    /// The result list is not touched here; the store's change notification
    /// drives the next emission, so the displayed list only ever reflects
    /// store-confirmed state.
    pub async fn delete_note(&self, note: &Note) -> Result<()> {
        self.store.delete(note).await
    }

    /// Live universe of tags available for filtering, built from the
    /// store's raw tag projection.
    pub fn observe_available_tags(&self) -> LiveTagUniverse {
        LiveTagUniverse::new(self.store.clone())
    }

    /// Stop the driver task. Outstanding feeds observe end-of-stream; later
    /// setter calls are ignored and `subscribe` fails.
    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
    }
}

/// The settled input pair a pipeline generation is derived from.
type DerivationPair = (NoteQuery, HashSet<String>);

/// Single owner of all engine state. Commands, debounce expiry, pipeline
/// snapshots, and the keep-alive timer are serialized through one select
/// loop, so no locking is needed anywhere.
struct Driver {
    store: Arc<dyn NoteStore>,
    config: EngineConfig,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    /// Snapshots arriving from the active pipeline, tagged with the
    /// generation that produced them.
    snap_tx: mpsc::Sender<(u64, Vec<Note>)>,
    snap_rx: mpsc::Receiver<(u64, Vec<Note>)>,
    /// Last-value cache and multicast fan-out to feeds.
    out: watch::Sender<Vec<Note>>,
    settled_search: String,
    pending_search: Option<String>,
    debounce_deadline: Option<Instant>,
    selected_tags: HashSet<String>,
    generation: u64,
    pipeline: Option<JoinHandle<()>>,
    active_pair: Option<DerivationPair>,
    subscribers: usize,
    park_deadline: Option<Instant>,
}

impl Driver {
    async fn run(mut self) {
        info!(
            debounce_ms = self.config.search_debounce.as_millis() as u64,
            grace_ms = self.config.subscriber_grace.as_millis() as u64,
            "Query engine started"
        );

        loop {
            // Disabled select arms still evaluate their expression, hence
            // the fallback deadline; the guard keeps them from being polled.
            let debounce_at = self.debounce_deadline.unwrap_or_else(Instant::now);
            let park_at = self.park_deadline.unwrap_or_else(Instant::now);

            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(Command::SetSearch(text)) => self.on_set_search(text),
                        Some(Command::SetTags(tags)) => self.on_set_tags(tags),
                        Some(Command::Attach(reply)) => self.on_attach(reply),
                        Some(Command::Detach) => self.on_detach(),
                        Some(Command::Shutdown) | None => break,
                    }
                }
                Some((generation, notes)) = self.snap_rx.recv() => {
                    // A snapshot from a superseded generation is dropped on
                    // arrival, even if its read resolved before the
                    // replacement's first emission.
                    if generation == self.generation {
                        self.publish(notes);
                    }
                }
                _ = sleep_until(debounce_at), if self.debounce_deadline.is_some() => {
                    self.debounce_deadline = None;
                    self.settle_pending_search();
                }
                _ = sleep_until(park_at), if self.park_deadline.is_some() => {
                    self.park_deadline = None;
                    self.park_pipeline();
                }
            }
        }

        self.abort_pipeline();
        info!("Query engine stopped");
    }

    fn on_set_search(&mut self, text: String) {
        // Overwrite, never queue: the pending slot holds at most the latest
        // text, and each keystroke resets the timer.
        self.pending_search = Some(text);
        self.debounce_deadline = Some(Instant::now() + self.config.search_debounce);
    }

    fn settle_pending_search(&mut self) {
        let Some(text) = self.pending_search.take() else {
            return;
        };
        debug!(query = %text, "search text settled");
        self.settled_search = text;
        self.resettle();
    }

    fn on_set_tags(&mut self, tags: HashSet<String>) {
        // No debounce: pairs with the latest settled search text right away.
        self.selected_tags = tags;
        self.resettle();
    }

    fn on_attach(&mut self, reply: oneshot::Sender<watch::Receiver<Vec<Note>>>) {
        self.subscribers += 1;
        self.park_deadline = None;
        if self.pipeline.is_none() {
            self.restart_pipeline(self.current_pair());
        }
        if reply.send(self.out.subscribe()).is_err() {
            // Subscriber gave up before the reply; undo the attach.
            self.on_detach();
        }
    }

    fn on_detach(&mut self) {
        self.subscribers = self.subscribers.saturating_sub(1);
        if self.subscribers == 0 && self.pipeline.is_some() {
            self.park_deadline = Some(Instant::now() + self.config.subscriber_grace);
        }
    }

    fn current_pair(&self) -> DerivationPair {
        (
            NoteQuery::for_search_text(&self.settled_search),
            self.selected_tags.clone(),
        )
    }

    /// Re-derive for the current settled pair, unless it is the pair the
    /// active pipeline was already built from (value conflation).
    fn resettle(&mut self) {
        let pair = self.current_pair();
        if self.active_pair.as_ref() == Some(&pair) {
            return;
        }
        self.restart_pipeline(pair);
    }

    /// Switch-latest: tear down the previous base-query subscription and
    /// spawn a new one for `pair`. At most one subscription is live; the
    /// generation tag fences off anything the old one already produced.
    fn restart_pipeline(&mut self, pair: DerivationPair) {
        self.abort_pipeline();
        self.generation = self.generation.wrapping_add(1);

        if self.subscribers == 0 && self.park_deadline.is_none() {
            // Parked: inputs changed while nobody is watching. The next
            // attach rebuilds from the then-current pair.
            self.active_pair = None;
            return;
        }

        let (query, _) = &pair;
        debug!(generation = self.generation, query = ?query, "base query switched");

        let mut live = LiveNotes::new(self.store.clone(), query.clone());
        let snap_tx = self.snap_tx.clone();
        let generation = self.generation;
        self.pipeline = Some(tokio::spawn(async move {
            while let Some(snapshot) = live.next().await {
                if snap_tx.send((generation, snapshot)).await.is_err() {
                    break;
                }
            }
        }));
        self.active_pair = Some(pair);
    }

    fn abort_pipeline(&mut self) {
        if let Some(task) = self.pipeline.take() {
            task.abort();
        }
    }

    /// Release the store subscription after the grace period with no
    /// subscribers. The cached snapshot stays in the watch channel.
    fn park_pipeline(&mut self) {
        debug!("no subscribers within grace period, parking pipeline");
        self.abort_pipeline();
        self.active_pair = None;
    }

    fn publish(&mut self, notes: Vec<Note>) {
        let filtered = filter_by_tags(notes, &self.selected_tags);
        debug!(result_count = filtered.len(), "publishing result snapshot");
        self.out.send_replace(filtered);
    }
}

/// Apply the tag filter to a base-query snapshot: an empty selection passes
/// the snapshot through unchanged; otherwise keep notes whose tag set
/// intersects the selection (OR across selected tags).
fn filter_by_tags(notes: Vec<Note>, selected: &HashSet<String>) -> Vec<Note> {
    if selected.is_empty() {
        return notes;
    }
    notes
        .into_iter()
        .filter(|note| note.has_any_tag(selected))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use scribe_core::NoteType;
    use uuid::Uuid;

    fn note(title: &str, tags: &[&str]) -> Note {
        let at = Utc.timestamp_millis_opt(100).single().unwrap();
        Note {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: String::new(),
            image_uri: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            note_type: NoteType::Text,
            created_at_utc: at,
            updated_at_utc: at,
        }
    }

    fn selection(tags: &[&str]) -> HashSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_empty_selection_passes_through_unchanged() {
        let notes = vec![note("a", &["x"]), note("b", &[])];
        let filtered = filter_by_tags(notes.clone(), &HashSet::new());
        assert_eq!(filtered, notes);
    }

    #[test]
    fn test_or_semantics_keeps_any_intersection() {
        let keep = note("keep", &["x", "y"]);
        let drop = note("drop", &["x"]);
        let filtered = filter_by_tags(vec![keep.clone(), drop], &selection(&["y", "z"]));
        assert_eq!(filtered, vec![keep]);
    }

    #[test]
    fn test_disjoint_selection_excludes() {
        let filtered = filter_by_tags(vec![note("a", &["x", "y"])], &selection(&["z"]));
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_untagged_notes_never_match_a_selection() {
        let filtered = filter_by_tags(vec![note("a", &[])], &selection(&["x"]));
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.search_debounce, Duration::from_millis(300));
        assert_eq!(config.subscriber_grace, Duration::from_millis(5_000));
    }

    #[test]
    fn test_config_builders() {
        let config = EngineConfig::default()
            .with_search_debounce(Duration::from_millis(50))
            .with_subscriber_grace(Duration::from_secs(1));
        assert_eq!(config.search_debounce, Duration::from_millis(50));
        assert_eq!(config.subscriber_grace, Duration::from_secs(1));
    }
}
