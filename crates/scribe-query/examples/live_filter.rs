//! Minimal composition root: wire a store to the query engine and watch the
//! result list react to typing, tag filtering, and deletes.
//!
//! Run with `RUST_LOG=debug cargo run --example live_filter` to see the
//! engine's tracing output.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::sleep;

use scribe_core::{CreateNoteRequest, NoteStore};
use scribe_db::SqliteNoteStore;
use scribe_query::QueryEngine;

fn print_snapshot(label: &str, notes: &[scribe_core::Note]) {
    println!("{label}:");
    for note in notes {
        println!("  - {} [{}]", note.title, note.tags.join(", "));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // The composition root owns the store; the engine only borrows it.
    let store = Arc::new(SqliteNoteStore::open_in_memory().await?);
    let engine = QueryEngine::new(store.clone());
    let feed = engine.subscribe().await?;

    store
        .insert(CreateNoteRequest {
            title: "Graph algorithms".into(),
            content: "BFS, DFS and shortest paths".into(),
            tags: vec!["CS 101".into()],
            ..Default::default()
        })
        .await?;
    store
        .insert(CreateNoteRequest {
            title: "Integrals".into(),
            content: "u-substitution practice".into(),
            tags: vec!["MATH".into()],
            ..Default::default()
        })
        .await?;
    sleep(Duration::from_millis(100)).await;
    print_snapshot("all notes", &feed.snapshot());

    engine.set_search_query("graph");
    sleep(Duration::from_millis(400)).await; // past the debounce window
    print_snapshot("search \"graph\"", &feed.snapshot());

    engine.set_search_query("");
    engine.set_selected_tags(HashSet::from(["MATH".to_string()]));
    sleep(Duration::from_millis(400)).await;
    print_snapshot("tag filter MATH", &feed.snapshot());

    let mut universe = engine.observe_available_tags();
    if let Some(tags) = universe.next().await {
        println!("available tags: {}", tags.join(", "));
    }

    Ok(())
}
