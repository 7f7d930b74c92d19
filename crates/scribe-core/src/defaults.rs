//! Centralized default constants for the scribenote system.
//!
//! **This module is the single source of truth** for all shared default
//! values. The other crates reference these constants instead of defining
//! their own magic numbers.

// =============================================================================
// QUERY ENGINE
// =============================================================================

/// Quiet period applied to search-text changes before a derivation runs.
///
/// A new keystroke inside the window discards the pending value entirely;
/// only the latest text after the window proceeds.
pub const SEARCH_DEBOUNCE_MS: u64 = 300;

/// How long the engine keeps its store subscription alive after the last
/// result subscriber detaches. A subscriber reattaching within this window
/// is served the cached snapshot with no recomputation gap.
pub const SUBSCRIBER_GRACE_MS: u64 = 5_000;

/// Buffer size for the snapshot channel between the base-query pipeline and
/// the driver. Small on purpose: stale snapshots are dropped on arrival, so
/// depth only covers scheduling jitter.
pub const SNAPSHOT_CHANNEL_CAPACITY: usize = 8;

// =============================================================================
// STORE CHANGE BUS
// =============================================================================

/// Capacity of the store's change-notification broadcast channel.
///
/// Receivers that fall behind get a `Lagged` error and collapse the missed
/// ticks into a single refresh, so this only needs to absorb short bursts.
pub const CHANGE_BUS_CAPACITY: usize = 64;
