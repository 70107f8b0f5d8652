//! Time-gated synchronization of remote resources
//!
//! A [`SyncEngine`] owns the fetch, validate, cache and reschedule cycle for
//! one named resource and publishes a [`SyncState`] that screens render.

mod engine;
mod scheduler;
mod state;

pub use engine::SyncEngine;
pub use state::{RefreshMode, RefreshOutcome, RefreshPolicy, SyncState, SyncStatus};
