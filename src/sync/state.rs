//! Observable state and configuration of a sync engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a synchronized resource
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncStatus {
    /// Not mounted yet
    #[default]
    Idle,
    /// First fetch in progress, nothing fresh to show yet
    Loading,
    /// Foreground refresh in progress; existing data stays visible
    Refreshing,
    /// Data is available
    Ready,
    /// Fetching failed and there is no data to fall back on
    Error(String),
}

impl SyncStatus {
    /// True while a visible fetch is in progress
    pub fn is_busy(&self) -> bool {
        matches!(self, SyncStatus::Loading | SyncStatus::Refreshing)
    }

    /// Short display label
    pub fn label(&self) -> &'static str {
        match self {
            SyncStatus::Idle => "Idle",
            SyncStatus::Loading => "Loading",
            SyncStatus::Refreshing => "Refreshing",
            SyncStatus::Ready => "Ready",
            SyncStatus::Error(_) => "Error",
        }
    }
}

/// Snapshot of a resource as seen by consumers
///
/// Once `data` has been populated it is never cleared by a failure: errors that
/// happen while data exists only set `error`.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState<T> {
    /// Latest successfully fetched (or cached) value
    pub data: Option<T>,
    /// Current lifecycle status
    pub status: SyncStatus,
    /// Message of the most recent failed refresh, cleared by the next success
    pub error: Option<String>,
    /// Fetch time of the value in `data`
    pub last_updated: Option<DateTime<Utc>>,
    /// Seconds until the next automatic refresh, when auto-refresh is armed
    pub next_refresh_in_seconds: Option<u64>,
}

impl<T> Default for SyncState<T> {
    fn default() -> Self {
        Self {
            data: None,
            status: SyncStatus::Idle,
            error: None,
            last_updated: None,
            next_refresh_in_seconds: None,
        }
    }
}

impl<T> SyncState<T> {
    /// True when data is shown but the latest refresh failed
    pub fn is_stale_with_error(&self) -> bool {
        self.data.is_some() && self.error.is_some()
    }
}

/// Freshness and scheduling rules for one resource
///
/// Fixed for the lifetime of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshPolicy {
    /// Maximum age of cached data before a mount refetches it
    pub ttl_seconds: u64,
    /// Period of automatic background refreshes; `None` or `0` disables them
    #[serde(default)]
    pub auto_refresh_interval_seconds: Option<u64>,
}

impl RefreshPolicy {
    /// A policy that only uses the TTL cache
    pub fn ttl(ttl_seconds: u64) -> Self {
        Self {
            ttl_seconds,
            auto_refresh_interval_seconds: None,
        }
    }

    /// Adds a background refresh every `interval_seconds`
    pub fn with_auto_refresh(mut self, interval_seconds: u64) -> Self {
        self.auto_refresh_interval_seconds = Some(interval_seconds);
        self
    }

    /// The auto-refresh period, if enabled
    pub fn auto_refresh_interval(&self) -> Option<u64> {
        self.auto_refresh_interval_seconds.filter(|&secs| secs > 0)
    }
}

/// How a refresh surfaces in the visible status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Mount-time fetch: status shows `Loading`
    Initial,
    /// User-requested fetch: status shows `Refreshing` while data stays visible
    Foreground,
    /// Scheduled fetch: status is left alone, only failures are annotated
    Silent,
}

/// What a mount or refresh request ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Fresh cached data was served without a network call
    CacheHit,
    /// A fetch succeeded and its value is now visible
    Updated,
    /// A fetch failed; the error is recorded in the state
    Failed,
    /// Another refresh was already in flight, so nothing was started
    Coalesced,
    /// The engine was disposed, so the result was dropped
    Discarded,
}
