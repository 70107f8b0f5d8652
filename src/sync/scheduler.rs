//! Auto-refresh countdown
//!
//! One task per armed engine ticks once a second, publishes the remaining
//! seconds, and fires a silent refresh when the countdown runs out. The task
//! only holds a weak reference, so it winds down on its own once every engine
//! handle is gone.

use std::sync::Weak;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::debug;

use super::engine::EngineInner;
use super::state::RefreshMode;
use crate::fetch::Payload;

const TICK: Duration = Duration::from_secs(1);

/// Runs the countdown for an engine until it is disposed or dropped
///
/// # Arguments
/// * `engine` - The engine to refresh
/// * `interval_seconds` - Seconds between refreshes; must be at least 1
pub(super) async fn run<T: Payload>(engine: Weak<EngineInner<T>>, interval_seconds: u64) {
    let mut ticker = time::interval_at(Instant::now() + TICK, TICK);
    let mut remaining = interval_seconds;

    loop {
        ticker.tick().await;

        let Some(inner) = engine.upgrade() else {
            break;
        };
        if inner.is_disposed() {
            break;
        }

        remaining = remaining.saturating_sub(1);
        if remaining > 0 {
            inner.publish_countdown(Some(remaining));
            continue;
        }

        // Reset before firing so a zero is never published
        remaining = interval_seconds;
        inner.publish_countdown(Some(remaining));
        debug!(resource = inner.key(), "Auto-refresh due");
        tokio::spawn(async move {
            inner.perform_refresh(RefreshMode::Silent).await;
        });
    }
}
