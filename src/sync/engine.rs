//! Sync engine: fetch, validate, cache and schedule one remote resource
//!
//! ```text
//! Idle ──mount──▶ Loading ──ok──▶ Ready ◀──ok── Refreshing
//!                   │               │  └──refresh_now──▶┘
//!                   └──err, no data─┴──▶ Error ──refresh_now──▶ Refreshing
//! ```
//!
//! Every fetch goes through [`EngineInner::perform_refresh`], whatever
//! triggered it. At most one fetch is in flight at a time; a request that
//! arrives while one is running is dropped rather than queued. Results are
//! applied only if the engine has not been disposed since the fetch started.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::scheduler;
use super::state::{RefreshMode, RefreshOutcome, RefreshPolicy, SyncState, SyncStatus};
use crate::cache::CacheStore;
use crate::clock::Clock;
use crate::fetch::{FetchError, Fetcher, Payload};
use crate::freshness::is_stale;

/// Handle to the synchronization engine of one resource
///
/// Handles are cheap to clone and all refer to the same engine. Consumers read
/// the state through [`SyncEngine::state`] or [`SyncEngine::subscribe`] and
/// drive it only through the methods below; the state itself is never exposed
/// mutably.
pub struct SyncEngine<T: Payload> {
    inner: Arc<EngineInner<T>>,
}

impl<T: Payload> Clone for SyncEngine<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

pub(super) struct EngineInner<T: Payload> {
    key: String,
    policy: RefreshPolicy,
    cache: CacheStore,
    fetcher: Arc<dyn Fetcher<T>>,
    clock: Arc<dyn Clock>,
    state: watch::Sender<SyncState<T>>,
    /// Single-flight guard
    in_flight: AtomicBool,
    disposed: AtomicBool,
    /// Set once the first mount has resolved
    mounted: AtomicBool,
    /// Whether the consumer wants auto-refresh (the policy must also allow it)
    auto_refresh: AtomicBool,
    /// Bumped on disposal; fetches compare against the value seen at dispatch
    epoch: AtomicU64,
    scheduler: Mutex<Option<JoinHandle<()>>>,
}

/// Holds the single-flight flag for the duration of a refresh
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<T: Payload> SyncEngine<T> {
    /// Creates an engine in the `Idle` state
    ///
    /// Nothing is read or fetched until [`SyncEngine::mount`] is called.
    ///
    /// # Arguments
    /// * `key` - Resource key, also used as the cache key
    /// * `policy` - TTL and auto-refresh settings
    /// * `cache` - Where fetched payloads are persisted
    /// * `fetcher` - Performs the network retrieval
    /// * `clock` - Time source for freshness and fetch timestamps
    pub fn new(
        key: impl Into<String>,
        policy: RefreshPolicy,
        cache: CacheStore,
        fetcher: Arc<dyn Fetcher<T>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (state, _) = watch::channel(SyncState::default());
        Self {
            inner: Arc::new(EngineInner {
                key: key.into(),
                policy,
                cache,
                fetcher,
                clock,
                state,
                in_flight: AtomicBool::new(false),
                disposed: AtomicBool::new(false),
                mounted: AtomicBool::new(false),
                auto_refresh: AtomicBool::new(true),
                epoch: AtomicU64::new(0),
                scheduler: Mutex::new(None),
            }),
        }
    }

    /// Resource key, also the cache key
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SyncState<T> {
        self.inner.state.borrow().clone()
    }

    /// Receiver that is notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SyncState<T>> {
        self.inner.state.subscribe()
    }

    /// Loads the resource for display
    ///
    /// Serves fresh cached data without touching the network. Otherwise shows
    /// whatever stale data the cache holds, moves to `Loading` and fetches.
    /// Once the mount resolves, auto-refresh is armed if the policy enables it
    /// and it has not been switched off.
    pub async fn mount(&self) -> RefreshOutcome {
        let inner = &self.inner;
        let epoch = inner.epoch.load(Ordering::SeqCst);
        if !inner.is_current(epoch) {
            return RefreshOutcome::Discarded;
        }

        let cached = inner.cache.get::<T>(&inner.key).await;
        if !inner.is_current(epoch) {
            return RefreshOutcome::Discarded;
        }

        let now = inner.clock.now();
        let outcome = match cached {
            Some(entry) if !is_stale(Some(entry.fetched_at), now, inner.policy.ttl_seconds) => {
                debug!(resource = %inner.key, fetched_at = %entry.fetched_at, "Serving fresh cached data");
                inner.state.send_modify(|state| {
                    state.data = Some(entry.payload);
                    state.status = SyncStatus::Ready;
                    state.error = None;
                    state.last_updated = Some(entry.fetched_at);
                });
                RefreshOutcome::CacheHit
            }
            stale => {
                if let Some(entry) = stale {
                    debug!(resource = %inner.key, fetched_at = %entry.fetched_at, "Cached data is stale");
                    inner.state.send_modify(|state| {
                        state.data = Some(entry.payload);
                        state.last_updated = Some(entry.fetched_at);
                    });
                }
                inner.perform_refresh(RefreshMode::Initial).await
            }
        };

        if outcome != RefreshOutcome::Discarded && inner.is_current(epoch) {
            inner.mounted.store(true, Ordering::SeqCst);
            if inner.auto_refresh.load(Ordering::SeqCst) {
                self.arm_scheduler();
            }
        }
        outcome
    }

    /// Fetches now, regardless of staleness
    ///
    /// Returns `Coalesced` without fetching if a refresh is already running.
    pub async fn refresh_now(&self) -> RefreshOutcome {
        self.inner.perform_refresh(RefreshMode::Foreground).await
    }

    /// Starts a foreground refresh in the background
    ///
    /// For callers, such as key handlers, that must not wait on the network.
    pub fn request_refresh(&self) -> JoinHandle<RefreshOutcome> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.perform_refresh(RefreshMode::Foreground).await })
    }

    /// Turns automatic background refreshes on or off
    ///
    /// Disabling cancels the countdown immediately but lets a refresh that is
    /// already in flight finish. Enabling has no effect if the policy has no
    /// auto-refresh interval; before the first mount it only records the
    /// preference.
    pub fn set_auto_refresh(&self, enabled: bool) {
        self.inner.auto_refresh.store(enabled, Ordering::SeqCst);
        if !enabled {
            self.disarm_scheduler();
            debug!(resource = %self.inner.key, "Auto-refresh disabled");
        } else if self.inner.mounted.load(Ordering::SeqCst) {
            self.arm_scheduler();
        }
    }

    /// True when the policy allows auto-refresh and it has not been switched off
    pub fn is_auto_refresh_enabled(&self) -> bool {
        self.inner.auto_refresh.load(Ordering::SeqCst)
            && self.inner.policy.auto_refresh_interval().is_some()
    }

    /// True while the countdown task is running
    pub fn is_auto_refresh_armed(&self) -> bool {
        self.inner
            .scheduler_slot()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Tears the engine down
    ///
    /// Cancels the countdown unconditionally. A fetch that is in flight is not
    /// interrupted, but its result will be dropped when it arrives. Further
    /// mounts and refreshes are ignored. Calling this more than once is harmless.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.inner.scheduler_slot().take() {
            handle.abort();
        }
        debug!(resource = %self.inner.key, "Engine disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    fn arm_scheduler(&self) {
        let Some(interval) = self.inner.policy.auto_refresh_interval() else {
            return;
        };
        if self.inner.is_disposed() {
            return;
        }

        let mut slot = self.inner.scheduler_slot();
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        self.inner.publish_countdown(Some(interval));
        *slot = Some(tokio::spawn(scheduler::run(
            Arc::downgrade(&self.inner),
            interval,
        )));
        debug!(resource = %self.inner.key, interval_seconds = interval, "Auto-refresh armed");
    }

    fn disarm_scheduler(&self) {
        if let Some(handle) = self.inner.scheduler_slot().take() {
            handle.abort();
        }
        self.inner.publish_countdown(None);
    }
}

impl<T: Payload> EngineInner<T> {
    pub(super) fn key(&self) -> &str {
        &self.key
    }

    pub(super) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// True if nothing has invalidated work dispatched at `epoch`
    fn is_current(&self, epoch: u64) -> bool {
        !self.is_disposed() && self.epoch.load(Ordering::SeqCst) == epoch
    }

    fn scheduler_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn publish_countdown(&self, seconds: Option<u64>) {
        self.state.send_if_modified(|state| {
            if state.next_refresh_in_seconds == seconds {
                false
            } else {
                state.next_refresh_in_seconds = seconds;
                true
            }
        });
    }

    /// The one code path every fetch goes through
    ///
    /// `mode` only decides how the attempt shows up in the visible status.
    pub(super) async fn perform_refresh(&self, mode: RefreshMode) -> RefreshOutcome {
        if self.is_disposed() {
            return RefreshOutcome::Discarded;
        }
        let Some(_in_flight) = InFlight::acquire(&self.in_flight) else {
            debug!(resource = %self.key, ?mode, "Refresh already in flight, coalescing");
            return RefreshOutcome::Coalesced;
        };
        let epoch = self.epoch.load(Ordering::SeqCst);

        let visible_status = match mode {
            RefreshMode::Initial => Some(SyncStatus::Loading),
            RefreshMode::Foreground => Some(SyncStatus::Refreshing),
            RefreshMode::Silent => None,
        };
        if let Some(status) = visible_status {
            self.state.send_modify(|state| state.status = status);
        }

        debug!(resource = %self.key, ?mode, "Refresh started");
        let result = self.fetcher.fetch(&self.key).await;
        if !self.is_current(epoch) {
            debug!(resource = %self.key, "Engine disposed during fetch, discarding result");
            return RefreshOutcome::Discarded;
        }

        match result {
            Ok(payload) => self.apply_success(payload, epoch).await,
            Err(error) => {
                self.apply_failure(&error, mode);
                RefreshOutcome::Failed
            }
        }
    }

    async fn apply_success(&self, payload: T, epoch: u64) -> RefreshOutcome {
        if !self.is_current(epoch) {
            return RefreshOutcome::Discarded;
        }
        let fetched_at = self.clock.now();
        let last_updated = match self.cache.put(&self.key, &payload, fetched_at).await {
            Ok(stored_at) => stored_at,
            Err(error) => {
                warn!(resource = %self.key, %error, "Failed to persist resource, keeping it for this session only");
                fetched_at
            }
        };
        if !self.is_current(epoch) {
            return RefreshOutcome::Discarded;
        }

        info!(resource = %self.key, fetched_at = %last_updated, "Resource refreshed");
        self.state.send_modify(|state| {
            state.data = Some(payload);
            state.status = SyncStatus::Ready;
            state.error = None;
            state.last_updated = Some(last_updated);
        });
        RefreshOutcome::Updated
    }

    fn apply_failure(&self, error: &FetchError, mode: RefreshMode) {
        let message = error.to_string();
        let has_data = self.state.borrow().data.is_some();
        if has_data {
            warn!(resource = %self.key, ?mode, %error, "Refresh failed, keeping previous data");
        } else {
            warn!(resource = %self.key, ?mode, %error, "Refresh failed with no data to fall back on");
        }

        self.state.send_modify(|state| {
            state.status = if has_data {
                SyncStatus::Ready
            } else {
                SyncStatus::Error(message.clone())
            };
            state.error = Some(message);
        });
    }
}

impl<T: Payload> Drop for EngineInner<T> {
    fn drop(&mut self) {
        let slot = self.scheduler.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}
