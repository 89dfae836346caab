//! Refresh scheduler and service facade.
//!
//! [`QuoteService`] is the externally visible object: start/stop lifecycle,
//! watch-list mutation, forced refresh, snapshot retrieval, and change
//! subscription. One background task drives the refresh loop; at most one
//! cycle runs at a time, enforced by an atomic gate independent of the
//! structural lock.
//!
//! Locking discipline: the structural mutex guards watch-list, cache, and
//! status fields, and is held only for in-memory updates. Network I/O
//! always happens outside it.

mod config;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use crate::cache::QuoteCache;
use crate::errors::QuoteError;
use crate::events::{SubscriberRegistry, SubscriptionId};
use crate::fetcher::{QuoteFetcher, SinaFetcher, MAX_BATCH_SIZE};
use crate::models::Quote;
use crate::parser;
use crate::symbols;
use crate::watchlist::WatchlistStore;

pub use config::{RefreshConfig, DEFAULT_REFRESH_INTERVAL_SECS};

/// Structural state guarded by the service mutex.
struct State {
    watchlist: WatchlistStore,
    cache: QuoteCache,
    last_update: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Handle to the running scheduler task.
struct RunHandle {
    shutdown: watch::Sender<bool>,
    /// Wakes the loop for an out-of-band cycle, e.g. after a watch-list
    /// mutation. The cycle still goes through the refresh gate.
    refresh_now: Arc<Notify>,
    task: JoinHandle<()>,
}

struct Inner {
    config: RefreshConfig,
    state: Mutex<State>,
    /// Refresh gate: set while a cycle is in flight. Separate from the
    /// structural lock so a long fetch never blocks snapshot readers.
    refreshing: AtomicBool,
    /// Live network client; present only while the service runs.
    fetcher: Mutex<Option<Arc<dyn QuoteFetcher>>>,
    /// Injected fetcher used instead of [`SinaFetcher`]; set by tests.
    fetcher_override: Option<Arc<dyn QuoteFetcher>>,
    subscribers: SubscriberRegistry,
    runtime: Mutex<Option<RunHandle>>,
}

/// Watch-list driven quote refresh service.
///
/// Cheap to clone; all clones share the same state. Construct one instance
/// at process start and hand clones to every consumer.
#[derive(Clone)]
pub struct QuoteService {
    inner: Arc<Inner>,
}

impl QuoteService {
    /// Create a service backed by the real Sina fetcher.
    pub fn new(config: RefreshConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a service with an injected fetcher. Used by tests to count
    /// calls or fail on demand.
    pub fn with_fetcher(config: RefreshConfig, fetcher: Arc<dyn QuoteFetcher>) -> Self {
        Self::build(config, Some(fetcher))
    }

    fn build(config: RefreshConfig, fetcher_override: Option<Arc<dyn QuoteFetcher>>) -> Self {
        let state = State {
            watchlist: WatchlistStore::new(config.watchlist_path.clone()),
            cache: QuoteCache::new(),
            last_update: None,
            last_error: None,
        };
        Self {
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(state),
                refreshing: AtomicBool::new(false),
                fetcher: Mutex::new(None),
                fetcher_override,
                subscribers: SubscriberRegistry::new(),
                runtime: Mutex::new(None),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start the refresh loop. Idempotent: a second call while running is
    /// a no-op.
    ///
    /// Lazily constructs the network client, loads the watch-list if it
    /// has not been loaded yet, and arms a timer that fires immediately
    /// and then at the configured period. Must be called from within a
    /// tokio runtime.
    pub fn start(&self) {
        let mut runtime = self.inner.runtime.lock().expect("runtime lock poisoned");
        if runtime.is_some() {
            debug!("quote service already running");
            return;
        }

        {
            let mut fetcher = self.inner.fetcher.lock().expect("fetcher lock poisoned");
            *fetcher = Some(match &self.inner.fetcher_override {
                Some(injected) => injected.clone(),
                None => Arc::new(SinaFetcher::with_timeout(self.inner.config.request_timeout)),
            });
        }

        {
            let mut state = self.lock_state();
            if !state.watchlist.is_loaded() {
                if let Err(e) = state.watchlist.load() {
                    warn!("failed to load watch-list: {}", e);
                }
            }
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let refresh_now = Arc::new(Notify::new());
        let service = self.clone();
        let wakeup = refresh_now.clone();
        let period = self.inner.config.interval;
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {}
                    _ = wakeup.notified() => {}
                }
                // A cycle in progress here finishes before the next
                // iteration observes the shutdown signal.
                service.run_cycle().await;
            }
            debug!("refresh loop stopped");
        });

        *runtime = Some(RunHandle {
            shutdown: shutdown_tx,
            refresh_now,
            task,
        });
    }

    /// Stop the refresh loop and release the network client.
    ///
    /// Safe to call repeatedly. A cycle already past the concurrency gate
    /// is allowed to finish and write its result. A later [`start`]
    /// fully reinitializes.
    pub fn stop(&self) {
        let handle = self
            .inner
            .runtime
            .lock()
            .expect("runtime lock poisoned")
            .take();
        if let Some(handle) = handle {
            // The loop exits on the signal; any cycle already past the
            // gate finishes first. The task handle is detached.
            let _ = handle.shutdown.send(true);
            drop(handle.task);
        }
        self.inner
            .fetcher
            .lock()
            .expect("fetcher lock poisoned")
            .take();
    }

    /// Whether the refresh loop is currently armed.
    pub fn is_running(&self) -> bool {
        self.inner
            .runtime
            .lock()
            .expect("runtime lock poisoned")
            .is_some()
    }

    // ------------------------------------------------------------------
    // Refresh cycle
    // ------------------------------------------------------------------

    /// Run one out-of-band refresh cycle through the same gate the timer
    /// uses. If a cycle is already in flight the call is dropped; that is
    /// a no-op, not an error.
    pub async fn force_refresh(&self) {
        self.run_cycle().await;
    }

    /// One fetch → parse → merge → notify pass.
    ///
    /// Subscribers are notified only when a cycle actually ran; a tick
    /// dropped at the gate or arriving after `stop` changes nothing, so
    /// there is nothing to re-render.
    async fn run_cycle(&self) {
        if self.inner.refreshing.swap(true, Ordering::SeqCst) {
            debug!("refresh already in flight, dropping tick");
            return;
        }
        let ran = self.run_cycle_gated().await;
        self.inner.refreshing.store(false, Ordering::SeqCst);
        if ran {
            self.inner.subscribers.notify_all();
        }
    }

    /// Returns whether a cycle ran (an empty watch-list still counts:
    /// it updates the error state).
    async fn run_cycle_gated(&self) -> bool {
        // The fetcher disappears when the service stops; a tick racing
        // the stop simply does nothing.
        let fetcher = {
            let guard = self.inner.fetcher.lock().expect("fetcher lock poisoned");
            guard.clone()
        };
        let Some(fetcher) = fetcher else {
            debug!("no network client, skipping cycle");
            return false;
        };

        let watched = self.lock_state().watchlist.symbols();
        if watched.is_empty() {
            self.lock_state().last_error = Some(QuoteError::NoSymbols.to_string());
            return true;
        }

        let mut merged_total = 0usize;
        let mut last_failure: Option<QuoteError> = None;

        // Clamp to the upstream request limit: a larger configured batch
        // would make the fetcher truncate and silently drop symbols.
        let batch_size = self.inner.config.max_batch.clamp(1, MAX_BATCH_SIZE);
        for batch in watched.chunks(batch_size) {
            match fetcher.fetch_batch(batch).await {
                Ok(raw) => match parser::parse_quotes(&raw) {
                    Ok(parsed) => {
                        merged_total += self.lock_state().cache.merge(parsed);
                    }
                    Err(e) => {
                        warn!("parse failed for batch of {}: {}", batch.len(), e);
                        last_failure = Some(e);
                    }
                },
                Err(e) => {
                    warn!("fetch failed for batch of {}: {}", batch.len(), e);
                    last_failure = Some(e);
                }
            }
        }

        let mut state = self.lock_state();
        if merged_total > 0 {
            state.last_update = Some(Utc::now());
            state.last_error = None;
            debug!("refresh cycle merged {} quotes", merged_total);
        } else {
            // Keep the previous timestamp: a failed cycle produced no
            // fresh data, so advertising "now" would be a lie.
            let message = last_failure
                .map(|e| e.to_string())
                .unwrap_or_else(|| "refresh produced no quotes".to_string());
            state.last_error = Some(message);
        }
        true
    }

    // ------------------------------------------------------------------
    // Watch-list
    // ------------------------------------------------------------------

    /// Replace the watch-list.
    ///
    /// Entries are normalized and deduplicated; cache entries for symbols
    /// that left the list are pruned; the new list is persisted; a change
    /// notification fires. While the service runs, an out-of-band refresh
    /// cycle is kicked off through the usual gate so newly added symbols
    /// get data without waiting for the next timer tick. Persistence
    /// failures never block the in-memory update.
    pub fn set_symbols<S: AsRef<str>>(&self, raw: &[S]) {
        {
            let mut state = self.lock_state();
            state.watchlist.set_symbols(raw);
            let keep = state.watchlist.symbols();
            state.cache.prune(&keep);
        }
        self.inner.subscribers.notify_all();

        let runtime = self.inner.runtime.lock().expect("runtime lock poisoned");
        if let Some(handle) = runtime.as_ref() {
            handle.refresh_now.notify_one();
        }
    }

    /// The watch-list in stored order, as a defensive copy.
    pub fn symbols(&self) -> Vec<String> {
        self.lock_state().watchlist.symbols()
    }

    // ------------------------------------------------------------------
    // Snapshots and status
    // ------------------------------------------------------------------

    /// Cached quotes in watch-list order.
    ///
    /// Policy: symbols with no cached quote yet are omitted, so row count
    /// equals the number of successfully fetched symbols. Never blocks on
    /// network I/O.
    pub fn snapshot(&self) -> Vec<Quote> {
        let state = self.lock_state();
        state
            .watchlist
            .symbols()
            .iter()
            .filter_map(|s| state.cache.get(s).cloned())
            .collect()
    }

    /// Latest cached quote for one symbol, in any accepted input form.
    pub fn quote(&self, symbol: &str) -> Option<Quote> {
        let canonical = symbols::normalize(symbol)?;
        self.lock_state().cache.get(&canonical).cloned()
    }

    /// Timestamp of the last cycle that merged at least one quote.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.lock_state().last_update
    }

    /// Why the most recent data may be stale, if anything went wrong.
    pub fn last_error(&self) -> Option<String> {
        self.lock_state().last_error.clone()
    }

    // ------------------------------------------------------------------
    // Change notification
    // ------------------------------------------------------------------

    /// Register a callback fired after every refresh cycle (success or
    /// failure) and after every watch-list mutation.
    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.inner.subscribers.subscribe(callback)
    }

    /// Remove a previously registered callback.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.subscribers.unsubscribe(id)
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().expect("state lock poisoned")
    }
}
