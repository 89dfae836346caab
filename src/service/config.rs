//! Refresh scheduler configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::fetcher::{MAX_BATCH_SIZE, REQUEST_TIMEOUT_SECS};

/// Default period between refresh cycles.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 5;

/// Configuration for [`QuoteService`](crate::service::QuoteService).
#[derive(Clone, Debug)]
pub struct RefreshConfig {
    /// Period between timer ticks. The first tick fires immediately.
    pub interval: Duration,
    /// Bound on every upstream HTTP request.
    pub request_timeout: Duration,
    /// Symbols per upstream request; larger watch-lists are fetched in
    /// multiple sequential batches within one cycle.
    pub max_batch: usize,
    /// Location of the persisted watch-list.
    pub watchlist_path: PathBuf,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            max_batch: MAX_BATCH_SIZE,
            watchlist_path: std::env::temp_dir().join("quote-watch-symbols.txt"),
        }
    }
}

impl RefreshConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Symbols per upstream request, clamped to `1..=MAX_BATCH_SIZE`.
    ///
    /// Values above the upstream limit would make the fetcher truncate
    /// each request and silently drop the overflow symbols.
    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch.clamp(1, MAX_BATCH_SIZE);
        self
    }

    pub fn with_watchlist_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.watchlist_path = path.into();
        self
    }
}
