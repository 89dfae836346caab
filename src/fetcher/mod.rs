//! Quote fetching abstraction.
//!
//! The scheduler talks to a [`QuoteFetcher`] trait object so tests can
//! substitute a fake that counts calls or fails on demand. The real
//! implementation, [`SinaFetcher`], does one HTTP GET per batch against
//! the Sina hq endpoint.

mod sina;

use async_trait::async_trait;

use crate::errors::Result;

pub use sina::{SinaFetcher, REQUEST_TIMEOUT_SECS};

/// Upstream rate limits cap one request at this many symbols; larger
/// watch-lists are fetched in multiple sequential batches per cycle.
pub const MAX_BATCH_SIZE: usize = 50;

/// One network round-trip for a batch of canonical symbols.
#[async_trait]
pub trait QuoteFetcher: Send + Sync {
    /// Fetch the raw (already decoded) response text for `symbols`.
    ///
    /// No retry happens inside this call; transient failures surface as
    /// errors and the next scheduler tick is the retry.
    async fn fetch_batch(&self, symbols: &[String]) -> Result<String>;
}
