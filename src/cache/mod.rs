//! In-memory cache of the latest quote per canonical symbol.
//!
//! The cache itself carries no locking; the owning service guards it with
//! its structural mutex. Entries persist across failed refresh cycles
//! (stale-but-available beats no data) and leave only when their symbol is
//! removed from the watch-list.

use std::collections::HashMap;

use crate::models::Quote;

/// Latest known quote per canonical symbol.
#[derive(Debug, Default)]
pub struct QuoteCache {
    latest: HashMap<String, Quote>,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one parse result into the cache.
    ///
    /// Only symbols present in `parsed` are touched; a symbol absent from
    /// the response keeps its previously cached quote. Returns the number
    /// of entries written.
    pub fn merge(&mut self, parsed: HashMap<String, Quote>) -> usize {
        let merged = parsed.len();
        self.latest.extend(parsed);
        merged
    }

    /// Drop every entry whose symbol is not in `keep`.
    ///
    /// `keep` holds canonical (lower-case) symbols; comparison is done on
    /// the canonical form so it is effectively case-insensitive.
    pub fn prune(&mut self, keep: &[String]) {
        self.latest.retain(|symbol, _| keep.contains(symbol));
    }

    pub fn get(&self, symbol: &str) -> Option<&Quote> {
        self.latest.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}
