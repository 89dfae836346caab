//! Quote refresh cache for the Sina hq feed.
//!
//! This crate maintains a user-configurable watch-list of instrument
//! symbols, periodically fetches current prices from the Sina hq text
//! endpoint, and exposes a concurrency-safe snapshot to any number of
//! consumers.
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |   QuoteService   |  start/stop, set_symbols, force_refresh,
//! +------------------+  snapshot, subscribe
//!         |
//!         v  timer tick (one cycle in flight at most)
//! +------------------+     +------------------+
//! |   QuoteFetcher   | --> |  parse_quotes    |  hq_str lines -> Quote
//! +------------------+     +------------------+
//!    (network I/O)                |
//!                                 v
//!                          +------------------+
//!                          |    QuoteCache    |  merge under lock,
//!                          +------------------+  stale entries survive
//!                                 |
//!                                 v
//!                        change notification fan-out
//! ```
//!
//! # Core types
//!
//! - [`QuoteService`] - the assembled facade; construct once, clone freely
//! - [`Quote`] - last known market state for one canonical symbol
//! - [`QuoteFetcher`] - seam for injecting a fake upstream in tests
//! - [`WatchlistStore`] - ordered, deduplicated, file-persisted symbols
//! - [`QuoteError`] - error taxonomy for every failure mode
//!
//! Symbols are canonicalized to `<sh|sz><digits>` by [`symbols::normalize`];
//! every public entry point accepts any of the user input conventions.

pub mod cache;
pub mod errors;
pub mod events;
pub mod fetcher;
pub mod models;
pub mod parser;
pub mod service;
pub mod symbols;
pub mod watchlist;

pub use cache::QuoteCache;
pub use errors::QuoteError;
pub use events::{SubscriberRegistry, SubscriptionId};
pub use fetcher::{QuoteFetcher, SinaFetcher, MAX_BATCH_SIZE};
pub use models::Quote;
pub use parser::parse_quotes;
pub use service::{QuoteService, RefreshConfig, DEFAULT_REFRESH_INTERVAL_SECS};
pub use watchlist::{WatchlistStore, DEFAULT_SYMBOLS};
