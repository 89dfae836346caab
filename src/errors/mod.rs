//! Error types for the quote refresh cache.

use thiserror::Error;

/// Errors that can occur while refreshing or serving quotes.
///
/// Every failure inside a refresh cycle is converted to a status string at
/// the cycle boundary; none of these variants escape the scheduler task.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// The watch-list is empty, so there is nothing to fetch.
    #[error("no symbols configured")]
    NoSymbols,

    /// HTTP transport failure: timeout, DNS, connect, or a non-success
    /// status mapped through `error_for_status`.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream payload produced zero parseable quote lines.
    /// Carries a short excerpt of the raw text for diagnosis.
    #[error("unparseable upstream response: {excerpt:?}")]
    UnparseableResponse {
        /// First part of the raw payload, bounded in length.
        excerpt: String,
    },

    /// A symbol could not be normalized into canonical form.
    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Filesystem-level failure, typically watch-list persistence.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// An operation that requires a running service was called while
    /// the service was stopped.
    #[error("service is not running")]
    NotRunning,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, QuoteError>;
