//! Core data model for the quote cache.

mod quote;

pub use quote::Quote;
