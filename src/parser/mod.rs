//! Parser for the Sina hq response format.
//!
//! The feed answers with one pseudo-assignment per requested symbol:
//!
//! ```text
//! var hq_str_sh600519="贵州茅台,1600.00,1595.00,1600.00,...";
//! ```
//!
//! The quoted payload is a positional CSV: field 0 is the display name,
//! field 2 the previous close, field 3 the current price. An empty payload
//! means the instrument was not found or is suspended.

use std::collections::HashMap;
use std::str::FromStr;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use rust_decimal::Decimal;

use crate::errors::QuoteError;
use crate::models::Quote;
use crate::symbols;

/// Positional field carrying the previous session close.
const FIELD_PREV_CLOSE: usize = 2;

/// Positional field carrying the current trade price.
const FIELD_PRICE: usize = 3;

/// Minimum number of CSV fields for a line to be usable.
const MIN_FIELDS: usize = 4;

/// Length cap for the diagnostic excerpt on unparseable responses.
const EXCERPT_LEN: usize = 120;

lazy_static! {
    /// Matches one `var <ident>_<symbol>="<payload>";` statement.
    static ref HQ_LINE: Regex =
        Regex::new(r#"var\s+\w+?_(?P<sym>[A-Za-z0-9.]+)\s*=\s*"(?P<data>[^"]*)";"#)
            .expect("invalid hq line regex");
}

/// Parse a decoded response body into quotes keyed by canonical symbol.
///
/// Lines with an empty payload (suspended or unknown instruments) and lines
/// with fewer than four fields are skipped. A numeric field that fails to
/// parse yields zero instead of discarding the line. If the whole response
/// produces zero quotes, an [`QuoteError::UnparseableResponse`] carrying a
/// bounded excerpt of the raw text is returned so the caller can surface
/// "upstream changed format or blocked the request" without losing any
/// previously cached data.
pub fn parse_quotes(raw: &str) -> Result<HashMap<String, Quote>, QuoteError> {
    let mut quotes = HashMap::new();

    for caps in HQ_LINE.captures_iter(raw) {
        let sym_token = caps.name("sym").map(|m| m.as_str()).unwrap_or_default();
        let payload = caps.name("data").map(|m| m.as_str()).unwrap_or_default();

        if payload.trim().is_empty() {
            debug!("skipping empty payload for {}", sym_token);
            continue;
        }

        let Some(symbol) = symbols::normalize(sym_token) else {
            debug!("skipping unrecognized symbol token {}", sym_token);
            continue;
        };

        let fields: Vec<&str> = payload.split(',').map(str::trim).collect();
        if fields.len() < MIN_FIELDS {
            debug!(
                "skipping {}: {} fields, need {}",
                symbol,
                fields.len(),
                MIN_FIELDS
            );
            continue;
        }

        let quote = Quote::new(
            symbol.clone(),
            fields[0],
            parse_decimal(fields[FIELD_PRICE]),
            parse_decimal(fields[FIELD_PREV_CLOSE]),
        );
        quotes.insert(symbol, quote);
    }

    if quotes.is_empty() {
        return Err(QuoteError::UnparseableResponse {
            excerpt: excerpt(raw),
        });
    }

    Ok(quotes)
}

/// Culture-invariant decimal parse; tolerates a trailing percent sign and
/// yields zero on failure rather than aborting the line.
fn parse_decimal(field: &str) -> Decimal {
    let cleaned = field.trim().trim_end_matches('%').trim();
    Decimal::from_str(cleaned).unwrap_or(Decimal::ZERO)
}

/// Bounded prefix of the raw payload, on a char boundary.
fn excerpt(raw: &str) -> String {
    raw.chars().take(EXCERPT_LEN).collect()
}
