use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Last known market state for one canonical symbol.
///
/// A quote with `previous_close == 0` means the reference price is unknown
/// (not yet fetched, or suspended); callers use [`Quote::has_reference`] to
/// tell that apart from a genuine zero change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Canonical symbol, e.g. `sh600519`. Owning key in the cache.
    pub symbol: String,

    /// Human-readable instrument name. Falls back to the symbol when the
    /// feed does not supply one.
    pub display_name: String,

    /// Current trade price. Zero when unavailable.
    pub price: Decimal,

    /// Previous session close, the reference for change computation.
    /// Zero means "unknown".
    pub previous_close: Decimal,
}

impl Quote {
    /// Create a quote, substituting the symbol for an empty display name.
    pub fn new(
        symbol: impl Into<String>,
        display_name: impl Into<String>,
        price: Decimal,
        previous_close: Decimal,
    ) -> Self {
        let symbol = symbol.into();
        let display_name = {
            let name = display_name.into();
            if name.trim().is_empty() {
                symbol.clone()
            } else {
                name
            }
        };
        Self {
            symbol,
            display_name,
            price,
            previous_close,
        }
    }

    /// Whether a reference price is known. `false` means "no data yet".
    pub fn has_reference(&self) -> bool {
        !self.previous_close.is_zero()
    }

    /// Percent change against the previous close.
    ///
    /// Defined as zero when the previous close is unknown, so this never
    /// divides by zero.
    pub fn change_percent(&self) -> Decimal {
        if self.previous_close.is_zero() {
            return Decimal::ZERO;
        }
        (self.price - self.previous_close) / self.previous_close * Decimal::ONE_HUNDRED
    }
}
