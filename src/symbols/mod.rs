//! Symbol normalization for the Sina hq feed.
//!
//! Users type symbols in several conventions: a bare numeric code
//! (`600000`), an exchange-prefixed form (`sh600000`, `SH600000`), the
//! numeric market convention (`1.600000` for Shanghai, `0.000001` for
//! Shenzhen), or a suffixed form (`600000.SH`). All of them map to one
//! canonical shape: a lower-case two-letter market prefix followed by the
//! digits of the instrument code.

/// Shanghai market prefix.
pub const MARKET_SH: &str = "sh";

/// Shenzhen market prefix.
pub const MARKET_SZ: &str = "sz";

/// Normalize an arbitrary user-typed symbol into canonical form.
///
/// Returns `None` when no digits remain after prefix handling.
///
/// When the input carries no explicit market, the market is inferred from
/// the leading digit of the code: `5`, `6`, `9` trade in Shanghai,
/// everything else in Shenzhen. Composite indices do not follow that
/// convention, so an index must be given with an explicit prefix
/// (e.g. `sh000001`).
pub fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_lowercase();
    let (market, rest) = split_market(&lower);

    let digits: String = rest.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }

    let market = market.unwrap_or_else(|| infer_market(&digits));
    Some(format!("{}{}", market, digits))
}

/// Split an explicit market designator off the (lower-cased) input.
fn split_market(lower: &str) -> (Option<&'static str>, &str) {
    // Leading two-letter prefix: sh600000 / sz000001.
    if let Some(rest) = lower.strip_prefix(MARKET_SH) {
        return (Some(MARKET_SH), rest);
    }
    if let Some(rest) = lower.strip_prefix(MARKET_SZ) {
        return (Some(MARKET_SZ), rest);
    }

    // Numeric market convention: 1.600000 (Shanghai), 0.000001 (Shenzhen).
    if let Some(rest) = lower.strip_prefix("1.") {
        return (Some(MARKET_SH), rest);
    }
    if let Some(rest) = lower.strip_prefix("0.") {
        return (Some(MARKET_SZ), rest);
    }

    // Trailing suffix: 600000.sh / 000001.sz.
    if let Some(rest) = lower.strip_suffix(".sh") {
        return (Some(MARKET_SH), rest);
    }
    if let Some(rest) = lower.strip_suffix(".sz") {
        return (Some(MARKET_SZ), rest);
    }

    (None, lower)
}

/// Infer the market from the leading digit of a bare instrument code.
fn infer_market(digits: &str) -> &'static str {
    match digits.as_bytes().first() {
        Some(b'5') | Some(b'6') | Some(b'9') => MARKET_SH,
        _ => MARKET_SZ,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_all_shanghai_conventions() {
        for raw in ["600000", "sh600000", "SH600000", "1.600000", "600000.SH"] {
            assert_eq!(normalize(raw).as_deref(), Some("sh600000"), "input {raw}");
        }
    }

    #[test]
    fn test_normalize_all_shenzhen_conventions() {
        for raw in ["000001", "sz000001", "0.000001"] {
            assert_eq!(normalize(raw).as_deref(), Some("sz000001"), "input {raw}");
        }
    }

    #[test]
    fn test_normalize_infers_market_from_leading_digit() {
        assert_eq!(normalize("510300").as_deref(), Some("sh510300"));
        assert_eq!(normalize("900901").as_deref(), Some("sh900901"));
        assert_eq!(normalize("300750").as_deref(), Some("sz300750"));
        assert_eq!(normalize("002594").as_deref(), Some("sz002594"));
    }

    #[test]
    fn test_normalize_trims_whitespace() {
        assert_eq!(normalize("  sh600519 \t").as_deref(), Some("sh600519"));
    }

    #[test]
    fn test_normalize_rejects_inputs_without_digits() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("abc"), None);
        assert_eq!(normalize("sh"), None);
        assert_eq!(normalize("   "), None);
    }

    #[test]
    fn test_normalize_explicit_prefix_wins_over_inference() {
        // 000001 alone would infer Shenzhen; the prefix pins the index.
        assert_eq!(normalize("sh000001").as_deref(), Some("sh000001"));
    }
}
