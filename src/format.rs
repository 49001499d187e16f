//! Display formatting for money, dates and account numbers
//!
//! ## Currency
//! Amounts are `Decimal`, rounded half-away-from-zero to 2 places before
//! rendering, so `0.1 + 0.2` shows as `$0.30`. Negative amounts carry the
//! minus sign before the symbol: `-$1,234.56`.
//!
//! ## Usage
//! ```rust
//! use bank_dashboard::format::{format_account_number, format_currency};
//! use rust_decimal::Decimal;
//!
//! assert_eq!(format_currency(Decimal::new(123456, 2)), "$1,234.56");
//! assert_eq!(format_account_number("1234567890123456"), "xxxx-xxxx-3456");
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;

const CURRENCY_SYMBOL: &str = "$";
const MASK_PREFIX: &str = "xxxx-xxxx-";
pub const INVALID_DATE: &str = "Invalid Date";

// ============================================================================
// Currency
// ============================================================================

/// Format an amount as US dollars with thousands separators and 2 decimals
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    let abs = rounded.abs();
    let whole = abs.trunc().to_u128().unwrap_or(0);
    let cents = ((abs - abs.trunc()) * Decimal::ONE_HUNDRED)
        .round()
        .to_u32()
        .unwrap_or(0);

    format!(
        "{}{}{}.{:02}",
        if negative { "-" } else { "" },
        CURRENCY_SYMBOL,
        group_thousands(whole),
        cents
    )
}

fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ============================================================================
// Dates
// ============================================================================

/// Format an RFC 3339 timestamp as `Jan 1, 2023, 10:00 AM` (UTC)
///
/// Unparseable input renders as [`INVALID_DATE`]; this never panics.
pub fn format_date(date: &str) -> String {
    match DateTime::parse_from_rfc3339(date.trim()) {
        Ok(parsed) => parsed
            .with_timezone(&Utc)
            .format("%b %-d, %Y, %I:%M %p")
            .to_string(),
        Err(_) => INVALID_DATE.to_string(),
    }
}

// ============================================================================
// Account numbers
// ============================================================================

/// Mask all but the last four characters: `xxxx-xxxx-3456`
///
/// Inputs shorter than four characters are returned unchanged.
pub fn format_account_number(account_number: &str) -> String {
    let chars: Vec<char> = account_number.chars().collect();
    if chars.len() < 4 {
        return account_number.to_string();
    }
    let last_four: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", MASK_PREFIX, last_four)
}

// ============================================================================
// Pagination
// ============================================================================

/// Slice out a 1-based page. Page 0 and pages past the end are empty.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Number of pages needed for `len` items
pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}
