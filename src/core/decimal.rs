//! Canonical decimal scale handling

use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits kept by default for stored and displayed decimals.
pub const DEFAULT_SCALE: u32 = 8;

/// Canonicalizes a decimal at the default scale.
pub fn normalize(value: Decimal) -> Decimal {
    normalize_to(value, DEFAULT_SCALE)
}

/// Rounds half-up to `scale` fractional digits and strips trailing zeros.
///
/// The result is re-parsed from its plain textual form so that two values
/// which print identically also compare identically, independent of how
/// they were constructed.
pub fn normalize_to(value: Decimal, scale: u32) -> Decimal {
    let rounded = value
        .round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    rounded.to_string().parse().unwrap_or(rounded)
}
