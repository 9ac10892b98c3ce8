use std::fmt;

use rust_decimal::Decimal;

use crate::core::decimal::{normalize, normalize_to};
use crate::core::error::{Error, Result};

/// Symbol of the reference currency. Its valuation is pinned to exactly 1.
pub const REFERENCE_CURRENCY: &str = "USD";

/// Scale used for reference currency shares (whole cents).
const CENT_SCALE: u32 = 2;

/// A single holding: an immutable symbol plus a mutable share count and
/// unit valuation, all numeric fields kept in canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    symbol: String,
    shares: Decimal,
    valuation: Decimal,
}

impl Asset {
    /// Creates an asset, canonicalizing both numeric fields. Reference
    /// currency holdings keep shares at cent scale and a valuation of 1,
    /// regardless of the constructor arguments.
    pub fn new(symbol: impl Into<String>, shares: Decimal, valuation: Decimal) -> Self {
        let symbol = symbol.into();
        let (shares, valuation) = if symbol == REFERENCE_CURRENCY {
            (normalize_to(shares, CENT_SCALE), Decimal::ONE)
        } else {
            (normalize(shares), normalize(valuation))
        };
        Self {
            symbol,
            shares,
            valuation,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn shares(&self) -> Decimal {
        self.shares
    }

    /// Replaces the share count. Shares must stay strictly positive.
    pub fn set_shares(&mut self, shares: Decimal) -> Result<()> {
        if shares <= Decimal::ZERO {
            return Err(Error::InvalidArgument(
                "number of shares must be greater than zero".into(),
            ));
        }
        self.shares = normalize(shares);
        Ok(())
    }

    pub fn valuation(&self) -> Decimal {
        self.valuation
    }

    /// Replaces the unit valuation. Valuations are non-negative, and the
    /// reference currency only ever accepts exactly 1.
    pub fn set_valuation(&mut self, valuation: Decimal) -> Result<()> {
        let valuation = normalize(valuation);
        if self.symbol == REFERENCE_CURRENCY && valuation != Decimal::ONE {
            return Err(Error::InvalidArgument(format!(
                "cannot set valuation of asset '{REFERENCE_CURRENCY}'"
            )));
        }
        if valuation < Decimal::ZERO {
            return Err(Error::InvalidArgument(
                "asset valuation must be non-negative".into(),
            ));
        }
        self.valuation = valuation;
        Ok(())
    }

    /// Market value of the holding: shares times unit valuation.
    pub fn value(&self) -> Decimal {
        normalize(self.shares * self.valuation)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"{{"symbol": "{}", "shares": {}, "valuation": {}}}"#,
            self.symbol, self.shares, self.valuation
        )
    }
}
