use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::core::asset::Asset;
use crate::core::decimal::normalize;

/// Fractional digits used for the raw value ratio before truncation.
const RATIO_SCALE: u32 = 4;

/// An ordered, named collection of assets. Order is significant: rounding
/// discrepancies in the percentage split are redistributed by walking the
/// assets in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Portfolio {
    name: String,
    assets: Vec<Asset>,
}

impl Portfolio {
    pub fn new(name: impl Into<String>, assets: Vec<Asset>) -> Self {
        Self {
            name: name.into(),
            assets,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut [Asset] {
        &mut self.assets
    }

    /// Sum of all asset values, canonicalized. Exactly zero for an empty
    /// portfolio.
    pub fn total_value(&self) -> Decimal {
        normalize(self.assets.iter().map(|asset| asset.value()).sum())
    }

    /// Integer percentage of total value per asset, aligned with asset
    /// order. The raw shares are truncated toward zero, then the rounding
    /// discrepancy is redistributed one point at a time in asset order so
    /// the percentages always sum to exactly 100.
    pub fn percentages(&self) -> Vec<i32> {
        let total = self.total_value();
        if total <= Decimal::ZERO {
            return vec![0; self.assets.len()];
        }

        let mut percentages: Vec<i32> = self
            .assets
            .iter()
            .map(|asset| {
                let ratio = (asset.value() / total)
                    .round_dp_with_strategy(RATIO_SCALE, RoundingStrategy::MidpointAwayFromZero);
                (ratio * Decimal::ONE_HUNDRED).trunc().to_i32().unwrap_or(0)
            })
            .collect();

        let mut discrepancy = 100 - percentages.iter().sum::<i32>();
        while discrepancy != 0 {
            for percentage in percentages.iter_mut() {
                if discrepancy == 0 {
                    break;
                }
                let adjustment = if discrepancy > 0 { 1 } else { -1 };
                *percentage += adjustment;
                discrepancy -= adjustment;
            }
        }

        percentages
    }

    /// Percentage share of the portfolio's total value held by `symbol`,
    /// or 0 when the symbol is absent.
    pub fn percentage_of(&self, symbol: &str) -> i32 {
        self.assets
            .iter()
            .position(|asset| asset.symbol() == symbol)
            .map_or(0, |index| self.percentages()[index])
    }
}

impl fmt::Display for Portfolio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let percentages = self.percentages();
        write!(
            f,
            r#"{{"name": "{}", "total_value": {}, "assets": ["#,
            self.name,
            self.total_value()
        )?;
        for (index, asset) in self.assets.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(
                f,
                r#"{{"symbol": "{}", "shares": {}, "valuation": {}, "percentage": {}}}"#,
                asset.symbol(),
                asset.shares(),
                asset.valuation(),
                percentages[index]
            )?;
        }
        write!(f, "]}}")
    }
}
