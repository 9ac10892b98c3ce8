//! Pricing abstraction over upstream valuation sources

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::core::error::Result;

/// Fetches the current unit price for one asset symbol from one or more
/// upstream sources. Each implementation owns its own fallback ordering;
/// the cache and the orchestrator stay symbol-agnostic and dispatch
/// through a lookup table.
#[async_trait]
pub trait ValuationProvider: Send + Sync {
    /// Current price in reference currency per unit of the asset. Fails
    /// with [`crate::core::Error::UpstreamUnavailable`] when no configured
    /// source responds.
    async fn fetch_price(&self) -> Result<Decimal>;
}
