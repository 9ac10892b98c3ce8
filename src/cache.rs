use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::info;

use crate::core::decimal::normalize;
use crate::core::{Result, ValuationProvider};

/// How long a cached valuation is served before a refresh is forced.
pub const FRESHNESS_WINDOW: Duration = Duration::from_millis(20_000);

struct CachedValuation {
    price: Decimal,
    fetched_at_millis: i64,
}

/// Most recently fetched price per symbol, refreshed through a provider
/// once the freshness window elapses. At most one entry exists per symbol;
/// entries are overwritten on refresh and live for the process lifetime.
pub struct ValuationCache {
    entries: Mutex<HashMap<String, CachedValuation>>,
    freshness_window_millis: i64,
}

impl ValuationCache {
    pub fn new() -> Self {
        Self::with_freshness_window(FRESHNESS_WINDOW)
    }

    pub fn with_freshness_window(window: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            freshness_window_millis: window.as_millis() as i64,
        }
    }

    /// Returns the cached valuation for `symbol`, or fetches a fresh one
    /// through `provider` when the entry is missing or stale. A fetch
    /// failure propagates and leaves the previous state untouched.
    pub async fn get_valuation(
        &self,
        symbol: &str,
        provider: &dyn ValuationProvider,
    ) -> Result<Decimal> {
        let cached = {
            let entries = self.entries.lock().await;
            entries
                .get(symbol)
                .map(|entry| (entry.price, entry.fetched_at_millis))
        };

        if let Some((price, fetched_at_millis)) = cached {
            let age = Utc::now().timestamp_millis() - fetched_at_millis;
            // A zero price is indistinguishable from a missing entry and
            // always forces a refetch.
            if !price.is_zero() && age < self.freshness_window_millis {
                info!(
                    symbol,
                    price = %normalize(price),
                    cooldown_ms = self.freshness_window_millis - age,
                    "using cached valuation"
                );
                return Ok(price);
            }
        }

        // The upstream call runs outside the critical section so a slow
        // source does not serialize lookups for unrelated symbols.
        let price = provider.fetch_price().await?;
        let mut entries = self.entries.lock().await;
        entries.insert(
            symbol.to_string(),
            CachedValuation {
                price,
                fetched_at_millis: Utc::now().timestamp_millis(),
            },
        );
        info!(symbol, price = %normalize(price), "updated cached valuation");
        Ok(price)
    }
}

impl Default for ValuationCache {
    fn default() -> Self {
        Self::new()
    }
}
