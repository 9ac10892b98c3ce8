use anyhow::anyhow;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::core::error::{Error, Result};
use crate::core::valuation::ValuationProvider;
use crate::providers::util::http_client;

/// ETH pricing from CryptoCompare. A single source, no fallback.
pub struct EthProvider {
    base_url: String,
}

impl EthProvider {
    pub fn new(base_url: &str) -> Self {
        EthProvider {
            base_url: base_url.to_string(),
        }
    }

    async fn fetch_from_cryptocompare(&self) -> anyhow::Result<Decimal> {
        let url = format!("{}/data/price?fsym=ETH&tsyms=USD", self.base_url);
        debug!("Requesting spot price from {}", url);

        let response = http_client()?
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for URL: {}", e, url))?
            .error_for_status()?;

        let data = response.json::<SpotPriceResponse>().await?;
        Ok(data.usd)
    }
}

#[derive(Deserialize, Debug)]
struct SpotPriceResponse {
    #[serde(rename = "USD")]
    usd: Decimal,
}

#[async_trait]
impl ValuationProvider for EthProvider {
    #[instrument(name = "EthPriceFetch", skip(self))]
    async fn fetch_price(&self) -> Result<Decimal> {
        match self.fetch_from_cryptocompare().await {
            Ok(price) => Ok(price),
            Err(e) => {
                warn!("Failed to get 'ETH' valuation from CryptoCompare: {e}.");
                Err(Error::UpstreamUnavailable(
                    "failed to get 'ETH' valuation".into(),
                ))
            }
        }
    }
}
