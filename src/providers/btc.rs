use anyhow::anyhow;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::core::error::{Error, Result};
use crate::core::valuation::ValuationProvider;
use crate::providers::util::http_client;

/// BTC pricing with ordered fallback: the Coinbase exchange-rate table
/// first, CoinDesk's current price index second.
pub struct BtcProvider {
    coinbase_base_url: String,
    coindesk_base_url: String,
}

impl BtcProvider {
    pub fn new(coinbase_base_url: &str, coindesk_base_url: &str) -> Self {
        BtcProvider {
            coinbase_base_url: coinbase_base_url.to_string(),
            coindesk_base_url: coindesk_base_url.to_string(),
        }
    }

    /// Coinbase reports how much BTC one unit of reference currency buys;
    /// the asset price is the inverse of that rate.
    async fn fetch_from_coinbase(&self) -> anyhow::Result<Decimal> {
        let url = format!("{}/v2/exchange-rates", self.coinbase_base_url);
        debug!("Requesting exchange rates from {}", url);

        let response = http_client()?
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for URL: {}", e, url))?
            .error_for_status()?;

        let data = response.json::<ExchangeRatesResponse>().await?;
        let rate = data.data.rates.btc;
        if rate <= Decimal::ZERO {
            return Err(anyhow!("Non-positive exchange rate: {}", rate));
        }

        Ok(Decimal::ONE / rate)
    }

    /// CoinDesk reports a direct reference-currency price, no inversion.
    async fn fetch_from_coindesk(&self) -> anyhow::Result<Decimal> {
        let url = format!("{}/v1/bpi/currentprice.json", self.coindesk_base_url);
        debug!("Requesting price index from {}", url);

        let response = http_client()?
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for URL: {}", e, url))?
            .error_for_status()?;

        let text = response.text().await?;
        let data: CurrentPriceResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse price index response: {}", e))?;

        Ok(data.bpi.usd.rate_float)
    }
}

#[derive(Deserialize, Debug)]
struct ExchangeRatesResponse {
    data: ExchangeRatesData,
}

#[derive(Deserialize, Debug)]
struct ExchangeRatesData {
    rates: ExchangeRates,
}

#[derive(Deserialize, Debug)]
struct ExchangeRates {
    #[serde(rename = "BTC")]
    btc: Decimal,
}

#[derive(Deserialize, Debug)]
struct CurrentPriceResponse {
    bpi: PriceIndex,
}

#[derive(Deserialize, Debug)]
struct PriceIndex {
    #[serde(rename = "USD")]
    usd: PriceIndexQuote,
}

#[derive(Deserialize, Debug)]
struct PriceIndexQuote {
    rate_float: Decimal,
}

#[async_trait]
impl ValuationProvider for BtcProvider {
    #[instrument(name = "BtcPriceFetch", skip(self))]
    async fn fetch_price(&self) -> Result<Decimal> {
        match self.fetch_from_coinbase().await {
            Ok(price) => return Ok(price),
            Err(e) => warn!("Failed to get 'BTC' valuation from Coinbase: {e}."),
        }

        match self.fetch_from_coindesk().await {
            Ok(price) => Ok(price),
            Err(e) => {
                warn!("Failed to get 'BTC' valuation from CoinDesk: {e}.");
                Err(Error::UpstreamUnavailable(
                    "failed to get 'BTC' valuation".into(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const EXCHANGE_RATES_JSON: &str = r#"{"data": {"rates": {"BTC": "20000"}}}"#;
    const PRICE_INDEX_JSON: &str = r#"{"bpi": {"USD": {"rate_float": 20000.0}}}"#;

    async fn mock_coinbase(response: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/exchange-rates"))
            .respond_with(response)
            .mount(&server)
            .await;
        server
    }

    async fn mock_coindesk(response: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/bpi/currentprice.json"))
            .respond_with(response)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_primary_source_rate_is_inverted() {
        let coinbase =
            mock_coinbase(ResponseTemplate::new(200).set_body_string(EXCHANGE_RATES_JSON)).await;
        let coindesk = MockServer::start().await;
        let provider = BtcProvider::new(&coinbase.uri(), &coindesk.uri());

        let price = provider.fetch_price().await.unwrap();

        assert_eq!(price, dec!(0.00005));
    }

    #[tokio::test]
    async fn test_falls_back_when_primary_errors() {
        let coinbase = mock_coinbase(ResponseTemplate::new(500)).await;
        let coindesk =
            mock_coindesk(ResponseTemplate::new(200).set_body_string(PRICE_INDEX_JSON)).await;
        let provider = BtcProvider::new(&coinbase.uri(), &coindesk.uri());

        let price = provider.fetch_price().await.unwrap();

        // The fallback source reports a direct price, used unmodified.
        assert_eq!(price, dec!(20000));
    }

    #[tokio::test]
    async fn test_falls_back_when_primary_response_is_malformed() {
        let coinbase =
            mock_coinbase(ResponseTemplate::new(200).set_body_string(r#"{"data": {}}"#)).await;
        let coindesk =
            mock_coindesk(ResponseTemplate::new(200).set_body_string(PRICE_INDEX_JSON)).await;
        let provider = BtcProvider::new(&coinbase.uri(), &coindesk.uri());

        let price = provider.fetch_price().await.unwrap();

        assert_eq!(price, dec!(20000));
    }

    #[tokio::test]
    async fn test_fails_when_both_sources_fail() {
        let coinbase = mock_coinbase(ResponseTemplate::new(500)).await;
        let coindesk = mock_coindesk(ResponseTemplate::new(503)).await;
        let provider = BtcProvider::new(&coinbase.uri(), &coindesk.uri());

        let err = provider.fetch_price().await.unwrap_err();

        assert!(matches!(err, Error::UpstreamUnavailable(_)));
        assert_eq!(err.to_string(), "failed to get 'BTC' valuation");
    }

    #[tokio::test]
    async fn test_zero_rate_from_primary_falls_back() {
        let coinbase = mock_coinbase(
            ResponseTemplate::new(200).set_body_string(r#"{"data": {"rates": {"BTC": "0"}}}"#),
        )
        .await;
        let coindesk =
            mock_coindesk(ResponseTemplate::new(200).set_body_string(PRICE_INDEX_JSON)).await;
        let provider = BtcProvider::new(&coinbase.uri(), &coindesk.uri());

        let price = provider.fetch_price().await.unwrap();

        assert_eq!(price, dec!(20000));
    }
}
