use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info};

use crate::cache::ValuationCache;
use crate::core::{Asset, Error, Portfolio, Result, ValuationProvider};
use crate::store::PortfolioStore;

/// Orchestrates the portfolio store, the valuation cache and the pricing
/// providers. Every portfolio handed out has its priced assets refreshed.
pub struct PortfolioService {
    store: Arc<dyn PortfolioStore>,
    cache: ValuationCache,
    providers: HashMap<String, Arc<dyn ValuationProvider>>,
}

impl PortfolioService {
    pub fn new(
        store: Arc<dyn PortfolioStore>,
        cache: ValuationCache,
        providers: HashMap<String, Arc<dyn ValuationProvider>>,
    ) -> Self {
        Self {
            store,
            cache,
            providers,
        }
    }

    /// Creates a new portfolio with an empty list of assets.
    pub fn create_portfolio(&self, name: &str) -> Result<()> {
        let portfolio = Portfolio::new(name, Vec::new());
        if !self.store.create(portfolio) {
            info!("Could not create portfolio '{name}'.");
            return Err(Error::AlreadyExists(format!(
                "portfolio '{name}' already exists"
            )));
        }
        info!("Created portfolio '{name}'.");
        Ok(())
    }

    /// All stored portfolios, with asset valuations refreshed.
    pub async fn get_all_portfolios(&self) -> Result<Vec<Portfolio>> {
        let portfolios = self.store.list();
        let refreshed = portfolios.into_iter().map(|mut portfolio| async move {
            self.update_asset_valuations(&mut portfolio).await?;
            Ok::<_, Error>(portfolio)
        });
        try_join_all(refreshed).await
    }

    /// A portfolio by name, with asset valuations refreshed.
    pub async fn get_portfolio_by_name(&self, name: &str) -> Result<Portfolio> {
        let mut portfolio = self
            .store
            .get_by_name(name)
            .ok_or_else(|| Error::NotFound(format!("portfolio '{name}' not found")))?;
        self.update_asset_valuations(&mut portfolio).await?;
        Ok(portfolio)
    }

    /// Deletes a portfolio by name if it exists.
    pub fn delete_portfolio(&self, name: &str) -> Result<()> {
        if !self.store.delete_by_name(name) {
            info!("Could not delete portfolio '{name}'.");
            return Err(Error::NotFound(format!("portfolio '{name}' not found")));
        }
        info!("Deleted portfolio '{name}'.");
        Ok(())
    }

    /// Builds a new portfolio holding fresh copies of the requested
    /// symbols, in request order, with refreshed valuations. The symbol
    /// list must be free of duplicates, empty entries and non-alphabetic
    /// characters, and every symbol must be present in the portfolio.
    pub async fn filter_by_symbols(
        &self,
        portfolio: &Portfolio,
        symbols: &[String],
    ) -> Result<Portfolio> {
        info!(
            "Filtering portfolio '{}' for assets: {symbols:?}.",
            portfolio.name()
        );

        if !has_unique_symbols(symbols) {
            return Err(Error::BadRequest(
                "cannot filter portfolio by duplicate asset symbols".into(),
            ));
        }

        let mut filtered: Vec<Asset> = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            if symbol.is_empty() {
                return Err(Error::BadRequest("asset symbol cannot be empty".into()));
            }
            if !symbol.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(Error::BadRequest(format!(
                    "asset symbol '{symbol}' contains invalid characters"
                )));
            }
            let asset = portfolio
                .assets()
                .iter()
                .find(|asset| asset.symbol() == *symbol)
                .ok_or_else(|| {
                    Error::NotFound(format!(
                        "asset '{symbol}' not found in portfolio '{}'",
                        portfolio.name()
                    ))
                })?;
            filtered.push(asset.clone());
        }

        let mut filtered = Portfolio::new(portfolio.name(), filtered);
        self.update_asset_valuations(&mut filtered).await?;
        Ok(filtered)
    }

    /// Applies [`Self::filter_by_symbols`] element-wise to a list of
    /// portfolios.
    pub async fn filter_portfolios(
        &self,
        portfolios: &[Portfolio],
        symbols: &[String],
    ) -> Result<Vec<Portfolio>> {
        try_join_all(
            portfolios
                .iter()
                .map(|portfolio| self.filter_by_symbols(portfolio, symbols)),
        )
        .await
    }

    /// Refreshes the valuation of every asset with a configured pricing
    /// provider, going through the cache. The reference currency and
    /// unrecognized symbols are left untouched.
    pub async fn update_asset_valuations(&self, portfolio: &mut Portfolio) -> Result<()> {
        let name = portfolio.name().to_string();
        for asset in portfolio.assets_mut() {
            match self.providers.get(asset.symbol()) {
                Some(provider) => {
                    debug!(
                        "Updating '{}' valuation in portfolio '{}'.",
                        asset.symbol(),
                        name
                    );
                    let price = self
                        .cache
                        .get_valuation(asset.symbol(), provider.as_ref())
                        .await?;
                    asset.set_valuation(price)?;
                }
                None => debug!("No update required for asset '{}'.", asset.symbol()),
            }
        }
        Ok(())
    }
}

fn has_unique_symbols(symbols: &[String]) -> bool {
    let unique: HashSet<&String> = symbols.iter().collect();
    unique.len() == symbols.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedProvider {
        price: Decimal,
        call_count: AtomicUsize,
    }

    impl FixedProvider {
        fn new(price: Decimal) -> Self {
            Self {
                price,
                call_count: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ValuationProvider for FixedProvider {
        async fn fetch_price(&self) -> Result<Decimal> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            Ok(self.price)
        }
    }

    struct DownProvider;

    #[async_trait]
    impl ValuationProvider for DownProvider {
        async fn fetch_price(&self) -> Result<Decimal> {
            Err(Error::UpstreamUnavailable("all sources failed".into()))
        }
    }

    fn seeded_store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_portfolios(vec![Portfolio::new(
            "Will's Portfolio",
            vec![
                Asset::new("USD", dec!(10), dec!(1)),
                Asset::new("ETH", dec!(10), dec!(1000)),
                Asset::new("BTC", dec!(10), dec!(10000)),
            ],
        )]))
    }

    fn service_with(
        store: Arc<MemoryStore>,
        btc_price: Decimal,
        eth_price: Decimal,
    ) -> PortfolioService {
        let mut providers: HashMap<String, Arc<dyn ValuationProvider>> = HashMap::new();
        providers.insert("BTC".to_string(), Arc::new(FixedProvider::new(btc_price)));
        providers.insert("ETH".to_string(), Arc::new(FixedProvider::new(eth_price)));
        PortfolioService::new(store, ValuationCache::new(), providers)
    }

    fn symbols(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_create_portfolio() {
        let service = service_with(Arc::new(MemoryStore::new()), dec!(1), dec!(1));

        service.create_portfolio("Fresh").unwrap();

        let portfolio = service.get_portfolio_by_name("Fresh").await.unwrap();
        assert!(portfolio.assets().is_empty());
    }

    #[tokio::test]
    async fn test_create_duplicate_portfolio_fails() {
        let service = service_with(seeded_store(), dec!(1), dec!(1));

        let err = service.create_portfolio("Will's Portfolio").unwrap_err();

        assert!(matches!(err, Error::AlreadyExists(_)));
        assert_eq!(err.to_string(), "portfolio 'Will's Portfolio' already exists");
    }

    #[tokio::test]
    async fn test_get_by_name_refreshes_priced_assets_only() {
        let service = service_with(seeded_store(), dec!(20000), dec!(1500));

        let portfolio = service
            .get_portfolio_by_name("Will's Portfolio")
            .await
            .unwrap();

        let valuations: Vec<_> = portfolio
            .assets()
            .iter()
            .map(|asset| asset.valuation())
            .collect();
        assert_eq!(valuations, vec![dec!(1), dec!(1500), dec!(20000)]);
    }

    #[tokio::test]
    async fn test_get_by_name_missing_fails() {
        let service = service_with(seeded_store(), dec!(1), dec!(1));

        let err = service.get_portfolio_by_name("Nope").await.unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(err.to_string(), "portfolio 'Nope' not found");
    }

    #[tokio::test]
    async fn test_get_all_portfolios() {
        let store = seeded_store();
        store.create(Portfolio::new(
            "Second",
            vec![Asset::new("ETH", dec!(1), dec!(0))],
        ));
        let service = service_with(store, dec!(20000), dec!(1500));

        let portfolios = service.get_all_portfolios().await.unwrap();

        assert_eq!(portfolios.len(), 2);
        assert_eq!(portfolios[1].assets()[0].valuation(), dec!(1500));
    }

    #[tokio::test]
    async fn test_upstream_failure_fails_the_whole_response() {
        let mut providers: HashMap<String, Arc<dyn ValuationProvider>> = HashMap::new();
        providers.insert("BTC".to_string(), Arc::new(DownProvider));
        providers.insert("ETH".to_string(), Arc::new(FixedProvider::new(dec!(1500))));
        let service =
            PortfolioService::new(seeded_store(), ValuationCache::new(), providers);

        let err = service
            .get_portfolio_by_name("Will's Portfolio")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_repeated_reads_share_the_cached_valuation() {
        let store = seeded_store();
        let btc = Arc::new(FixedProvider::new(dec!(20000)));
        let mut providers: HashMap<String, Arc<dyn ValuationProvider>> = HashMap::new();
        providers.insert("BTC".to_string(), Arc::clone(&btc) as _);
        providers.insert("ETH".to_string(), Arc::new(FixedProvider::new(dec!(1500))));
        let service = PortfolioService::new(store, ValuationCache::new(), providers);

        service
            .get_portfolio_by_name("Will's Portfolio")
            .await
            .unwrap();
        service
            .get_portfolio_by_name("Will's Portfolio")
            .await
            .unwrap();

        assert_eq!(btc.call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_delete_portfolio() {
        let service = service_with(seeded_store(), dec!(1), dec!(1));

        service.delete_portfolio("Will's Portfolio").unwrap();

        let err = service.delete_portfolio("Will's Portfolio").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_filter_with_duplicate_symbols_fails() {
        let service = service_with(seeded_store(), dec!(1), dec!(1));
        let portfolio = service.store.get_by_name("Will's Portfolio").unwrap();

        let err = service
            .filter_by_symbols(&portfolio, &symbols(&["BTC", "BTC"]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::BadRequest(_)));
        assert_eq!(
            err.to_string(),
            "cannot filter portfolio by duplicate asset symbols"
        );
    }

    #[tokio::test]
    async fn test_filter_with_empty_symbol_fails() {
        let service = service_with(seeded_store(), dec!(1), dec!(1));
        let portfolio = service.store.get_by_name("Will's Portfolio").unwrap();

        let err = service
            .filter_by_symbols(&portfolio, &symbols(&[""]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::BadRequest(_)));
        assert_eq!(err.to_string(), "asset symbol cannot be empty");
    }

    #[tokio::test]
    async fn test_filter_with_invalid_characters_fails() {
        let service = service_with(seeded_store(), dec!(1), dec!(1));
        let portfolio = service.store.get_by_name("Will's Portfolio").unwrap();

        let err = service
            .filter_by_symbols(&portfolio, &symbols(&["123"]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::BadRequest(_)));
        assert_eq!(
            err.to_string(),
            "asset symbol '123' contains invalid characters"
        );
    }

    #[tokio::test]
    async fn test_filter_with_absent_symbol_fails() {
        let service = service_with(seeded_store(), dec!(1), dec!(1));
        let portfolio = service.store.get_by_name("Will's Portfolio").unwrap();

        let err = service
            .filter_by_symbols(&portfolio, &symbols(&["DOGE"]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(
            err.to_string(),
            "asset 'DOGE' not found in portfolio 'Will's Portfolio'"
        );
    }

    #[tokio::test]
    async fn test_filter_keeps_request_order() {
        let service = service_with(seeded_store(), dec!(20000), dec!(1500));
        let portfolio = service.store.get_by_name("Will's Portfolio").unwrap();

        let filtered = service
            .filter_by_symbols(&portfolio, &symbols(&["BTC", "USD"]))
            .await
            .unwrap();

        let ordered: Vec<_> = filtered
            .assets()
            .iter()
            .map(|asset| asset.symbol().to_string())
            .collect();
        assert_eq!(ordered, vec!["BTC", "USD"]);
        assert_eq!(filtered.assets()[0].valuation(), dec!(20000));
    }

    #[tokio::test]
    async fn test_filter_produces_fresh_copies() {
        let service = service_with(seeded_store(), dec!(20000), dec!(1500));
        let portfolio = service.store.get_by_name("Will's Portfolio").unwrap();

        let mut filtered = service
            .filter_by_symbols(&portfolio, &symbols(&["ETH"]))
            .await
            .unwrap();
        filtered.assets_mut()[0].set_shares(dec!(42)).unwrap();

        assert_eq!(portfolio.assets()[1].shares(), dec!(10));
    }

    #[tokio::test]
    async fn test_filter_portfolios_maps_element_wise() {
        let store = seeded_store();
        store.create(Portfolio::new(
            "Second",
            vec![
                Asset::new("USD", dec!(100), dec!(1)),
                Asset::new("BTC", dec!(1), dec!(10000)),
            ],
        ));
        let service = service_with(store, dec!(20000), dec!(1500));
        let portfolios = service.store.list();

        let filtered = service
            .filter_portfolios(&portfolios, &symbols(&["BTC"]))
            .await
            .unwrap();

        assert_eq!(filtered.len(), 2);
        for portfolio in &filtered {
            assert_eq!(portfolio.assets().len(), 1);
            assert_eq!(portfolio.assets()[0].symbol(), "BTC");
        }
    }
}
