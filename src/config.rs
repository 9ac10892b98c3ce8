use anyhow::{Context, Result};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

use crate::core::{Asset, Portfolio};

const DEFAULT_COINBASE_BASE_URL: &str = "https://api.coinbase.com";
const DEFAULT_COINDESK_BASE_URL: &str = "https://api.coindesk.com";
const DEFAULT_CRYPTOCOMPARE_BASE_URL: &str = "https://min-api.cryptocompare.com";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AssetSeed {
    pub symbol: String,
    pub shares: Decimal,
    pub valuation: Decimal,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PortfolioSeed {
    pub name: String,
    #[serde(default)]
    pub assets: Vec<AssetSeed>,
}

impl PortfolioSeed {
    /// Builds the portfolio entity seeded by this config entry.
    pub fn build(&self) -> Portfolio {
        let assets = self
            .assets
            .iter()
            .map(|seed| Asset::new(seed.symbol.clone(), seed.shares, seed.valuation))
            .collect();
        Portfolio::new(self.name.clone(), assets)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinbaseProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoindeskProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CryptoCompareProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub coinbase: Option<CoinbaseProviderConfig>,
    pub coindesk: Option<CoindeskProviderConfig>,
    pub cryptocompare: Option<CryptoCompareProviderConfig>,
}

impl ProvidersConfig {
    pub fn coinbase_base_url(&self) -> &str {
        self.coinbase
            .as_ref()
            .map_or(DEFAULT_COINBASE_BASE_URL, |p| &p.base_url)
    }

    pub fn coindesk_base_url(&self) -> &str {
        self.coindesk
            .as_ref()
            .map_or(DEFAULT_COINDESK_BASE_URL, |p| &p.base_url)
    }

    pub fn cryptocompare_base_url(&self) -> &str {
        self.cryptocompare
            .as_ref()
            .map_or(DEFAULT_CRYPTOCOMPARE_BASE_URL, |p| &p.base_url)
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            coinbase: Some(CoinbaseProviderConfig {
                base_url: DEFAULT_COINBASE_BASE_URL.to_string(),
            }),
            coindesk: Some(CoindeskProviderConfig {
                base_url: DEFAULT_COINDESK_BASE_URL.to_string(),
            }),
            cryptocompare: Some(CryptoCompareProviderConfig {
                base_url: DEFAULT_CRYPTOCOMPARE_BASE_URL.to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub portfolios: Vec<PortfolioSeed>,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "folio")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
