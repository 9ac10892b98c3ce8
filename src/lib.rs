pub mod cache;
pub mod cli;
pub mod config;
pub mod core;
pub mod log;
pub mod providers;
pub mod service;
pub mod store;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cache::ValuationCache;
use crate::core::ValuationProvider;
use crate::providers::btc::BtcProvider;
use crate::providers::eth::EthProvider;
use crate::service::PortfolioService;
use crate::store::memory::MemoryStore;

/// Commands exposed by the application.
pub enum AppCommand {
    List { assets: Vec<String>, json: bool },
    Show {
        name: String,
        assets: Vec<String>,
        json: bool,
    },
    Total { name: String },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Portfolio tracker starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let service = build_service(&config);

    match command {
        AppCommand::List { assets, json } => cli::portfolios::list(&service, &assets, json).await,
        AppCommand::Show { name, assets, json } => {
            cli::portfolios::show(&service, &name, &assets, json).await
        }
        AppCommand::Total { name } => cli::portfolios::total(&service, &name).await,
    }
}

/// Wires the store, cache and pricing providers from configuration.
pub fn build_service(config: &config::AppConfig) -> PortfolioService {
    let store = Arc::new(MemoryStore::with_portfolios(
        config.portfolios.iter().map(|seed| seed.build()).collect(),
    ));

    let mut providers: HashMap<String, Arc<dyn ValuationProvider>> = HashMap::new();
    providers.insert(
        "BTC".to_string(),
        Arc::new(BtcProvider::new(
            config.providers.coinbase_base_url(),
            config.providers.coindesk_base_url(),
        )),
    );
    providers.insert(
        "ETH".to_string(),
        Arc::new(EthProvider::new(config.providers.cryptocompare_base_url())),
    );

    PortfolioService::new(store, ValuationCache::new(), providers)
}
