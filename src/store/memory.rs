use std::sync::RwLock;

use crate::core::Portfolio;
use crate::store::PortfolioStore;

/// In-memory portfolio store. Insertion order is preserved, and every read
/// hands out an owned copy so callers never share asset instances.
pub struct MemoryStore {
    portfolios: RwLock<Vec<Portfolio>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_portfolios(Vec::new())
    }

    /// Creates a store pre-populated with seed portfolios.
    pub fn with_portfolios(portfolios: Vec<Portfolio>) -> Self {
        Self {
            portfolios: RwLock::new(portfolios),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PortfolioStore for MemoryStore {
    fn create(&self, portfolio: Portfolio) -> bool {
        let mut portfolios = self.portfolios.write().unwrap();
        if portfolios.iter().any(|p| p.name() == portfolio.name()) {
            return false;
        }
        portfolios.push(portfolio);
        true
    }

    fn list(&self) -> Vec<Portfolio> {
        self.portfolios.read().unwrap().clone()
    }

    fn get_by_name(&self, name: &str) -> Option<Portfolio> {
        self.portfolios
            .read()
            .unwrap()
            .iter()
            .find(|p| p.name() == name)
            .cloned()
    }

    fn delete_by_name(&self, name: &str) -> bool {
        let mut portfolios = self.portfolios.write().unwrap();
        let before = portfolios.len();
        portfolios.retain(|p| p.name() != name);
        portfolios.len() != before
    }
}
