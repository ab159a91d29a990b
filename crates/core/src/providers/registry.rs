use std::collections::HashMap;

use super::coincap::CoinCapProvider;
use super::coingecko::CoinGeckoProvider;
use super::traits::PriceProvider;

/// Ordered list of price providers.
///
/// The first registered provider is the primary; the rest are fallbacks for
/// symbols the earlier ones could not price.
pub struct PriceProviderRegistry {
    providers: Vec<Box<dyn PriceProvider>>,
}

impl PriceProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Create a registry with all default providers pre-configured.
    pub fn new_with_defaults(api_keys: &HashMap<String, String>) -> Self {
        let mut registry = Self::new();

        // CoinCap: no API key needed
        registry.register(Box::new(CoinCapProvider::new()));

        // CoinGecko: works keyless on the public tier, demo key optional
        registry.register(Box::new(CoinGeckoProvider::new(
            api_keys.get("coingecko").cloned(),
        )));

        registry
    }

    /// Register a new price provider.
    pub fn register(&mut self, provider: Box<dyn PriceProvider>) {
        self.providers.push(provider);
    }

    /// All providers, in priority order.
    pub fn providers(&self) -> impl Iterator<Item = &dyn PriceProvider> {
        self.providers.iter().map(|p| p.as_ref())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for PriceProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
