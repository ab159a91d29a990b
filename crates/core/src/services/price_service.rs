use log::{debug, warn};

use crate::errors::CoreError;
use crate::models::price::PriceMap;
use crate::providers::registry::PriceProviderRegistry;

/// Fetches live quotes from the registered providers with fallback.
///
/// The first provider is asked for every symbol; each following provider is
/// only asked for the symbols still missing. Symbols nobody can price are
/// simply absent from the result.
///
/// **Note on precision**: prices are `f64`. Good enough for display figures,
/// but repeated arithmetic may accumulate small floating-point errors.
pub struct PriceService {
    registry: PriceProviderRegistry,
}

impl PriceService {
    pub fn new(registry: PriceProviderRegistry) -> Self {
        Self { registry }
    }

    /// Names of all registered providers, in priority order.
    pub fn provider_names(&self) -> Vec<String> {
        self.registry.providers().map(|p| p.name().to_string()).collect()
    }

    /// Fetch quotes for `symbols`.
    ///
    /// Returns `Err` only when every provider that was asked failed outright;
    /// a partial answer is `Ok`. Quotes that are not finite or are negative
    /// are discarded.
    pub async fn fetch_prices(&self, symbols: &[String]) -> Result<PriceMap, CoreError> {
        let mut remaining: Vec<String> = symbols.iter().map(|s| s.trim().to_uppercase()).collect();
        remaining.retain(|s| !s.is_empty());
        remaining.sort();
        remaining.dedup();

        let mut quotes = PriceMap::new();
        if remaining.is_empty() {
            return Ok(quotes);
        }
        if self.registry.is_empty() {
            return Err(CoreError::NoProvider);
        }

        let mut any_ok = false;
        let mut last_error = None;

        for provider in self.registry.providers() {
            if remaining.is_empty() {
                break;
            }
            match provider.fetch_prices(&remaining).await {
                Ok(batch) => {
                    any_ok = true;
                    for (symbol, quote) in batch {
                        let symbol = symbol.to_uppercase();
                        if !remaining.contains(&symbol) {
                            continue;
                        }
                        if !quote.price.is_finite() || quote.price < 0.0 {
                            warn!(
                                "{} returned an invalid price for {symbol}: {}",
                                provider.name(),
                                quote.price
                            );
                            continue;
                        }
                        quotes.insert(symbol, quote);
                    }
                    remaining.retain(|s| !quotes.contains_key(s));
                }
                Err(e) => {
                    warn!("Price provider {} failed: {e}", provider.name());
                    last_error = Some(e);
                }
            }
        }

        if !any_ok {
            return Err(last_error.unwrap_or(CoreError::NoProvider));
        }
        if !remaining.is_empty() {
            debug!("No quote available for {}", remaining.join(", "));
        }
        debug!("Fetched {} quotes", quotes.len());
        Ok(quotes)
    }
}
