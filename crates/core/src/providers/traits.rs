use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::price::PriceMap;

/// Trait abstraction for live price feeds.
///
/// Each API (CoinCap, CoinGecko) implements this trait. If an API stops
/// working or changes, only that one implementation is replaced.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch USD quotes for `symbols` (uppercase tickers).
    ///
    /// Symbols the provider does not know are omitted from the result,
    /// not reported as errors. An `Err` means the request itself failed.
    async fn fetch_prices(&self, symbols: &[String]) -> Result<PriceMap, CoreError>;
}
