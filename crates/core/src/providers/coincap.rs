use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use super::traits::PriceProvider;
use crate::errors::CoreError;
use crate::models::price::{PriceMap, PriceQuote};

const BASE_URL: &str = "https://api.coincap.io/v2";

/// CoinCap API provider.
///
/// - **Free**: No API key required.
/// - **Endpoints**: `/assets?ids=a,b,c` (batch quotes), `/assets?search={symbol}`
///
/// CoinCap addresses assets by lowercase ids like "bitcoin", "ethereum".
/// Common symbols are mapped statically; unknown ones are resolved through the
/// search endpoint and remembered.
pub struct CoinCapProvider {
    client: Client,
    /// Uppercase symbol (BTC) → CoinCap asset id (bitcoin)
    symbol_map: Mutex<HashMap<String, String>>,
}

impl CoinCapProvider {
    pub fn new() -> Self {
        let common = [
            ("BTC", "bitcoin"),
            ("ETH", "ethereum"),
            ("USDT", "tether"),
            ("USDC", "usd-coin"),
            ("BNB", "binance-coin"),
            ("XRP", "xrp"),
            ("ADA", "cardano"),
            ("SOL", "solana"),
            ("DOGE", "dogecoin"),
            ("DOT", "polkadot"),
            ("MATIC", "polygon"),
            ("LTC", "litecoin"),
            ("AVAX", "avalanche"),
            ("LINK", "chainlink"),
            ("UNI", "uniswap"),
            ("ATOM", "cosmos"),
            ("XLM", "stellar"),
            ("ALGO", "algorand"),
            ("NEAR", "near-protocol"),
            ("SHIB", "shiba-inu"),
            ("TRX", "tron"),
            ("DAI", "multi-collateral-dai"),
            ("AAVE", "aave"),
            ("FIL", "filecoin"),
            ("ICP", "internet-computer"),
            ("ETC", "ethereum-classic"),
            ("XMR", "monero"),
        ];
        let symbol_map = common
            .iter()
            .map(|(sym, id)| (sym.to_string(), id.to_string()))
            .collect();

        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            symbol_map: Mutex::new(symbol_map),
        }
    }

    /// Resolve a symbol like "BTC" to a CoinCap id like "bitcoin".
    /// Checks the static map only; unknown symbols fall back to lowercase.
    pub fn resolve_id(&self, symbol: &str) -> String {
        let upper = symbol.to_uppercase();
        let map = self.symbol_map.lock().unwrap_or_else(|e| e.into_inner());
        map.get(&upper)
            .cloned()
            .unwrap_or_else(|| symbol.to_lowercase())
    }

    /// Resolve a symbol through the search endpoint, caching the result.
    async fn resolve_id_dynamic(&self, symbol: &str) -> Result<String, CoreError> {
        let upper = symbol.to_uppercase();

        {
            let map = self.symbol_map.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(id) = map.get(&upper) {
                return Ok(id.clone());
            }
        }

        let url = format!("{BASE_URL}/assets?search={upper}&limit=5");
        let resp: AssetsResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "CoinCap".into(),
                message: format!("Failed to search for {upper}: {e}"),
            })?;

        let id = resp
            .data
            .iter()
            .find(|a| a.symbol.to_uppercase() == upper)
            .map(|a| a.id.clone())
            .ok_or_else(|| CoreError::Api {
                provider: "CoinCap".into(),
                message: format!("No CoinCap asset found for symbol {upper}"),
            })?;

        {
            let mut map = self.symbol_map.lock().unwrap_or_else(|e| e.into_inner());
            map.insert(upper, id.clone());
        }

        Ok(id)
    }
}

impl Default for CoinCapProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ── CoinCap API response types ──────────────────────────────────────

#[derive(Deserialize)]
struct AssetsResponse {
    data: Vec<AssetEntry>,
}

#[derive(Deserialize)]
struct AssetEntry {
    id: String,
    symbol: String,
    #[serde(rename = "priceUsd", default)]
    price_usd: Option<String>,
    #[serde(rename = "changePercent24Hr", default)]
    change_percent_24h: Option<String>,
}

/// Turn CoinCap asset rows into quotes keyed by the *requested* symbol.
/// Rows without a parseable price are dropped.
pub fn quotes_from_assets(
    rows: &[(String, Option<String>, Option<String>)],
    wanted: &HashMap<String, String>,
) -> PriceMap {
    let mut quotes = PriceMap::new();
    for (id, price, change) in rows {
        let Some(symbol) = wanted.get(id) else {
            continue;
        };
        let Some(price) = price.as_deref().and_then(|p| p.parse::<f64>().ok()) else {
            continue;
        };
        let change = change
            .as_deref()
            .and_then(|c| c.parse::<f64>().ok())
            .unwrap_or(0.0);
        quotes.insert(symbol.clone(), PriceQuote::new(price, change));
    }
    quotes
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PriceProvider for CoinCapProvider {
    fn name(&self) -> &str {
        "CoinCap"
    }

    async fn fetch_prices(&self, symbols: &[String]) -> Result<PriceMap, CoreError> {
        if symbols.is_empty() {
            return Ok(PriceMap::new());
        }

        // id → requested symbol
        let mut wanted: HashMap<String, String> = HashMap::new();
        for symbol in symbols {
            match self.resolve_id_dynamic(symbol).await {
                Ok(id) => {
                    wanted.insert(id, symbol.to_uppercase());
                }
                Err(e) => debug!("CoinCap cannot price {symbol}: {e}"),
            }
        }
        if wanted.is_empty() {
            return Ok(PriceMap::new());
        }

        let mut ids: Vec<&str> = wanted.keys().map(String::as_str).collect();
        ids.sort_unstable();
        let url = format!("{BASE_URL}/assets?ids={}", ids.join(","));

        let resp: AssetsResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "CoinCap".into(),
                message: format!("Failed to parse quotes: {e}"),
            })?;

        let rows: Vec<(String, Option<String>, Option<String>)> = resp
            .data
            .into_iter()
            .map(|a| (a.id, a.price_usd, a.change_percent_24h))
            .collect();

        Ok(quotes_from_assets(&rows, &wanted))
    }
}
