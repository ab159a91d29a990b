use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use super::traits::PriceProvider;
use crate::errors::CoreError;
use crate::models::price::{PriceMap, PriceQuote};

const BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko `/simple/price` provider.
///
/// - **Free**: Public tier works without a key; a demo key raises rate limits.
/// - **Endpoint**: `/simple/price?ids=a,b&vs_currencies=usd&include_24hr_change=true`
pub struct CoinGeckoProvider {
    client: Client,
    api_key: Option<String>,
}

impl CoinGeckoProvider {
    pub fn new(api_key: Option<String>) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            api_key,
        }
    }

    /// Map a ticker to a CoinGecko coin id. Unknown tickers fall back to lowercase.
    pub fn resolve_id(symbol: &str) -> String {
        match symbol.to_uppercase().as_str() {
            "BTC" => "bitcoin",
            "ETH" => "ethereum",
            "USDT" => "tether",
            "USDC" => "usd-coin",
            "BNB" => "binancecoin",
            "XRP" => "ripple",
            "ADA" => "cardano",
            "SOL" => "solana",
            "DOGE" => "dogecoin",
            "DOT" => "polkadot",
            "MATIC" => "matic-network",
            "LTC" => "litecoin",
            "AVAX" => "avalanche-2",
            "LINK" => "chainlink",
            "UNI" => "uniswap",
            "ATOM" => "cosmos",
            "XLM" => "stellar",
            "ALGO" => "algorand",
            "NEAR" => "near",
            "SHIB" => "shiba-inu",
            "TRX" => "tron",
            "DAI" => "dai",
            "AAVE" => "aave",
            "XMR" => "monero",
            other => return other.to_lowercase(),
        }
        .to_string()
    }
}

#[derive(Deserialize)]
struct SimplePrice {
    usd: Option<f64>,
    #[serde(default)]
    usd_24h_change: Option<f64>,
}

/// Convert a `/simple/price` body into quotes keyed by requested symbol.
pub fn quotes_from_simple_price(
    body: &serde_json::Value,
    wanted: &HashMap<String, String>,
) -> PriceMap {
    let mut quotes = PriceMap::new();
    let Some(obj) = body.as_object() else {
        return quotes;
    };
    for (id, entry) in obj {
        let Some(symbol) = wanted.get(id) else {
            continue;
        };
        let Ok(price) = serde_json::from_value::<SimplePrice>(entry.clone()) else {
            continue;
        };
        if let Some(usd) = price.usd {
            quotes.insert(
                symbol.clone(),
                PriceQuote::new(usd, price.usd_24h_change.unwrap_or(0.0)),
            );
        }
    }
    quotes
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PriceProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        "CoinGecko"
    }

    async fn fetch_prices(&self, symbols: &[String]) -> Result<PriceMap, CoreError> {
        if symbols.is_empty() {
            return Ok(PriceMap::new());
        }

        let wanted: HashMap<String, String> = symbols
            .iter()
            .map(|s| (Self::resolve_id(s), s.to_uppercase()))
            .collect();
        let mut ids: Vec<&str> = wanted.keys().map(String::as_str).collect();
        ids.sort_unstable();

        let url = format!(
            "{BASE_URL}/simple/price?ids={}&vs_currencies=usd&include_24hr_change=true",
            ids.join(",")
        );
        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        let resp = request.send().await?;
        if !resp.status().is_success() {
            return Err(CoreError::Api {
                provider: "CoinGecko".into(),
                message: format!("HTTP {}", resp.status()),
            });
        }
        let body: serde_json::Value = resp.json().await.map_err(|e| CoreError::Api {
            provider: "CoinGecko".into(),
            message: format!("Failed to parse quotes: {e}"),
        })?;

        Ok(quotes_from_simple_price(&body, &wanted))
    }
}
