// ═══════════════════════════════════════════════════════════════════
// Provider Tests — registry ordering, symbol resolution, response parsing
// ═══════════════════════════════════════════════════════════════════

use serde_json::json;
use std::collections::HashMap;

use crypto_portfolio_core::providers::coincap::{quotes_from_assets, CoinCapProvider};
use crypto_portfolio_core::providers::coingecko::{quotes_from_simple_price, CoinGeckoProvider};
use crypto_portfolio_core::providers::registry::PriceProviderRegistry;
use crypto_portfolio_core::services::price_service::PriceService;

fn wanted(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(id, sym)| (id.to_string(), sym.to_string()))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════
//  Registry
// ═══════════════════════════════════════════════════════════════════

mod registry {
    use super::*;

    #[test]
    fn defaults_are_coincap_then_coingecko() {
        let registry = PriceProviderRegistry::new_with_defaults(&HashMap::new());
        assert_eq!(registry.len(), 2);
        let names: Vec<&str> = registry.providers().map(|p| p.name()).collect();
        assert_eq!(names, vec!["CoinCap", "CoinGecko"]);
    }

    #[test]
    fn price_service_reports_provider_names() {
        let mut keys = HashMap::new();
        keys.insert("coingecko".to_string(), "demo-key".to_string());
        let service = PriceService::new(PriceProviderRegistry::new_with_defaults(&keys));
        assert_eq!(service.provider_names(), vec!["CoinCap", "CoinGecko"]);
    }

    #[test]
    fn empty_registry() {
        let registry = PriceProviderRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.providers().count(), 0);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  CoinCap
// ═══════════════════════════════════════════════════════════════════

mod coincap {
    use super::*;

    #[test]
    fn resolves_common_symbols() {
        let provider = CoinCapProvider::new();
        assert_eq!(provider.resolve_id("BTC"), "bitcoin");
        assert_eq!(provider.resolve_id("eth"), "ethereum");
        assert_eq!(provider.resolve_id("BNB"), "binance-coin");
        assert_eq!(provider.resolve_id("PEPE"), "pepe");
    }

    #[test]
    fn parses_asset_rows() {
        let rows = vec![
            ("bitcoin".to_string(), Some("43000.5".to_string()), Some("-1.25".to_string())),
            ("ethereum".to_string(), Some("2300".to_string()), None),
            ("solana".to_string(), None, Some("4.0".to_string())),
            ("dogecoin".to_string(), Some("0.08".to_string()), Some("1".to_string())),
        ];
        let wanted = wanted(&[("bitcoin", "BTC"), ("ethereum", "ETH"), ("solana", "SOL")]);

        let quotes = quotes_from_assets(&rows, &wanted);
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes["BTC"].price, 43000.5);
        assert_eq!(quotes["BTC"].change_24h, -1.25);
        assert_eq!(quotes["ETH"].change_24h, 0.0);
        // no price, and not requested
        assert!(!quotes.contains_key("SOL"));
        assert!(!quotes.contains_key("DOGE"));
    }

    #[test]
    fn unparsable_price_is_dropped() {
        let rows = vec![("bitcoin".to_string(), Some("n/a".to_string()), None)];
        let quotes = quotes_from_assets(&rows, &wanted(&[("bitcoin", "BTC")]));
        assert!(quotes.is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
//  CoinGecko
// ═══════════════════════════════════════════════════════════════════

mod coingecko {
    use super::*;

    #[test]
    fn resolves_ids() {
        assert_eq!(CoinGeckoProvider::resolve_id("BTC"), "bitcoin");
        assert_eq!(CoinGeckoProvider::resolve_id("bnb"), "binancecoin");
        assert_eq!(CoinGeckoProvider::resolve_id("XRP"), "ripple");
        assert_eq!(CoinGeckoProvider::resolve_id("AVAX"), "avalanche-2");
        assert_eq!(CoinGeckoProvider::resolve_id("PEPE"), "pepe");
    }

    #[test]
    fn parses_simple_price_body() {
        let body = json!({
            "bitcoin": {"usd": 43000.0, "usd_24h_change": 2.5},
            "ripple": {"usd": 0.6},
            "cardano": {"usd": 0.5, "usd_24h_change": 1.0},
            "broken": {"eur": 1.0}
        });
        let wanted = wanted(&[("bitcoin", "BTC"), ("ripple", "XRP"), ("broken", "BRK")]);

        let quotes = quotes_from_simple_price(&body, &wanted);
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes["BTC"].price, 43000.0);
        assert_eq!(quotes["BTC"].change_24h, 2.5);
        assert_eq!(quotes["XRP"].change_24h, 0.0);
        assert!(!quotes.contains_key("BRK"));
    }

    #[test]
    fn non_object_body_yields_nothing() {
        let quotes = quotes_from_simple_price(&json!([1, 2, 3]), &wanted(&[("bitcoin", "BTC")]));
        assert!(quotes.is_empty());
    }
}
