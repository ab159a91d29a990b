// ═══════════════════════════════════════════════════════════════════
// Model Tests — Holding, Transaction, PnlPercent, PriceCache, Snapshot,
// Project, SessionHistory, Portfolio, Settings
// ═══════════════════════════════════════════════════════════════════

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use crypto_portfolio_core::models::history::{HistoryEntry, HistoryMode, SessionHistory};
use crypto_portfolio_core::models::holding::{normalize_note, normalize_symbol, Holding};
use crypto_portfolio_core::models::metrics::PnlPercent;
use crypto_portfolio_core::models::portfolio::Portfolio;
use crypto_portfolio_core::models::price::{PriceCache, PriceMap, PriceQuote};
use crypto_portfolio_core::models::project::Project;
use crypto_portfolio_core::models::settings::Settings;
use crypto_portfolio_core::models::snapshot::{snapshot_key, Snapshot, SnapshotTrigger};
use crypto_portfolio_core::models::transaction::{Transaction, TransactionType};

fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn entry(value: f64, at: DateTime<Utc>) -> HistoryEntry {
    HistoryEntry {
        timestamp: at,
        total_value: value,
        total_cost: 0.0,
        total_pnl: value,
        total_pnl_percent: PnlPercent::NotApplicable,
        portfolio: Vec::new(),
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Holding
// ═══════════════════════════════════════════════════════════════════

mod holding {
    use super::*;

    #[test]
    fn new_derives_cost_fields() {
        let h = Holding::new("btc", 2.0, 150.0, "ledger");
        assert_eq!(h.symbol, "BTC");
        assert_eq!(h.amount, 2.0);
        assert_eq!(h.purchase_price, 150.0);
        assert_eq!(h.total_cost, 300.0);
        assert_eq!(h.average_price, 150.0);
        assert_eq!(h.note, "ledger");
    }

    #[test]
    fn merge_uses_weighted_average() {
        let mut h = Holding::new("BTC", 1.0, 100.0, "");
        h.merge_purchase(1.0, 300.0);
        assert_eq!(h.amount, 2.0);
        assert_eq!(h.total_cost, 400.0);
        assert_eq!(h.average_price, 200.0);
        assert_eq!(h.purchase_price, 200.0);
    }

    #[test]
    fn merge_keeps_id() {
        let mut h = Holding::new("ETH", 1.0, 10.0, "");
        let id = h.id;
        h.merge_purchase(3.0, 20.0);
        assert_eq!(h.id, id);
    }

    #[test]
    fn invariant_holds_over_many_merges() {
        let mut h = Holding::new("SOL", 0.3, 17.13, "");
        let purchases = [(0.7, 19.99), (12.5, 3.3333), (0.0001, 250.0), (4.2, 0.0)];
        for (amount, price) in purchases {
            h.merge_purchase(amount, price);
            assert!((h.total_cost - h.amount * h.average_price).abs() < 1e-9);
        }
    }

    #[test]
    fn identity_is_symbol_and_note() {
        let h = Holding::new("BTC", 1.0, 1.0, "cold wallet");
        assert!(h.matches("btc", " cold wallet "));
        assert!(!h.matches("BTC", ""));
        assert!(!h.matches("ETH", "cold wallet"));
    }

    #[test]
    fn normalizers() {
        assert_eq!(normalize_symbol("  eth "), "ETH");
        assert_eq!(normalize_note("   "), "");
        assert_eq!(normalize_note(" binance "), "binance");
    }

    #[test]
    fn serializes_camel_case() {
        let h = Holding::new("BTC", 1.0, 100.0, "");
        let json = serde_json::to_value(&h).unwrap();
        assert!(json.get("purchasePrice").is_some());
        assert!(json.get("totalCost").is_some());
        assert!(json.get("averagePrice").is_some());
    }

    #[test]
    fn missing_note_defaults_to_empty() {
        let json = serde_json::json!({
            "id": Uuid::nil(),
            "symbol": "BTC",
            "amount": 1.0,
            "purchasePrice": 5.0,
            "totalCost": 5.0,
            "averagePrice": 5.0
        });
        let h: Holding = serde_json::from_value(json).unwrap();
        assert_eq!(h.note, "");
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Transaction
// ═══════════════════════════════════════════════════════════════════

mod transaction {
    use super::*;

    #[test]
    fn buy_totals() {
        let tx = Transaction::buy("BTC", 0.5, 40_000.0, "");
        assert_eq!(tx.tx_type, TransactionType::Buy);
        assert_eq!(tx.total_cost, 20_000.0);
    }

    #[test]
    fn sell_covers_whole_holding() {
        let h = Holding::new("ETH", 3.0, 1000.0, "hot");
        let tx = Transaction::sell(&h, 1500.0);
        assert_eq!(tx.tx_type, TransactionType::Sell);
        assert_eq!(tx.amount, 3.0);
        assert_eq!(tx.purchase_price, 1500.0);
        assert_eq!(tx.total_cost, 4500.0);
        assert_eq!(tx.note, "hot");
    }

    #[test]
    fn type_serializes_lowercase_under_type_key() {
        let tx = Transaction::buy("BTC", 1.0, 1.0, "");
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "buy");
    }

    #[test]
    fn display() {
        assert_eq!(TransactionType::Buy.to_string(), "buy");
        assert_eq!(TransactionType::Sell.to_string(), "sell");
    }
}

// ═══════════════════════════════════════════════════════════════════
//  PnlPercent
// ═══════════════════════════════════════════════════════════════════

mod pnl_percent {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(PnlPercent::Value(12.345).to_string(), "12.35%");
        assert_eq!(PnlPercent::Value(-100.0).to_string(), "-100.00%");
        assert_eq!(PnlPercent::NotApplicable.to_string(), "N/A");
    }

    #[test]
    fn sort_key_treats_sentinel_as_zero() {
        assert_eq!(PnlPercent::NotApplicable.sort_key(), 0.0);
        assert_eq!(PnlPercent::Value(-5.0).sort_key(), -5.0);
    }

    #[test]
    fn value_accessor() {
        assert_eq!(PnlPercent::Value(3.0).value(), Some(3.0));
        assert_eq!(PnlPercent::NotApplicable.value(), None);
        assert!(PnlPercent::NotApplicable.is_not_applicable());
    }

    #[test]
    fn serializes_number_or_na_string() {
        assert_eq!(serde_json::to_string(&PnlPercent::Value(12.5)).unwrap(), "12.5");
        assert_eq!(serde_json::to_string(&PnlPercent::NotApplicable).unwrap(), "\"N/A\"");
    }

    #[test]
    fn deserializes_number_and_text() {
        let v: PnlPercent = serde_json::from_str("7.25").unwrap();
        assert_eq!(v, PnlPercent::Value(7.25));
        let na: PnlPercent = serde_json::from_str("\"N/A\"").unwrap();
        assert_eq!(na, PnlPercent::NotApplicable);
        let text: PnlPercent = serde_json::from_str("\"-3.5%\"").unwrap();
        assert_eq!(text, PnlPercent::Value(-3.5));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  PriceCache
// ═══════════════════════════════════════════════════════════════════

mod price_cache {
    use super::*;

    #[test]
    fn empty_by_default() {
        let cache = PriceCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.get_price("BTC"), None);
        assert_eq!(cache.last_updated(), None);
    }

    #[test]
    fn merge_keeps_symbols_missing_from_refresh() {
        let mut cache = PriceCache::new();
        let mut first = PriceMap::new();
        first.insert("BTC".into(), PriceQuote::new(100.0, 1.0));
        first.insert("ETH".into(), PriceQuote::new(10.0, -2.0));
        cache.merge(first, ts(2024, 1, 1, 0, 0));

        let mut second = PriceMap::new();
        second.insert("BTC".into(), PriceQuote::new(110.0, 2.0));
        cache.merge(second, ts(2024, 1, 1, 0, 1));

        assert_eq!(cache.get_price("BTC"), Some(110.0));
        assert_eq!(cache.get_price("ETH"), Some(10.0));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.last_updated(), Some(ts(2024, 1, 1, 0, 1)));
    }

    #[test]
    fn empty_merge_does_not_touch_timestamp() {
        let mut cache = PriceCache::new();
        cache.merge(PriceMap::new(), ts(2024, 1, 1, 0, 0));
        assert_eq!(cache.last_updated(), None);
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let mut cache = PriceCache::new();
        cache.set_quote("btc", PriceQuote::new(5.0, 0.0));
        assert_eq!(cache.get_price("BTC"), Some(5.0));
        assert_eq!(cache.get_quote("Btc").map(|q| q.price), Some(5.0));
    }

    #[test]
    fn keys_are_trimmed_like_holding_symbols() {
        let mut cache = PriceCache::new();
        cache.set_quote(" eth ", PriceQuote::new(10.0, 0.0));
        let mut batch = PriceMap::new();
        batch.insert("  sol".into(), PriceQuote::new(20.0, 0.0));
        cache.merge(batch, ts(2024, 1, 1, 0, 0));

        assert_eq!(cache.get_price("ETH"), Some(10.0));
        assert_eq!(cache.get_price(" sol "), Some(20.0));
        let mut keys: Vec<&String> = cache.quotes().keys().collect();
        keys.sort();
        assert_eq!(keys, vec![&normalize_symbol("eth"), &normalize_symbol("sol")]);
    }

    #[test]
    fn clear() {
        let mut cache = PriceCache::new();
        cache.set_quote("BTC", PriceQuote::new(5.0, 0.0));
        cache.clear();
        assert!(cache.is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Snapshot
// ═══════════════════════════════════════════════════════════════════

mod snapshot {
    use super::*;

    fn sample(at: DateTime<Utc>) -> Snapshot {
        Snapshot {
            id: Uuid::nil(),
            timestamp: at,
            description: "test".into(),
            trigger: SnapshotTrigger::Manual,
            portfolio: vec![Holding::new("BTC", 1.0, 100.0, "")],
            crypto_data: PriceMap::new(),
            projects: Vec::new(),
            total_value: 0.0,
            total_cost: 100.0,
            total_pnl: -100.0,
            total_pnl_percent: PnlPercent::Value(-100.0),
        }
    }

    #[test]
    fn storage_key_replaces_colons_and_dots() {
        let s = sample(ts(2024, 1, 1, 10, 0));
        assert_eq!(
            s.storage_key(),
            "snapshot:00000000-0000-0000-0000-000000000000-2024-01-01T10-00-00-000Z"
        );
    }

    #[test]
    fn same_id_different_time_gives_distinct_keys() {
        let id = Uuid::new_v4();
        let a = snapshot_key(&id, ts(2024, 1, 1, 10, 0));
        let b = snapshot_key(&id, ts(2024, 1, 1, 10, 0) + Duration::milliseconds(1));
        assert_ne!(a, b);
    }

    #[test]
    fn date_is_utc_day() {
        let s = sample(ts(2024, 3, 5, 23, 59));
        assert_eq!(s.date().to_string(), "2024-03-05");
    }

    #[test]
    fn json_roundtrip_preserves_sentinel() {
        let mut s = sample(ts(2024, 1, 1, 0, 0));
        s.total_pnl_percent = PnlPercent::NotApplicable;
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["totalPnlPercent"], "N/A");
        assert!(json.get("cryptoData").is_some());
        let back: Snapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn trigger_defaults_to_manual_when_absent() {
        let mut json = serde_json::to_value(sample(ts(2024, 1, 1, 0, 0))).unwrap();
        json.as_object_mut().unwrap().remove("trigger");
        let back: Snapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back.trigger, SnapshotTrigger::Manual);
    }

    #[test]
    fn trigger_display() {
        assert_eq!(SnapshotTrigger::CostOverride.to_string(), "Cost override");
        assert_eq!(SnapshotTrigger::Automatic.to_string(), "Automatic");
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Project
// ═══════════════════════════════════════════════════════════════════

mod project {
    use super::*;

    #[test]
    fn tags_are_normalized_and_deduplicated() {
        let mut p = Project::new("  Uniswap ");
        assert_eq!(p.name, "Uniswap");
        assert!(p.add_tag("DeFi"));
        assert!(!p.add_tag(" defi "));
        assert!(!p.add_tag("   "));
        assert_eq!(p.tags, vec!["defi".to_string()]);
        assert!(p.has_tag("DEFI"));
    }

    #[test]
    fn remove_tag() {
        let mut p = Project::new("Aave");
        p.add_tag("lending");
        assert!(p.remove_tag("LENDING"));
        assert!(!p.remove_tag("lending"));
        assert!(p.tags.is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
//  SessionHistory
// ═══════════════════════════════════════════════════════════════════

mod session_history {
    use super::*;

    #[test]
    fn caps_at_capacity_evicting_oldest() {
        let mut history = SessionHistory::with_capacity(100);
        let start = ts(2024, 1, 1, 0, 0);
        for i in 0..101 {
            history.push(entry(i as f64, start + Duration::seconds(i)));
        }
        assert_eq!(history.len(), 100);
        let values: Vec<f64> = history.iter().map(|e| e.total_value).collect();
        let expected: Vec<f64> = (1..101).map(|i| i as f64).collect();
        assert_eq!(values, expected);
        assert_eq!(history.latest().unwrap().total_value, 100.0);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut history = SessionHistory::with_capacity(0);
        history.push(entry(1.0, ts(2024, 1, 1, 0, 0)));
        history.push(entry(2.0, ts(2024, 1, 1, 0, 1)));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().unwrap().total_value, 2.0);
    }

    #[test]
    fn clear() {
        let mut history = SessionHistory::with_capacity(5);
        history.push(entry(1.0, ts(2024, 1, 1, 0, 0)));
        history.clear();
        assert!(history.is_empty());
    }

    #[test]
    fn mode_defaults_to_saved() {
        assert_eq!(HistoryMode::default(), HistoryMode::Saved);
        assert_eq!(serde_json::to_string(&HistoryMode::Realtime).unwrap(), "\"realtime\"");
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Portfolio & Settings
// ═══════════════════════════════════════════════════════════════════

mod portfolio {
    use super::*;

    #[test]
    fn sum_of_costs_ignores_override() {
        let mut p = Portfolio::new();
        p.holdings.push(Holding::new("BTC", 1.0, 100.0, ""));
        p.holdings.push(Holding::new("ETH", 2.0, 25.0, ""));
        p.total_cost_override = Some(1.0);
        assert_eq!(p.sum_of_costs(), 150.0);
    }

    #[test]
    fn symbols_are_sorted_and_distinct() {
        let mut p = Portfolio::new();
        p.holdings.push(Holding::new("ETH", 1.0, 1.0, "a"));
        p.holdings.push(Holding::new("BTC", 1.0, 1.0, ""));
        p.holdings.push(Holding::new("ETH", 1.0, 1.0, "b"));
        assert_eq!(p.symbols(), vec!["BTC".to_string(), "ETH".to_string()]);
    }

    #[test]
    fn find_by_identity() {
        let mut p = Portfolio::new();
        p.holdings.push(Holding::new("ETH", 1.0, 1.0, "a"));
        assert!(p.find("eth", "a").is_some());
        assert!(p.find("eth", "b").is_none());
    }

    #[test]
    fn empty_document_deserializes() {
        let p: Portfolio = serde_json::from_str("{}").unwrap();
        assert!(p.is_empty());
        assert_eq!(p.total_cost_override, None);
    }
}

mod settings {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.auto_snapshot_interval_minutes, 60);
        assert_eq!(s.history_capacity, 100);
        assert_eq!(s.snapshot_retention, 50);
        assert_eq!(s.history_mode, HistoryMode::Saved);
        assert!(s.api_keys.is_empty());
    }

    #[test]
    fn partial_document_fills_defaults() {
        let s: Settings = serde_json::from_str(r#"{"historyCapacity": 10}"#).unwrap();
        assert_eq!(s.history_capacity, 10);
        assert_eq!(s.snapshot_retention, 50);
        assert_eq!(s.auto_snapshot_interval_minutes, 60);
    }
}
