use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Percentage return, or the explicit "not applicable" sentinel when the
/// cost basis is zero.
///
/// The sentinel is a display value only. It never takes part in further
/// arithmetic; sorting treats it as `0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PnlPercent {
    Value(f64),
    NotApplicable,
}

impl PnlPercent {
    /// The numeric value, or `None` for the sentinel.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self {
            PnlPercent::Value(v) => Some(*v),
            PnlPercent::NotApplicable => None,
        }
    }

    #[must_use]
    pub fn is_not_applicable(&self) -> bool {
        matches!(self, PnlPercent::NotApplicable)
    }

    /// Key used for display sorting.
    #[must_use]
    pub fn sort_key(&self) -> f64 {
        self.value().unwrap_or(0.0)
    }
}

impl std::fmt::Display for PnlPercent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PnlPercent::Value(v) => write!(f, "{v:.2}%"),
            PnlPercent::NotApplicable => write!(f, "N/A"),
        }
    }
}

// Stored as a bare number, or the string "N/A", to stay readable by the
// browser client.
impl Serialize for PnlPercent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PnlPercent::Value(v) => serializer.serialize_f64(*v),
            PnlPercent::NotApplicable => serializer.serialize_str("N/A"),
        }
    }
}

impl<'de> Deserialize<'de> for PnlPercent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(v) => PnlPercent::Value(v),
            Raw::Text(s) => match s.trim().trim_end_matches('%').parse::<f64>() {
                Ok(v) => PnlPercent::Value(v),
                Err(_) => PnlPercent::NotApplicable,
            },
        })
    }
}

/// Derived figures for one holding row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingMetrics {
    pub symbol: String,
    pub note: String,
    pub amount: f64,
    pub average_price: f64,
    pub total_cost: f64,

    /// Live price, or `None` if the feed has no quote for the symbol
    pub current_price: Option<f64>,

    /// 24h change in percent, if known
    pub change_24h: Option<f64>,

    /// `amount * price` (0 when no price is known)
    pub current_value: f64,

    pub pnl: f64,
    pub pnl_percent: PnlPercent,

    /// Share of total portfolio value, in percent
    pub percent_of_total: f64,
}

/// Aggregate figures for the whole ledger at one moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioMetrics {
    pub total_value: f64,

    /// Cost override if set, else the sum of per-holding cost
    pub total_cost: f64,

    pub total_pnl: f64,
    pub total_pnl_percent: PnlPercent,

    /// `true` when `total_cost` came from the ledger-wide override
    pub cost_overridden: bool,

    pub rows: Vec<HoldingMetrics>,
}

/// Column a holdings table can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortColumn {
    Symbol,
    Amount,
    AveragePrice,
    CurrentPrice,
    TotalCost,
    CurrentValue,
    Pnl,
    PnlPercent,
    PercentOfTotal,
    Change24h,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}
