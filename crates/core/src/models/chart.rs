use serde::{Deserialize, Serialize};

/// Price history series for one coin, built from its 7-day sparkline.
///
/// The core generates these; the front-end just renders them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub coin_id: String,

    /// Chart title label (the coin's display name)
    pub label: String,

    pub points: Vec<ChartDataPoint>,

    pub min: f64,
    pub max: f64,

    /// Change from the first to the last sample, in percent
    pub change_pct: f64,
}

/// A single sample on a price history chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataPoint {
    /// Zero-based sample index
    pub index: usize,
    pub price: f64,
}

/// One slice of the portfolio distribution chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSlice {
    pub label: String,
    /// Current value of the holding in USD
    pub value: f64,
    /// Share of the total current value, in percent
    pub percentage: f64,
}
