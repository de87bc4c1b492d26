use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived totals for the whole portfolio. Never persisted; recomputed from
/// the holdings whenever it is asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// When this summary was computed
    pub as_of: DateTime<Utc>,

    /// Σ(amount × buy_price)
    pub total_investment: f64,

    /// Σ(amount × current_price)
    pub current_value: f64,

    /// current_value − total_investment
    pub profit_loss: f64,

    /// profit_loss / total_investment × 100, or 0 when nothing was invested
    pub profit_loss_pct: f64,

    /// Per-holding breakdown, in portfolio order
    pub holdings: Vec<HoldingSummary>,
}

impl PortfolioSummary {
    pub fn is_profit(&self) -> bool {
        self.profit_loss >= 0.0
    }
}

/// Derived values for one holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingSummary {
    pub holding_id: String,
    pub coin_id: String,
    pub name: String,
    pub symbol: String,
    pub amount: f64,
    pub buy_price: f64,
    pub current_price: f64,
    pub investment: f64,
    pub current_value: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,

    /// Share of the portfolio's current value, in percent
    pub allocation_pct: f64,
}
