use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single simulated position in the portfolio.
///
/// `name`, `symbol` and `image` are captured when the holding is added and
/// are never re-synced from market data. `current_price` is only ever
/// written by a price sync (market refresh or batched price lookup).
///
/// Serialized with camelCase keys so blobs written by the browser client
/// (`coinId`, `buyPrice`, `currentPrice`) load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioHolding {
    /// Unique, time-ordered identifier
    pub id: String,

    /// Identifier of the coin this holding tracks (e.g., "ethereum")
    pub coin_id: String,

    pub name: String,
    pub symbol: String,

    /// Units owned (caller guarantees > 0)
    pub amount: f64,

    /// Purchase price per unit in USD
    pub buy_price: f64,

    /// Latest known price per unit in USD
    pub current_price: f64,

    #[serde(default)]
    pub image: String,
}

/// Caller-supplied fields for a new holding. The store assigns `id` and
/// `current_price`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHolding {
    pub coin_id: String,
    pub name: String,
    pub symbol: String,
    pub image: String,
    pub amount: f64,
    pub buy_price: f64,
}

impl NewHolding {
    pub fn new(
        coin_id: impl Into<String>,
        name: impl Into<String>,
        symbol: impl Into<String>,
        amount: f64,
        buy_price: f64,
    ) -> Self {
        Self {
            coin_id: coin_id.into(),
            name: name.into(),
            symbol: symbol.into(),
            image: String::new(),
            amount,
            buy_price,
        }
    }

    /// Attach an image URI.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }
}

impl PortfolioHolding {
    /// Materialize a holding from user input and the price known at add time.
    pub fn from_new(new: NewHolding, current_price: f64) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            coin_id: new.coin_id,
            name: new.name,
            symbol: new.symbol,
            amount: new.amount,
            buy_price: new.buy_price,
            current_price,
            image: new.image,
        }
    }

    /// amount × buy_price
    pub fn investment(&self) -> f64 {
        self.amount * self.buy_price
    }

    /// amount × current_price
    pub fn current_value(&self) -> f64 {
        self.amount * self.current_price
    }

    pub fn profit_loss(&self) -> f64 {
        self.current_value() - self.investment()
    }

    /// Profit/loss relative to the investment, in percent.
    /// Zero when nothing was invested.
    pub fn profit_loss_pct(&self) -> f64 {
        percent_of(self.profit_loss(), self.investment())
    }
}

/// `part / whole * 100`, defined as 0 when `whole` is zero (or not finite).
pub(crate) fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 && whole.is_finite() {
        part / whole * 100.0
    } else {
        0.0
    }
}
