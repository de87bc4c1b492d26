use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::coin::CoinQuote;
use super::holding::PortfolioHolding;

/// Lifecycle of the market data.
///
/// `Idle → Loading → {Ready, Failed}`. A new refresh may start from any
/// state; `Failed` keeps the last good coin list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MarketStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

impl std::fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketStatus::Idle => write!(f, "Idle"),
            MarketStatus::Loading => write!(f, "Loading"),
            MarketStatus::Ready => write!(f, "Ready"),
            MarketStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Everything the store holds in memory. Subscribers receive clones of this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    /// Latest market listing, market-cap descending
    pub coins: Vec<CoinQuote>,

    /// Watched coin ids, duplicate-free, insertion order
    pub watchlist: Vec<String>,

    pub portfolio: Vec<PortfolioHolding>,

    pub status: MarketStatus,

    /// Message of the last failed market refresh; cleared on success
    pub error: Option<String>,

    pub search_term: String,

    /// When the coin list was last replaced
    pub last_updated: Option<DateTime<Utc>>,
}

impl StoreState {
    pub fn is_loading(&self) -> bool {
        self.status == MarketStatus::Loading
    }

    pub fn coin(&self, id: &str) -> Option<&CoinQuote> {
        self.coins.iter().find(|c| c.id == id)
    }
}
