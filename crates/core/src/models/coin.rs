use serde::{Deserialize, Serialize};

/// A normalized market quote for one coin, as returned by a market refresh
/// or a single-coin lookup.
///
/// Quotes are never edited in place. Every refresh replaces the whole list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinQuote {
    /// Upstream identifier (e.g., "bitcoin"). Unique within a listing.
    pub id: String,

    /// Display name (e.g., "Bitcoin")
    pub name: String,

    /// Ticker symbol as the API reports it, usually lowercase (e.g., "btc")
    pub symbol: String,

    /// Current price in USD
    pub current_price: f64,

    /// Price change over the last 24 hours, in percent (signed)
    pub price_change_percentage_24h: f64,

    /// Market capitalization in USD
    pub market_cap: f64,

    /// Image URI
    pub image: String,

    /// Price samples over the last 7 days, oldest first
    #[serde(default)]
    pub sparkline_in_7d: Option<Vec<f64>>,
}

impl CoinQuote {
    /// Whether this coin matches a free-text search term.
    ///
    /// Case-insensitive substring match on name or symbol. An empty
    /// (or whitespace-only) term matches everything.
    pub fn matches(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle) || self.symbol.to_lowercase().contains(&needle)
    }

    /// Ticker symbol in uppercase, for display.
    pub fn display_symbol(&self) -> String {
        self.symbol.to_uppercase()
    }

    /// The 7-day price samples, or an empty slice when none were provided.
    pub fn sparkline(&self) -> &[f64] {
        self.sparkline_in_7d.as_deref().unwrap_or(&[])
    }
}
