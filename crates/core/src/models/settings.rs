use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_API_BASE_URL: &str = "https://api.coingecko.com/api/v3";
pub const WATCHLIST_KEY: &str = "cryptoWatchlist";
pub const PORTFOLIO_KEY: &str = "cryptoPortfolio";

/// Runtime configuration for the store, the gateway and the schedules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Quote currency for all prices ("usd").
    pub vs_currency: String,

    /// How many top coins a market refresh requests.
    pub market_page_size: u32,

    /// Period of the market refresh schedule, in seconds.
    pub refresh_interval_secs: u64,

    /// Period of the portfolio price sync schedule, in seconds.
    pub price_sync_interval_secs: u64,

    /// Base URL of the CoinGecko-compatible API.
    pub api_base_url: String,

    /// Optional demo API key, sent as a header.
    pub api_key: Option<String>,

    pub request_timeout_secs: u64,

    /// Storage key of the watchlist blob.
    pub watchlist_key: String,

    /// Storage key of the portfolio blob.
    pub portfolio_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vs_currency: "usd".to_string(),
            market_page_size: 100,
            refresh_interval_secs: 60,
            price_sync_interval_secs: 60,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
            request_timeout_secs: 30,
            watchlist_key: WATCHLIST_KEY.to_string(),
            portfolio_key: PORTFOLIO_KEY.to_string(),
        }
    }
}

impl Settings {
    /// Defaults overlaid with `CRYPTO_TRACKER_*` environment variables.
    ///
    /// Unparseable numeric values fall back to the default.
    pub fn from_env() -> Self {
        Self::default().overlay(|name| env::var(name).ok())
    }

    /// Apply overrides from a lookup function (environment, tests).
    pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| {
            lookup(name)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        if let Some(v) = get("CRYPTO_TRACKER_VS_CURRENCY") {
            self.vs_currency = v.to_lowercase();
        }
        if let Some(v) = get("CRYPTO_TRACKER_PAGE_SIZE").and_then(|v| v.parse().ok()) {
            self.market_page_size = v;
        }
        if let Some(v) = get("CRYPTO_TRACKER_REFRESH_SECS").and_then(|v| v.parse().ok()) {
            self.refresh_interval_secs = v;
        }
        if let Some(v) = get("CRYPTO_TRACKER_SYNC_SECS").and_then(|v| v.parse().ok()) {
            self.price_sync_interval_secs = v;
        }
        if let Some(v) = get("CRYPTO_TRACKER_API_URL") {
            self.api_base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("CRYPTO_TRACKER_API_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = get("CRYPTO_TRACKER_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.request_timeout_secs = v;
        }
        self
    }
}
