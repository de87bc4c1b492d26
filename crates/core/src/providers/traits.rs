use async_trait::async_trait;
use std::collections::HashMap;

use crate::errors::CoreError;
use crate::models::coin::CoinQuote;

/// Outbound market data API used by the `CryptoStore`.
///
/// The store only ever talks to this trait, so tests and alternative quote
/// services plug in without touching the store.
#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    /// Human-readable name of this gateway (for logs/errors).
    fn name(&self) -> &str;

    /// One page of the top coins by market cap (descending), with 24h change
    /// and 7-day sparkline samples.
    async fn fetch_markets(
        &self,
        vs_currency: &str,
        per_page: u32,
        page: u32,
    ) -> Result<Vec<CoinQuote>, CoreError>;

    /// Full detail for a single coin, normalized to a `CoinQuote`.
    async fn fetch_coin(&self, id: &str) -> Result<CoinQuote, CoreError>;

    /// Latest price of each coin in `ids`, in one request.
    ///
    /// Ids the service does not know are simply absent from the map.
    async fn fetch_simple_prices(
        &self,
        ids: &[String],
        vs_currency: &str,
    ) -> Result<HashMap<String, f64>, CoreError>;
}
