use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::traits::MarketDataGateway;
use crate::errors::CoreError;
use crate::models::coin::CoinQuote;
use crate::models::settings::Settings;

const PROVIDER: &str = "CoinGecko";
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// CoinGecko API gateway for market listings, coin detail and batch prices.
///
/// - **Free**: works without a key; a demo key raises the rate limit.
/// - **Endpoints**: `/coins/markets`, `/coins/{id}`, `/simple/price`
///
/// CoinGecko ids are lowercase slugs like "bitcoin", "ethereum".
pub struct CoinGeckoGateway {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    vs_currency: String,
}

impl CoinGeckoGateway {
    pub fn new() -> Self {
        Self::from_settings(&Settings::default())
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            vs_currency: settings.vs_currency.to_lowercase(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `{base}{path}` with query parameters and return the raw body.
    ///
    /// Non-2xx responses become `CoreError::Api`; 404 becomes `CoinNotFound`
    /// when `not_found_id` is given.
    async fn get_body(
        &self,
        path: &str,
        query: &[(&str, String)],
        not_found_id: Option<&str>,
    ) -> Result<String, CoreError> {
        let url = format!("{}{path}", self.base_url);
        debug!(provider = PROVIDER, %url, "requesting");

        let mut request = self.client.get(&url).query(query);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = not_found_id {
                return Err(CoreError::CoinNotFound(id.to_string()));
            }
        }
        if !status.is_success() {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("{path} returned HTTP {status}"),
            });
        }

        Ok(resp.text().await?)
    }
}

impl Default for CoinGeckoGateway {
    fn default() -> Self {
        Self::new()
    }
}

// ── CoinGecko API response types ────────────────────────────────────

#[derive(Deserialize)]
struct MarketEntry {
    id: String,
    symbol: String,
    name: String,
    #[serde(default)]
    image: Option<String>,
    current_price: Option<f64>,
    market_cap: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    sparkline_in_7d: Option<Sparkline>,
}

#[derive(Deserialize)]
struct Sparkline {
    #[serde(default)]
    price: Vec<f64>,
}

#[derive(Deserialize)]
struct CoinDetail {
    id: String,
    symbol: String,
    name: String,
    #[serde(default)]
    image: Option<ImageLinks>,
    market_data: Option<MarketData>,
}

#[derive(Deserialize)]
struct ImageLinks {
    small: Option<String>,
}

#[derive(Deserialize)]
struct MarketData {
    #[serde(default)]
    current_price: HashMap<String, Option<f64>>,
    #[serde(default)]
    market_cap: HashMap<String, Option<f64>>,
    price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    sparkline_7d: Option<Sparkline>,
}

/// CoinGecko ids are slugs; anything else would change the request path.
fn is_coin_id(id: &str) -> bool {
    !id.is_empty()
        && !id.chars().all(|c| c == '.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn parse_json<T: DeserializeOwned>(body: &str, what: &str) -> Result<T, CoreError> {
    serde_json::from_str(body).map_err(|e| CoreError::Api {
        provider: PROVIDER.into(),
        message: format!("Failed to parse {what}: {e}"),
    })
}

/// Normalize a `/coins/markets` response body.
///
/// Null numeric fields become 0; an empty sparkline becomes `None`.
pub fn parse_markets(body: &str) -> Result<Vec<CoinQuote>, CoreError> {
    let entries: Vec<MarketEntry> = parse_json(body, "market listing")?;
    Ok(entries
        .into_iter()
        .map(|e| CoinQuote {
            id: e.id,
            name: e.name,
            symbol: e.symbol,
            current_price: e.current_price.unwrap_or(0.0),
            price_change_percentage_24h: e.price_change_percentage_24h.unwrap_or(0.0),
            market_cap: e.market_cap.unwrap_or(0.0),
            image: e.image.unwrap_or_default(),
            sparkline_in_7d: e.sparkline_in_7d.map(|s| s.price).filter(|p| !p.is_empty()),
        })
        .collect())
}

/// Normalize a `/coins/{id}` response body, reading prices in `vs_currency`.
pub fn parse_coin_detail(body: &str, vs_currency: &str) -> Result<CoinQuote, CoreError> {
    let detail: CoinDetail = parse_json(body, "coin detail")?;
    let market = detail.market_data.ok_or_else(|| CoreError::Api {
        provider: PROVIDER.into(),
        message: format!("No market data for {}", detail.id),
    })?;
    let in_currency =
        |m: &HashMap<String, Option<f64>>| m.get(vs_currency).copied().flatten().unwrap_or(0.0);

    Ok(CoinQuote {
        current_price: in_currency(&market.current_price),
        market_cap: in_currency(&market.market_cap),
        price_change_percentage_24h: market.price_change_percentage_24h.unwrap_or(0.0),
        image: detail.image.and_then(|i| i.small).unwrap_or_default(),
        sparkline_in_7d: market.sparkline_7d.map(|s| s.price).filter(|p| !p.is_empty()),
        id: detail.id,
        name: detail.name,
        symbol: detail.symbol,
    })
}

/// Normalize a `/simple/price` response body into `id → price`.
///
/// Coins without a (finite) price in `vs_currency` are left out.
pub fn parse_simple_prices(
    body: &str,
    vs_currency: &str,
) -> Result<HashMap<String, f64>, CoreError> {
    let raw: HashMap<String, HashMap<String, Option<f64>>> = parse_json(body, "simple prices")?;
    Ok(raw
        .into_iter()
        .filter_map(|(id, prices)| {
            let price = prices.get(vs_currency).copied().flatten()?;
            price.is_finite().then_some((id, price))
        })
        .collect())
}

#[async_trait]
impl MarketDataGateway for CoinGeckoGateway {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fetch_markets(
        &self,
        vs_currency: &str,
        per_page: u32,
        page: u32,
    ) -> Result<Vec<CoinQuote>, CoreError> {
        let query = [
            ("vs_currency", vs_currency.to_lowercase()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
            ("sparkline", "true".to_string()),
            ("price_change_percentage", "24h".to_string()),
        ];
        let body = self.get_body("/coins/markets", &query, None).await?;
        parse_markets(&body)
    }

    async fn fetch_coin(&self, id: &str) -> Result<CoinQuote, CoreError> {
        if !is_coin_id(id) {
            return Err(CoreError::CoinNotFound(id.to_string()));
        }
        let query = [
            ("localization", "false".to_string()),
            ("tickers", "false".to_string()),
            ("market_data", "true".to_string()),
            ("community_data", "false".to_string()),
            ("developer_data", "false".to_string()),
            ("sparkline", "true".to_string()),
        ];
        let body = self
            .get_body(&format!("/coins/{id}"), &query, Some(id))
            .await?;
        parse_coin_detail(&body, &self.vs_currency)
    }

    async fn fetch_simple_prices(
        &self,
        ids: &[String],
        vs_currency: &str,
    ) -> Result<HashMap<String, f64>, CoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let currency = vs_currency.to_lowercase();
        let query = [
            ("ids", ids.join(",")),
            ("vs_currencies", currency.clone()),
        ];
        let body = self.get_body("/simple/price", &query, None).await?;
        parse_simple_prices(&body, &currency)
    }
}
