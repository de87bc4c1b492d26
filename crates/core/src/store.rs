use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::models::analytics::PortfolioSummary;
use crate::models::chart::{AllocationSlice, PriceHistory};
use crate::models::coin::CoinQuote;
use crate::models::holding::{NewHolding, PortfolioHolding};
use crate::models::notification::Notification;
use crate::models::settings::Settings;
use crate::models::state::{MarketStatus, StoreState};
use crate::providers::traits::MarketDataGateway;
use crate::services::analytics_service::AnalyticsService;
use crate::services::chart_service::ChartService;
use crate::services::portfolio_service::PortfolioService;
use crate::storage::backing::KeyValueStore;
use crate::storage::manager::StorageManager;

pub const MARKET_FETCH_FAILED: &str = "Failed to fetch cryptocurrency data";
pub const COIN_FETCH_FAILED: &str = "Failed to fetch coin data";
pub const PRICE_SYNC_FAILED: &str = "Failed to update portfolio prices";
pub const WATCHLIST_SAVE_FAILED: &str = "Failed to save watchlist";
pub const PORTFOLIO_SAVE_FAILED: &str = "Failed to save portfolio";

const NOTIFICATION_CAPACITY: usize = 64;

/// Owns market data, the watchlist and the portfolio.
///
/// All operations take `&self` so one store can be shared as
/// `Arc<CryptoStore>` between a front-end and its schedules. State lives in a
/// `watch` channel: it is only mutated inside short synchronous closures and
/// never across an `.await`, so overlapping refreshes resolve as
/// last-writer-wins.
///
/// Every persisted mutation holds `write_lock` from the state change through
/// the backing write, so blobs reach the backing in mutation order and the
/// last blob written always matches the in-memory state.
///
/// No operation returns an error. Gateway and storage failures are logged,
/// reported on the notification channel, and (for market refreshes) recorded
/// in `StoreState::error`.
pub struct CryptoStore {
    gateway: Arc<dyn MarketDataGateway>,
    backing: Arc<dyn KeyValueStore>,
    settings: Settings,
    state: watch::Sender<StoreState>,
    write_lock: Mutex<()>,
    notifications: broadcast::Sender<Notification>,
    portfolio_service: PortfolioService,
    analytics_service: AnalyticsService,
    chart_service: ChartService,
}

impl std::fmt::Debug for CryptoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("CryptoStore")
            .field("gateway", &self.gateway.name())
            .field("coins", &state.coins.len())
            .field("watchlist", &state.watchlist.len())
            .field("portfolio", &state.portfolio.len())
            .field("status", &state.status)
            .finish()
    }
}

impl CryptoStore {
    /// Build a store hydrated from `backing`. Does not touch the network;
    /// the market status starts as `Idle`.
    pub fn new(
        gateway: Arc<dyn MarketDataGateway>,
        backing: Arc<dyn KeyValueStore>,
        settings: Settings,
    ) -> Self {
        let portfolio_service = PortfolioService::new();
        let watchlist = portfolio_service.dedup_watchlist(StorageManager::load_watchlist(
            backing.as_ref(),
            &settings.watchlist_key,
        ));
        let portfolio = StorageManager::load_portfolio(backing.as_ref(), &settings.portfolio_key);
        debug!(
            watchlist = watchlist.len(),
            portfolio = portfolio.len(),
            "hydrated store from backing"
        );

        let (state, _) = watch::channel(StoreState {
            watchlist,
            portfolio,
            ..StoreState::default()
        });
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);

        Self {
            gateway,
            backing,
            settings,
            state,
            write_lock: Mutex::new(()),
            notifications,
            portfolio_service,
            analytics_service: AnalyticsService::new(),
            chart_service: ChartService::new(),
        }
    }

    /// Build a hydrated store and run the initial market refresh.
    ///
    /// A failed initial refresh is not an error: the store comes up in
    /// `Failed` with an empty coin list.
    pub async fn open(
        gateway: Arc<dyn MarketDataGateway>,
        backing: Arc<dyn KeyValueStore>,
        settings: Settings,
    ) -> Arc<Self> {
        let store = Arc::new(Self::new(gateway, backing, settings));
        store.refresh_market().await;
        store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ── Observation ─────────────────────────────────────────────────

    /// Receive every state change. The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    /// Receive transient notifications emitted after this call.
    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Clone of the full current state.
    #[must_use]
    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn coins(&self) -> Vec<CoinQuote> {
        self.state.borrow().coins.clone()
    }

    #[must_use]
    pub fn coin(&self, id: &str) -> Option<CoinQuote> {
        self.state.borrow().coin(id).cloned()
    }

    #[must_use]
    pub fn watchlist(&self) -> Vec<String> {
        self.state.borrow().watchlist.clone()
    }

    #[must_use]
    pub fn portfolio(&self) -> Vec<PortfolioHolding> {
        self.state.borrow().portfolio.clone()
    }

    #[must_use]
    pub fn status(&self) -> MarketStatus {
        self.state.borrow().status
    }

    /// Message of the last failed market refresh, if the latest one failed.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    // ── Market data ─────────────────────────────────────────────────

    /// Fetch the top coins and replace the coin list.
    ///
    /// On success every holding whose coin appears in the listing is
    /// re-priced. On failure the previous listing and all holding prices are
    /// kept, the status becomes `Failed` and the error is recorded.
    pub async fn refresh_market(&self) {
        self.state.send_modify(|s| s.status = MarketStatus::Loading);

        let result = self
            .gateway
            .fetch_markets(&self.settings.vs_currency, self.settings.market_page_size, 1)
            .await;

        match result {
            Ok(coins) => {
                let count = coins.len();
                let prices = self.portfolio_service.prices_from_quotes(&coins);
                let _guard = self.write_guard();
                let mut repriced = 0;
                self.state.send_modify(|s| {
                    repriced = self.portfolio_service.apply_prices(&mut s.portfolio, &prices);
                    s.coins = coins;
                    s.status = MarketStatus::Ready;
                    s.error = None;
                    s.last_updated = Some(Utc::now());
                });
                info!(count, repriced, "market data refreshed");
                if repriced > 0 {
                    self.persist_portfolio();
                }
            }
            Err(e) => {
                warn!(gateway = self.gateway.name(), error = %e, "market refresh failed");
                self.state.send_modify(|s| {
                    s.status = MarketStatus::Failed;
                    s.error = Some(MARKET_FETCH_FAILED.to_string());
                });
                self.notify(Notification::error(MARKET_FETCH_FAILED));
            }
        }
    }

    /// Fetch full detail for one coin.
    ///
    /// Returns `None` on any failure; an unknown id and a network error look
    /// the same to the caller.
    pub async fn lookup_coin(&self, id: &str) -> Option<CoinQuote> {
        match self.gateway.fetch_coin(id).await {
            Ok(coin) => Some(coin),
            Err(e) => {
                warn!(%id, error = %e, "coin lookup failed");
                self.notify(Notification::error(COIN_FETCH_FAILED));
                None
            }
        }
    }

    /// Update the free-text filter used by `filtered_coins`.
    pub fn set_search_term(&self, term: impl Into<String>) {
        let term = term.into();
        self.state.send_if_modified(|s| {
            if s.search_term == term {
                return false;
            }
            s.search_term = term;
            true
        });
    }

    /// Coins matching the current search term (all coins when it is empty).
    #[must_use]
    pub fn filtered_coins(&self) -> Vec<CoinQuote> {
        let state = self.state.borrow();
        state
            .coins
            .iter()
            .filter(|c| c.matches(&state.search_term))
            .cloned()
            .collect()
    }

    // ── Watchlist ───────────────────────────────────────────────────

    /// Add a coin to the watchlist. Adding a watched coin leaves the set
    /// unchanged but still persists and notifies.
    pub fn add_to_watchlist(&self, coin_id: &str) {
        let _guard = self.write_guard();
        let mut added = false;
        self.state.send_if_modified(|s| {
            added = self.portfolio_service.watch(&mut s.watchlist, coin_id);
            added
        });
        debug!(%coin_id, added, "watchlist add");
        self.persist_watchlist();
        self.notify(Notification::success("Added to watchlist"));
    }

    pub fn remove_from_watchlist(&self, coin_id: &str) {
        let _guard = self.write_guard();
        let mut removed = false;
        self.state.send_if_modified(|s| {
            removed = self.portfolio_service.unwatch(&mut s.watchlist, coin_id);
            removed
        });
        debug!(%coin_id, removed, "watchlist remove");
        self.persist_watchlist();
        self.notify(Notification::success("Removed from watchlist"));
    }

    #[must_use]
    pub fn is_watched(&self, coin_id: &str) -> bool {
        self.state.borrow().watchlist.iter().any(|id| id == coin_id)
    }

    /// Market quotes of watched coins, in watchlist order. Watched coins
    /// missing from the current listing are skipped.
    #[must_use]
    pub fn watched_coins(&self) -> Vec<CoinQuote> {
        let state = self.state.borrow();
        self.portfolio_service
            .watched_coins(&state.coins, &state.watchlist)
    }

    // ── Portfolio ───────────────────────────────────────────────────

    /// Append a holding priced from the current coin list (0 when the coin is
    /// not listed) and return its id.
    ///
    /// Amount and buy price are taken as given; callers validate them.
    pub fn add_to_portfolio(&self, new: NewHolding) -> String {
        let _guard = self.write_guard();
        let mut id = String::new();
        self.state.send_modify(|s| {
            id = self
                .portfolio_service
                .add_holding(&mut s.portfolio, &s.coins, new);
        });
        info!(holding = %id, "added holding");
        self.persist_portfolio();
        self.notify(Notification::success("Added to portfolio"));
        id
    }

    /// Remove the holding with `holding_id`; a no-op when it is absent.
    pub fn remove_from_portfolio(&self, holding_id: &str) {
        let _guard = self.write_guard();
        let mut removed = None;
        self.state.send_if_modified(|s| {
            removed = self
                .portfolio_service
                .remove_holding(&mut s.portfolio, holding_id);
            removed.is_some()
        });
        self.persist_portfolio();
        match removed {
            Some(h) => {
                info!(holding = %h.id, coin = %h.coin_id, "removed holding");
                self.notify(Notification::success("Removed from portfolio"));
            }
            None => debug!(%holding_id, "no holding to remove"),
        }
    }

    /// Re-price every holding with one batched price request.
    ///
    /// Coins missing from the response keep their previous price. A failed
    /// request leaves every holding untouched.
    pub async fn sync_portfolio_prices(&self) {
        let ids = {
            let state = self.state.borrow();
            self.portfolio_service.held_coin_ids(&state.portfolio)
        };
        if ids.is_empty() {
            return;
        }

        match self
            .gateway
            .fetch_simple_prices(&ids, &self.settings.vs_currency)
            .await
        {
            Ok(prices) => {
                let _guard = self.write_guard();
                let mut changed = 0;
                self.state.send_if_modified(|s| {
                    changed = self.portfolio_service.apply_prices(&mut s.portfolio, &prices);
                    changed > 0
                });
                info!(
                    requested = ids.len(),
                    received = prices.len(),
                    changed,
                    "portfolio prices synced"
                );
                self.persist_portfolio();
            }
            Err(e) => {
                warn!(gateway = self.gateway.name(), error = %e, "portfolio price sync failed");
                self.notify(Notification::error(PRICE_SYNC_FAILED));
            }
        }
    }

    // ── Derived values ──────────────────────────────────────────────

    /// Investment, value and profit/loss of the current portfolio.
    #[must_use]
    pub fn summary(&self) -> PortfolioSummary {
        self.analytics_service.summarize(&self.state.borrow().portfolio)
    }

    /// 7-day price history of a listed coin, if it has sparkline samples.
    #[must_use]
    pub fn price_history(&self, coin_id: &str) -> Option<PriceHistory> {
        let state = self.state.borrow();
        self.chart_service.price_history(state.coin(coin_id)?)
    }

    /// Portfolio distribution by current value.
    #[must_use]
    pub fn allocation(&self) -> Vec<AllocationSlice> {
        self.chart_service.allocation(&self.state.borrow().portfolio)
    }

    // ── Internals ───────────────────────────────────────────────────

    /// Held across a mutation and its persist. Never held across an await.
    fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn persist_watchlist(&self) {
        let snapshot = self.watchlist();
        if let Err(e) = StorageManager::save_watchlist(
            self.backing.as_ref(),
            &self.settings.watchlist_key,
            &snapshot,
        ) {
            warn!(error = %e, "could not persist watchlist");
            self.notify(Notification::error(WATCHLIST_SAVE_FAILED));
        }
    }

    fn persist_portfolio(&self) {
        let snapshot = self.portfolio();
        if let Err(e) = StorageManager::save_portfolio(
            self.backing.as_ref(),
            &self.settings.portfolio_key,
            &snapshot,
        ) {
            warn!(error = %e, "could not persist portfolio");
            self.notify(Notification::error(PORTFOLIO_SAVE_FAILED));
        }
    }

    fn notify(&self, notification: Notification) {
        if notification.is_error() {
            warn!(message = %notification.message, "notification");
        } else {
            info!(message = %notification.message, "notification");
        }
        // No receivers is fine: notifications are fire-and-forget.
        let _ = self.notifications.send(notification);
    }
}
