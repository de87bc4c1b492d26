use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::store::CryptoStore;

/// Shortest accepted period; `tokio::time::interval` rejects zero.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// A repeating background task. Dropping the handle (or calling `cancel`)
/// stops it, so a schedule never outlives the view that owns it.
///
/// An in-flight run is aborted at its next await point.
#[must_use = "dropping a PeriodicTask cancels it immediately"]
#[derive(Debug)]
pub struct PeriodicTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Run `task` every `period`, starting one period from now. Periods
    /// shorter than [`MIN_PERIOD`] are raised to it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, task: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let period = if period < MIN_PERIOD {
            warn!(task = name, ?period, "schedule period too short; using minimum");
            MIN_PERIOD
        } else {
            period
        };
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                debug!(task = name, "scheduled run");
                task().await;
            }
        });
        Self { name, handle }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the task. Equivalent to dropping it.
    pub fn cancel(self) {}
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        debug!(task = self.name, "cancelling schedule");
        self.handle.abort();
    }
}

/// Re-fetch the market listing every `period`.
pub fn schedule_market_refresh(store: Arc<CryptoStore>, period: Duration) -> PeriodicTask {
    PeriodicTask::spawn("market-refresh", period, move || {
        let store = Arc::clone(&store);
        async move { store.refresh_market().await }
    })
}

/// Re-price portfolio holdings every `period`.
pub fn schedule_price_sync(store: Arc<CryptoStore>, period: Duration) -> PeriodicTask {
    PeriodicTask::spawn("portfolio-price-sync", period, move || {
        let store = Arc::clone(&store);
        async move { store.sync_portfolio_prices().await }
    })
}
