use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::errors::CoreError;
use crate::models::holding::PortfolioHolding;

use super::backing::KeyValueStore;

/// Reads and writes the watchlist and portfolio blobs.
///
/// Flow: collection → serde_json → `KeyValueStore::set(key)` (full replace).
/// Loading is forgiving: a missing, unreadable or malformed blob yields an
/// empty collection.
pub struct StorageManager;

impl StorageManager {
    /// Load the watchlist stored under `key`.
    pub fn load_watchlist(backing: &dyn KeyValueStore, key: &str) -> Vec<String> {
        Self::load_or_default(backing, key)
    }

    /// Load the portfolio stored under `key`.
    pub fn load_portfolio(backing: &dyn KeyValueStore, key: &str) -> Vec<PortfolioHolding> {
        Self::load_or_default(backing, key)
    }

    /// Replace the watchlist blob under `key`.
    pub fn save_watchlist(
        backing: &dyn KeyValueStore,
        key: &str,
        watchlist: &[String],
    ) -> Result<(), CoreError> {
        Self::save(backing, key, watchlist)
    }

    /// Replace the portfolio blob under `key`.
    pub fn save_portfolio(
        backing: &dyn KeyValueStore,
        key: &str,
        portfolio: &[PortfolioHolding],
    ) -> Result<(), CoreError> {
        Self::save(backing, key, portfolio)
    }

    fn save<T: Serialize + ?Sized>(
        backing: &dyn KeyValueStore,
        key: &str,
        value: &T,
    ) -> Result<(), CoreError> {
        let json = serde_json::to_string(value)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize {key}: {e}")))?;
        backing.set(key, &json)
    }

    fn load_or_default<T: DeserializeOwned + Default>(
        backing: &dyn KeyValueStore,
        key: &str,
    ) -> T {
        let raw = match backing.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                warn!(%key, error = %e, "could not read stored blob; starting empty");
                return T::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(%key, error = %e, "malformed stored blob; starting empty");
                T::default()
            }
        }
    }
}
