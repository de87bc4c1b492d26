//! Core library for CryptoTrack: market data from a CoinGecko-compatible API,
//! a persisted watchlist and a simulated portfolio.
//!
//! The entry point is [`CryptoStore`]. Front-ends read its state (directly or
//! through [`CryptoStore::subscribe`]), call its operations in response to user
//! actions, and drive periodic refreshes with [`services::scheduler`].

pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;
pub mod store;

pub use errors::CoreError;
pub use models::coin::CoinQuote;
pub use models::holding::{NewHolding, PortfolioHolding};
pub use models::notification::{Notification, NotificationLevel};
pub use models::settings::Settings;
pub use models::state::{MarketStatus, StoreState};
pub use providers::coingecko::CoinGeckoGateway;
pub use providers::traits::MarketDataGateway;
pub use storage::backing::{FileStore, KeyValueStore, MemoryStore};
pub use store::CryptoStore;
