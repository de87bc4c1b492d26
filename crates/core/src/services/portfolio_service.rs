use std::collections::HashMap;

use crate::models::coin::CoinQuote;
use crate::models::holding::{NewHolding, PortfolioHolding};

/// Watchlist and portfolio mutations.
///
/// Pure business logic with no I/O. The `CryptoStore` wraps these
/// with persistence and notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct PortfolioService;

impl PortfolioService {
    pub fn new() -> Self {
        Self
    }

    // ── Watchlist ───────────────────────────────────────────────────

    /// Add a coin id to the watchlist. Returns `false` if it was already there.
    pub fn watch(&self, watchlist: &mut Vec<String>, coin_id: &str) -> bool {
        if watchlist.iter().any(|id| id == coin_id) {
            return false;
        }
        watchlist.push(coin_id.to_string());
        true
    }

    /// Remove a coin id from the watchlist. Returns `false` if it was absent.
    pub fn unwatch(&self, watchlist: &mut Vec<String>, coin_id: &str) -> bool {
        let before = watchlist.len();
        watchlist.retain(|id| id != coin_id);
        watchlist.len() != before
    }

    /// Drop duplicate ids, keeping the first occurrence of each.
    pub fn dedup_watchlist(&self, watchlist: Vec<String>) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(watchlist.len());
        for id in watchlist {
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }

    /// Coins from `coins` that are on the watchlist, in watchlist order.
    pub fn watched_coins(&self, coins: &[CoinQuote], watchlist: &[String]) -> Vec<CoinQuote> {
        watchlist
            .iter()
            .filter_map(|id| coins.iter().find(|c| &c.id == id).cloned())
            .collect()
    }

    // ── Portfolio ───────────────────────────────────────────────────

    /// Append a new holding priced from `coins` (0 when the coin is unknown).
    /// Returns the new holding's id.
    pub fn add_holding(
        &self,
        portfolio: &mut Vec<PortfolioHolding>,
        coins: &[CoinQuote],
        new: NewHolding,
    ) -> String {
        let current_price = coins
            .iter()
            .find(|c| c.id == new.coin_id)
            .map(|c| c.current_price)
            .unwrap_or(0.0);
        let holding = PortfolioHolding::from_new(new, current_price);
        let id = holding.id.clone();
        portfolio.push(holding);
        id
    }

    /// Remove the holding with `holding_id`. Returns the removed holding, or
    /// `None` when no holding matched.
    pub fn remove_holding(
        &self,
        portfolio: &mut Vec<PortfolioHolding>,
        holding_id: &str,
    ) -> Option<PortfolioHolding> {
        let idx = portfolio.iter().position(|h| h.id == holding_id)?;
        Some(portfolio.remove(idx))
    }

    /// Distinct coin ids held, in first-seen order.
    pub fn held_coin_ids(&self, portfolio: &[PortfolioHolding]) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for h in portfolio {
            if !ids.contains(&h.coin_id) {
                ids.push(h.coin_id.clone());
            }
        }
        ids
    }

    /// Overwrite `current_price` of every holding whose coin has a price in
    /// `prices`. Holdings without an entry, or whose entry is zero, negative
    /// or non-finite, keep their previous price.
    ///
    /// Returns the number of holdings whose price actually changed.
    pub fn apply_prices(
        &self,
        portfolio: &mut [PortfolioHolding],
        prices: &HashMap<String, f64>,
    ) -> usize {
        let mut changed = 0;
        for holding in portfolio.iter_mut() {
            if let Some(&price) = prices.get(&holding.coin_id) {
                let usable = price.is_finite() && price > 0.0;
                if usable && price != holding.current_price {
                    holding.current_price = price;
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Price map built from a market listing, for `apply_prices`.
    pub fn prices_from_quotes(&self, coins: &[CoinQuote]) -> HashMap<String, f64> {
        coins
            .iter()
            .map(|c| (c.id.clone(), c.current_price))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holding(id: &str, coin_id: &str, price: f64) -> PortfolioHolding {
        PortfolioHolding {
            id: id.into(),
            coin_id: coin_id.into(),
            name: coin_id.into(),
            symbol: coin_id.into(),
            amount: 1.0,
            buy_price: price,
            current_price: price,
            image: String::new(),
        }
    }

    #[test]
    fn held_coin_ids_are_distinct_and_ordered() {
        let portfolio = vec![
            holding("1", "bitcoin", 1.0),
            holding("2", "ethereum", 1.0),
            holding("3", "bitcoin", 1.0),
        ];
        assert_eq!(
            PortfolioService::new().held_coin_ids(&portfolio),
            vec!["bitcoin".to_string(), "ethereum".to_string()]
        );
    }

    #[test]
    fn apply_prices_ignores_non_finite() {
        let mut portfolio = vec![holding("1", "bitcoin", 10.0)];
        let prices = HashMap::from([("bitcoin".to_string(), f64::NAN)]);
        assert_eq!(PortfolioService::new().apply_prices(&mut portfolio, &prices), 0);
        assert_eq!(portfolio[0].current_price, 10.0);
    }

    #[test]
    fn apply_prices_keeps_previous_price_on_zero() {
        let mut portfolio = vec![holding("1", "bitcoin", 10.0), holding("2", "solana", 4.0)];
        let prices = HashMap::from([
            ("bitcoin".to_string(), 0.0),
            ("solana".to_string(), -1.0),
        ]);
        assert_eq!(PortfolioService::new().apply_prices(&mut portfolio, &prices), 0);
        assert_eq!(portfolio[0].current_price, 10.0);
        assert_eq!(portfolio[1].current_price, 4.0);
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let list = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        assert_eq!(
            PortfolioService::new().dedup_watchlist(list),
            vec!["a".to_string(), "b".to_string()]
        );
    }
}
