use chrono::Utc;

use crate::models::analytics::{HoldingSummary, PortfolioSummary};
use crate::models::holding::{percent_of, PortfolioHolding};

/// Computes portfolio analytics: investment, current value, profit/loss,
/// returns and allocation.
///
/// Uses the prices stored on each holding; nothing here touches the network.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyticsService;

impl AnalyticsService {
    pub fn new() -> Self {
        Self
    }

    /// Summarize a portfolio snapshot.
    ///
    /// An empty or zero-investment portfolio yields a 0% return, never NaN.
    pub fn summarize(&self, holdings: &[PortfolioHolding]) -> PortfolioSummary {
        let total_investment: f64 = holdings.iter().map(PortfolioHolding::investment).sum();
        let current_value: f64 = holdings.iter().map(PortfolioHolding::current_value).sum();
        let profit_loss = current_value - total_investment;

        let breakdown = holdings
            .iter()
            .map(|h| {
                let value = h.current_value();
                HoldingSummary {
                    holding_id: h.id.clone(),
                    coin_id: h.coin_id.clone(),
                    name: h.name.clone(),
                    symbol: h.symbol.clone(),
                    amount: h.amount,
                    buy_price: h.buy_price,
                    current_price: h.current_price,
                    investment: h.investment(),
                    current_value: value,
                    profit_loss: h.profit_loss(),
                    profit_loss_pct: h.profit_loss_pct(),
                    allocation_pct: percent_of(value, current_value),
                }
            })
            .collect();

        PortfolioSummary {
            as_of: Utc::now(),
            total_investment,
            current_value,
            profit_loss,
            profit_loss_pct: percent_of(profit_loss, total_investment),
            holdings: breakdown,
        }
    }
}
