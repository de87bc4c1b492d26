//! Plain-text rendering of store state for the terminal.

use crypto_tracker_core::models::analytics::PortfolioSummary;
use crypto_tracker_core::models::chart::{AllocationSlice, PriceHistory};
use crypto_tracker_core::models::coin::CoinQuote;
use crypto_tracker_core::models::holding::PortfolioHolding;
use crypto_tracker_core::services::chart_service::ChartService;
use crypto_tracker_core::services::export_service::format_usd;

const SPARKLINE_WIDTH: usize = 24;

pub fn coin_table(coins: &[CoinQuote], watchlist: &[String]) {
    if coins.is_empty() {
        println!("No coins to show.");
        return;
    }
    println!(
        "{:<2}{:<24} {:<8} {:>16} {:>9} {:>20}",
        "", "Name", "Symbol", "Price", "24h %", "Market Cap"
    );
    for c in coins {
        let star = if watchlist.iter().any(|id| id == &c.id) {
            "*"
        } else {
            ""
        };
        println!(
            "{:<2}{:<24} {:<8} {:>16} {:>8.2}% {:>20}",
            star,
            truncate(&c.name, 24),
            c.display_symbol(),
            format_usd(c.current_price),
            c.price_change_percentage_24h,
            format_usd(c.market_cap)
        );
    }
}

pub fn coin_detail(coin: &CoinQuote, history: Option<&PriceHistory>, chart: &ChartService) {
    println!("{} ({})", coin.name, coin.display_symbol());
    println!("  id          {}", coin.id);
    println!("  price       {}", format_usd(coin.current_price));
    println!("  24h change  {:.2}%", coin.price_change_percentage_24h);
    println!("  market cap  {}", format_usd(coin.market_cap));
    if let Some(h) = history {
        let prices: Vec<f64> = h.points.iter().map(|p| p.price).collect();
        println!(
            "  7d          {}  {:+.2}%  (low {}, high {})",
            chart.sparkline_text(&prices, SPARKLINE_WIDTH),
            h.change_pct,
            format_usd(h.min),
            format_usd(h.max)
        );
    }
}

pub fn holdings_table(holdings: &[PortfolioHolding]) {
    if holdings.is_empty() {
        println!("Portfolio is empty.");
        return;
    }
    println!(
        "{:<38} {:<20} {:<8} {:>14} {:>14} {:>14} {:>16} {:>9}",
        "Id", "Asset", "Symbol", "Holdings", "Buy Price", "Price", "P&L", "P&L %"
    );
    for h in holdings {
        println!(
            "{:<38} {:<20} {:<8} {:>14} {:>14} {:>14} {:>16} {:>8.2}%",
            h.id,
            truncate(&h.name, 20),
            h.symbol.to_uppercase(),
            h.amount,
            format_usd(h.buy_price),
            format_usd(h.current_price),
            format_usd(h.profit_loss()),
            h.profit_loss_pct()
        );
    }
}

pub fn summary(summary: &PortfolioSummary, allocation: &[AllocationSlice]) {
    println!("Total investment  {}", format_usd(summary.total_investment));
    println!("Current value     {}", format_usd(summary.current_value));
    println!(
        "Profit/Loss       {} ({:+.2}%)",
        format_usd(summary.profit_loss),
        summary.profit_loss_pct
    );
    if !allocation.is_empty() {
        println!();
        println!("Allocation");
        for slice in allocation {
            let bar = "#".repeat((slice.percentage / 2.0).round().max(0.0) as usize);
            println!("  {:<20} {:>6.2}%  {}", truncate(&slice.label, 20), slice.percentage, bar);
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
