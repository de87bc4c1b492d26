// ═══════════════════════════════════════════════════════════════════
// Service Tests — PortfolioService, AnalyticsService, ChartService,
// ExportService
// ═══════════════════════════════════════════════════════════════════

use chrono::{TimeZone, Utc};
use std::collections::HashMap;

use crypto_tracker_core::models::coin::CoinQuote;
use crypto_tracker_core::models::holding::{NewHolding, PortfolioHolding};
use crypto_tracker_core::services::analytics_service::AnalyticsService;
use crypto_tracker_core::services::chart_service::ChartService;
use crypto_tracker_core::services::export_service::{
    format_usd, ExportService, REPORT_TITLE, ROWS_PER_PAGE,
};
use crypto_tracker_core::services::portfolio_service::PortfolioService;

fn quote(id: &str, price: f64) -> CoinQuote {
    CoinQuote {
        id: id.into(),
        name: id.to_uppercase(),
        symbol: id[..3.min(id.len())].into(),
        current_price: price,
        price_change_percentage_24h: 0.0,
        market_cap: 0.0,
        image: String::new(),
        sparkline_in_7d: None,
    }
}

fn holding(id: &str, coin_id: &str, amount: f64, buy: f64, current: f64) -> PortfolioHolding {
    PortfolioHolding {
        id: id.into(),
        coin_id: coin_id.into(),
        name: coin_id.to_string(),
        symbol: coin_id[..3.min(coin_id.len())].into(),
        amount,
        buy_price: buy,
        current_price: current,
        image: String::new(),
    }
}

// ═══════════════════════════════════════════════════════════════════
// PortfolioService
// ═══════════════════════════════════════════════════════════════════

mod portfolio_service {
    use super::*;

    #[test]
    fn watch_is_idempotent() {
        let svc = PortfolioService::new();
        let mut list = Vec::new();
        assert!(svc.watch(&mut list, "bitcoin"));
        assert!(!svc.watch(&mut list, "bitcoin"));
        assert_eq!(list, vec!["bitcoin".to_string()]);
    }

    #[test]
    fn unwatch_missing_is_false() {
        let svc = PortfolioService::new();
        let mut list = vec!["bitcoin".to_string()];
        assert!(!svc.unwatch(&mut list, "ethereum"));
        assert!(svc.unwatch(&mut list, "bitcoin"));
        assert!(list.is_empty());
    }

    #[test]
    fn watch_sequences_match_set_semantics() {
        let svc = PortfolioService::new();
        let mut list = Vec::new();
        let ops: &[(&str, bool)] = &[
            ("btc", true),
            ("eth", true),
            ("btc", true),
            ("sol", true),
            ("eth", false),
            ("eth", false),
            ("ada", true),
            ("btc", false),
            ("btc", true),
        ];
        for (id, add) in ops {
            if *add {
                svc.watch(&mut list, id);
            } else {
                svc.unwatch(&mut list, id);
            }
        }
        assert_eq!(list, vec!["sol", "ada", "btc"]);
    }

    #[test]
    fn watched_coins_follow_watchlist_order_and_skip_unknown() {
        let svc = PortfolioService::new();
        let coins = vec![quote("bitcoin", 1.0), quote("ethereum", 2.0)];
        let list = vec!["ethereum".to_string(), "ghost".to_string(), "bitcoin".to_string()];
        let ids: Vec<String> = svc
            .watched_coins(&coins, &list)
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["ethereum", "bitcoin"]);
    }

    #[test]
    fn add_holding_captures_listed_price() {
        let svc = PortfolioService::new();
        let coins = vec![quote("bitcoin", 65000.0)];
        let mut portfolio = Vec::new();
        let id = svc.add_holding(
            &mut portfolio,
            &coins,
            NewHolding::new("bitcoin", "Bitcoin", "btc", 0.1, 60000.0),
        );
        assert_eq!(portfolio.len(), 1);
        assert_eq!(portfolio[0].id, id);
        assert_eq!(portfolio[0].current_price, 65000.0);
    }

    #[test]
    fn add_holding_for_unlisted_coin_is_zero_priced() {
        let svc = PortfolioService::new();
        let mut portfolio = Vec::new();
        svc.add_holding(
            &mut portfolio,
            &[quote("bitcoin", 65000.0)],
            NewHolding::new("obscure", "Obscure", "obs", 10.0, 1.0),
        );
        assert_eq!(portfolio[0].current_price, 0.0);
    }

    #[test]
    fn remove_holding_returns_removed() {
        let svc = PortfolioService::new();
        let mut portfolio = vec![holding("a", "bitcoin", 1.0, 1.0, 1.0)];
        assert!(svc.remove_holding(&mut portfolio, "zzz").is_none());
        let removed = svc.remove_holding(&mut portfolio, "a").unwrap();
        assert_eq!(removed.id, "a");
        assert!(portfolio.is_empty());
    }

    #[test]
    fn apply_prices_keeps_missing_coins() {
        let svc = PortfolioService::new();
        let mut portfolio = vec![
            holding("1", "coin-a", 1.0, 90.0, 100.0),
            holding("2", "coin-b", 1.0, 40.0, 50.0),
        ];
        let prices = HashMap::from([("coin-a".to_string(), 60.0)]);
        assert_eq!(svc.apply_prices(&mut portfolio, &prices), 1);
        assert_eq!(portfolio[0].current_price, 60.0);
        assert_eq!(portfolio[1].current_price, 50.0);
    }

    #[test]
    fn apply_prices_updates_every_holding_of_a_coin() {
        let svc = PortfolioService::new();
        let mut portfolio = vec![
            holding("1", "bitcoin", 1.0, 1.0, 1.0),
            holding("2", "bitcoin", 2.0, 1.0, 1.0),
        ];
        let prices = HashMap::from([("bitcoin".to_string(), 5.0)]);
        assert_eq!(svc.apply_prices(&mut portfolio, &prices), 2);
        assert!(portfolio.iter().all(|h| h.current_price == 5.0));
    }

    #[test]
    fn prices_from_quotes() {
        let svc = PortfolioService::new();
        let prices = svc.prices_from_quotes(&[quote("bitcoin", 3.0), quote("ethereum", 2.0)]);
        assert_eq!(prices["bitcoin"], 3.0);
        assert_eq!(prices["ethereum"], 2.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// AnalyticsService
// ═══════════════════════════════════════════════════════════════════

mod analytics_service {
    use super::*;

    #[test]
    fn empty_portfolio_is_all_zero() {
        let s = AnalyticsService::new().summarize(&[]);
        assert_eq!(s.total_investment, 0.0);
        assert_eq!(s.current_value, 0.0);
        assert_eq!(s.profit_loss, 0.0);
        assert_eq!(s.profit_loss_pct, 0.0);
        assert!(s.holdings.is_empty());
        assert!(s.is_profit());
    }

    #[test]
    fn zero_investment_pct_is_zero_not_nan() {
        let s = AnalyticsService::new().summarize(&[holding("1", "airdrop", 100.0, 0.0, 2.0)]);
        assert_eq!(s.total_investment, 0.0);
        assert_eq!(s.current_value, 200.0);
        assert_eq!(s.profit_loss, 200.0);
        assert_eq!(s.profit_loss_pct, 0.0);
        assert!(!s.profit_loss_pct.is_nan());
    }

    #[test]
    fn totals_and_breakdown() {
        let s = AnalyticsService::new().summarize(&[
            holding("1", "bitcoin", 0.5, 40000.0, 60000.0),
            holding("2", "ethereum", 10.0, 3000.0, 2000.0),
        ]);
        assert_eq!(s.total_investment, 50000.0);
        assert_eq!(s.current_value, 50000.0);
        assert_eq!(s.profit_loss, 0.0);
        assert_eq!(s.profit_loss_pct, 0.0);

        let btc = &s.holdings[0];
        assert_eq!(btc.investment, 20000.0);
        assert_eq!(btc.current_value, 30000.0);
        assert_eq!(btc.profit_loss, 10000.0);
        assert!((btc.profit_loss_pct - 50.0).abs() < 1e-9);
        assert!((btc.allocation_pct - 60.0).abs() < 1e-9);

        let eth = &s.holdings[1];
        assert_eq!(eth.profit_loss, -10000.0);
        assert!((eth.profit_loss_pct + 33.333333333).abs() < 1e-6);
        assert!((eth.allocation_pct - 40.0).abs() < 1e-9);
    }

    #[test]
    fn loss_is_not_profit() {
        let s = AnalyticsService::new().summarize(&[holding("1", "x", 1.0, 10.0, 5.0)]);
        assert!(!s.is_profit());
        assert!((s.profit_loss_pct + 50.0).abs() < 1e-9);
    }
}

// ═══════════════════════════════════════════════════════════════════
// ChartService
// ═══════════════════════════════════════════════════════════════════

mod chart_service {
    use super::*;

    #[test]
    fn price_history_from_sparkline() {
        let mut c = quote("bitcoin", 110.0);
        c.sparkline_in_7d = Some(vec![100.0, 90.0, 120.0, 110.0]);
        let h = ChartService::new().price_history(&c).unwrap();
        assert_eq!(h.coin_id, "bitcoin");
        assert_eq!(h.label, "BITCOIN");
        assert_eq!(h.points.len(), 4);
        assert_eq!(h.points[2].index, 2);
        assert_eq!(h.points[2].price, 120.0);
        assert_eq!(h.min, 90.0);
        assert_eq!(h.max, 120.0);
        assert!((h.change_pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn no_sparkline_no_history() {
        assert!(ChartService::new().price_history(&quote("bitcoin", 1.0)).is_none());
    }

    #[test]
    fn allocation_percentages_sum_to_100() {
        let slices = ChartService::new().allocation(&[
            holding("1", "bitcoin", 1.0, 1.0, 300.0),
            holding("2", "ethereum", 1.0, 1.0, 100.0),
        ]);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].label, "bitcoin");
        assert_eq!(slices[0].value, 300.0);
        assert!((slices[0].percentage - 75.0).abs() < 1e-9);
        let total: f64 = slices.iter().map(|s| s.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn allocation_of_worthless_portfolio_is_zero() {
        let slices = ChartService::new().allocation(&[holding("1", "dead", 1.0, 1.0, 0.0)]);
        assert_eq!(slices[0].percentage, 0.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// ExportService
// ═══════════════════════════════════════════════════════════════════

mod export_service {
    use super::*;

    #[test]
    fn csv_has_header_and_rows() {
        let csv = ExportService::new()
            .to_csv(&[holding("1", "bitcoin", 2.0, 100.0, 150.0)])
            .unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Asset,Symbol,Holdings,Buy Price,Current Price,Investment,Current Value,Profit/Loss,P&L %"
        );
        assert_eq!(
            lines.next().unwrap(),
            "bitcoin,BIT,2.0,100.0,150.0,200.0,300.0,100.0,50.00%"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn csv_of_empty_portfolio_is_empty() {
        assert_eq!(ExportService::new().to_csv(&[]).unwrap(), "");
    }

    #[test]
    fn csv_quotes_names_with_commas() {
        let mut h = holding("1", "bitcoin", 1.0, 1.0, 1.0);
        h.name = "Coin, Inc".into();
        let csv = ExportService::new().to_csv(&[h]).unwrap();
        assert!(csv.lines().nth(1).unwrap().starts_with("\"Coin, Inc\","));
    }

    #[test]
    fn csv_file_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cryptotrack-portfolio.csv");
        ExportService::new()
            .export_csv(&[holding("1", "bitcoin", 1.0, 1.0, 1.0)], &path)
            .unwrap();
        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn report_contains_title_date_rows_and_summary() {
        let at = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let report = ExportService::new().render_report(
            &[
                holding("1", "bitcoin", 0.5, 40000.0, 60000.0),
                holding("2", "ethereum", 10.0, 3000.0, 2000.0),
            ],
            at,
        );
        assert!(report.starts_with(REPORT_TITLE));
        assert!(report.contains("Generated on: 2024-06-10"));
        assert!(report.contains("Page 1 of 1"));
        assert!(report.contains("bitcoin"));
        assert!(report.contains("$30,000.00"));
        assert!(report.contains("50.00%"));
        assert!(report.contains("Portfolio Summary"));
        assert!(report.contains("Total Investment: $50,000.00"));
        assert!(report.contains("Current Value: $50,000.00"));
        assert!(report.contains("Total P&L: $0.00 (0.00%)"));
        assert!(!report.contains('\u{000C}'));
    }

    #[test]
    fn report_paginates() {
        let holdings: Vec<PortfolioHolding> = (0..ROWS_PER_PAGE + 1)
            .map(|i| holding(&i.to_string(), "bitcoin", 1.0, 1.0, 1.0))
            .collect();
        let report = ExportService::new().render_report(&holdings, Utc::now());
        let pages: Vec<&str> = report.split('\u{000C}').collect();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains("Page 1 of 2"));
        assert!(!pages[0].contains("Portfolio Summary"));
        assert!(pages[1].contains("Page 2 of 2"));
        assert!(pages[1].contains("Portfolio Summary"));
    }

    #[test]
    fn empty_report_still_has_summary() {
        let report = ExportService::new().render_report(&[], Utc::now());
        assert!(report.contains("Page 1 of 1"));
        assert!(report.contains("Total Investment: $0.00"));
    }

    #[test]
    fn usd_formatting() {
        assert_eq!(format_usd(1234.5), "$1,234.50");
        assert_eq!(format_usd(-0.004), "$0.00");
    }
}
