use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::errors::CoreError;
use crate::models::analytics::PortfolioSummary;
use crate::models::holding::PortfolioHolding;
use crate::services::analytics_service::AnalyticsService;

pub const CSV_FILENAME: &str = "cryptotrack-portfolio.csv";
pub const REPORT_FILENAME: &str = "cryptotrack-portfolio.txt";
pub const REPORT_TITLE: &str = "CryptoTrack Portfolio Report";

/// Holdings rows per report page.
pub const ROWS_PER_PAGE: usize = 40;

const PAGE_BREAK: char = '\u{000C}';

#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Asset")]
    asset: &'a str,
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Holdings")]
    holdings: f64,
    #[serde(rename = "Buy Price")]
    buy_price: f64,
    #[serde(rename = "Current Price")]
    current_price: f64,
    #[serde(rename = "Investment")]
    investment: f64,
    #[serde(rename = "Current Value")]
    current_value: f64,
    #[serde(rename = "Profit/Loss")]
    profit_loss: f64,
    #[serde(rename = "P&L %")]
    profit_loss_pct: String,
}

/// Builds downloadable exports from a portfolio snapshot.
///
/// Exports are taken from the holdings as they are at call time and are not
/// kept in sync afterwards.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExportService {
    analytics: AnalyticsService,
}

impl ExportService {
    pub fn new() -> Self {
        Self {
            analytics: AnalyticsService::new(),
        }
    }

    /// Write one CSV row per holding (with a header row) to `writer`.
    pub fn write_csv<W: Write>(
        &self,
        holdings: &[PortfolioHolding],
        writer: W,
    ) -> Result<(), CoreError> {
        let mut wtr = csv::Writer::from_writer(writer);
        for h in holdings {
            wtr.serialize(CsvRow {
                asset: &h.name,
                symbol: h.symbol.to_uppercase(),
                holdings: h.amount,
                buy_price: h.buy_price,
                current_price: h.current_price,
                investment: h.investment(),
                current_value: h.current_value(),
                profit_loss: h.profit_loss(),
                profit_loss_pct: format!("{:.2}%", h.profit_loss_pct()),
            })?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// CSV export as a string.
    pub fn to_csv(&self, holdings: &[PortfolioHolding]) -> Result<String, CoreError> {
        let mut buf = Vec::new();
        self.write_csv(holdings, &mut buf)?;
        String::from_utf8(buf).map_err(|e| CoreError::Export(e.to_string()))
    }

    /// Write the CSV export to a file, replacing it if present.
    pub fn export_csv(
        &self,
        holdings: &[PortfolioHolding],
        path: impl AsRef<Path>,
    ) -> Result<(), CoreError> {
        let file = std::fs::File::create(path)?;
        self.write_csv(holdings, file)
    }

    /// Paginated plain-text report: title, generation date, holdings table and
    /// a portfolio summary block. Pages are separated by form feeds.
    pub fn render_report(
        &self,
        holdings: &[PortfolioHolding],
        generated_at: DateTime<Utc>,
    ) -> String {
        let summary = self.analytics.summarize(holdings);
        let chunks: Vec<&[PortfolioHolding]> = if holdings.is_empty() {
            vec![&holdings[..0]]
        } else {
            holdings.chunks(ROWS_PER_PAGE).collect()
        };
        let page_count = chunks.len();

        let mut pages = Vec::with_capacity(page_count);
        for (i, chunk) in chunks.iter().enumerate() {
            let mut page = String::new();
            page.push_str(REPORT_TITLE);
            page.push('\n');
            page.push_str(&format!(
                "Generated on: {}    Page {} of {}\n\n",
                generated_at.format("%Y-%m-%d"),
                i + 1,
                page_count
            ));
            page.push_str(&table_header());
            for h in chunk.iter() {
                page.push_str(&table_row(h));
            }
            if i + 1 == page_count {
                page.push('\n');
                page.push_str(&summary_block(&summary));
            }
            pages.push(page);
        }

        pages.join(&PAGE_BREAK.to_string())
    }

    /// Write the report to a file, replacing it if present.
    pub fn export_report(
        &self,
        holdings: &[PortfolioHolding],
        path: impl AsRef<Path>,
    ) -> Result<(), CoreError> {
        std::fs::write(path, self.render_report(holdings, Utc::now()))?;
        Ok(())
    }
}

fn table_header() -> String {
    let header = format!(
        "{:<20} {:<8} {:>14} {:>14} {:>14} {:>16} {:>9}\n",
        "Asset", "Symbol", "Holdings", "Buy Price", "Current Price", "Value", "P&L %"
    );
    let rule = "-".repeat(header.trim_end().chars().count());
    format!("{header}{rule}\n")
}

fn table_row(h: &PortfolioHolding) -> String {
    format!(
        "{:<20} {:<8} {:>14} {:>14} {:>14} {:>16} {:>9}\n",
        truncate(&h.name, 20),
        h.symbol.to_uppercase(),
        h.amount,
        format_usd(h.buy_price),
        format_usd(h.current_price),
        format_usd(h.current_value()),
        format!("{:.2}%", h.profit_loss_pct())
    )
}

fn summary_block(summary: &PortfolioSummary) -> String {
    format!(
        "Portfolio Summary\nTotal Investment: {}\nCurrent Value: {}\nTotal P&L: {} ({:.2}%)\n",
        format_usd(summary.total_investment),
        format_usd(summary.current_value),
        format_usd(summary.profit_loss),
        summary.profit_loss_pct
    )
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max - 1).collect();
        out.push('…');
        out
    }
}

/// US-dollar formatting with thousands separators and two decimals,
/// e.g. `-$1,234.50`.
pub fn format_usd(amount: f64) -> String {
    if !amount.is_finite() {
        return "-".to_string();
    }
    let cents = (amount.abs() * 100.0).round() as u128;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac:02}")
}
