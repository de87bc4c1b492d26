use crate::models::chart::{AllocationSlice, ChartDataPoint, PriceHistory};
use crate::models::coin::CoinQuote;
use crate::models::holding::{percent_of, PortfolioHolding};

/// Generates chart-ready data sets from store data.
///
/// The core computes all the numbers; the front-end only renders.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChartService;

impl ChartService {
    pub fn new() -> Self {
        Self
    }

    /// 7-day price history for a coin.
    ///
    /// Returns `None` when the coin carries no sparkline samples.
    pub fn price_history(&self, coin: &CoinQuote) -> Option<PriceHistory> {
        let samples = coin.sparkline();
        let first = *samples.first()?;
        let last = *samples.last()?;

        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(PriceHistory {
            coin_id: coin.id.clone(),
            label: coin.name.clone(),
            points: samples
                .iter()
                .enumerate()
                .map(|(index, &price)| ChartDataPoint { index, price })
                .collect(),
            min,
            max,
            change_pct: percent_of(last - first, first),
        })
    }

    /// Portfolio distribution by current value, one slice per holding.
    pub fn allocation(&self, holdings: &[PortfolioHolding]) -> Vec<AllocationSlice> {
        let total: f64 = holdings.iter().map(PortfolioHolding::current_value).sum();
        holdings
            .iter()
            .map(|h| {
                let value = h.current_value();
                AllocationSlice {
                    label: h.name.clone(),
                    value,
                    percentage: percent_of(value, total),
                }
            })
            .collect()
    }

    /// Render samples as a single-line unicode sparkline, `width` cells wide.
    /// Samples are bucketed by averaging when there are more than `width`.
    pub fn sparkline_text(&self, samples: &[f64], width: usize) -> String {
        const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
        if samples.is_empty() || width == 0 {
            return String::new();
        }

        let buckets: Vec<f64> = if samples.len() <= width {
            samples.to_vec()
        } else {
            (0..width)
                .map(|i| {
                    let start = i * samples.len() / width;
                    let end = ((i + 1) * samples.len() / width).max(start + 1);
                    let chunk = &samples[start..end];
                    chunk.iter().sum::<f64>() / chunk.len() as f64
                })
                .collect()
        };

        let min = buckets.iter().copied().fold(f64::INFINITY, f64::min);
        let max = buckets.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = max - min;

        buckets
            .iter()
            .map(|&v| {
                if span <= 0.0 {
                    BARS[BARS.len() / 2]
                } else {
                    let idx = ((v - min) / span * (BARS.len() - 1) as f64).round() as usize;
                    BARS[idx.min(BARS.len() - 1)]
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparkline_text_spans_lowest_to_highest_bar() {
        let text = ChartService::new().sparkline_text(&[1.0, 2.0, 3.0], 10);
        assert_eq!(text, "▁▅█");
    }

    #[test]
    fn sparkline_text_buckets_long_series() {
        let samples: Vec<f64> = (0..168).map(f64::from).collect();
        let text = ChartService::new().sparkline_text(&samples, 24);
        assert_eq!(text.chars().count(), 24);
        assert!(text.starts_with('▁'));
        assert!(text.ends_with('█'));
    }

    #[test]
    fn sparkline_text_flat_series() {
        let text = ChartService::new().sparkline_text(&[5.0, 5.0], 10);
        assert_eq!(text, "▅▅");
    }
}
