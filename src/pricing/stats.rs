use crate::models::PriceConfidence;

const OUTLIER_SIGMAS: f64 = 2.0;

/// Summary of a cleaned comparable price sample.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceStats {
    pub cleaned: Vec<f64>,
    pub outliers_removed: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl PriceStats {
    /// Drops non-positive and non-finite prices, then anything further than two standard
    /// deviations from the median. Returns `None` when no usable price remains.
    pub fn from_prices(prices: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = prices
            .iter()
            .copied()
            .filter(|price| price.is_finite() && *price > 0.0)
            .collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let center = median(&sorted);
        let spread = std_dev(&sorted, mean(&sorted));
        let mut cleaned: Vec<f64> = if spread > 0.0 {
            sorted
                .iter()
                .copied()
                .filter(|price| (price - center).abs() <= OUTLIER_SIGMAS * spread)
                .collect()
        } else {
            sorted.clone()
        };
        if cleaned.is_empty() {
            cleaned = sorted.clone();
        }

        let outliers_removed = sorted.len() - cleaned.len();
        let mean = mean(&cleaned);
        Some(Self {
            outliers_removed,
            mean,
            std_dev: std_dev(&cleaned, mean),
            median: median(&cleaned),
            min: cleaned[0],
            max: cleaned[cleaned.len() - 1],
            cleaned,
        })
    }

    pub fn sample_size(&self) -> usize {
        self.cleaned.len()
    }

    pub fn confidence(&self) -> PriceConfidence {
        let n = self.sample_size();
        if n >= 10 && self.std_dev < 0.3 * self.mean {
            PriceConfidence::High
        } else if n < 3 || self.std_dev > 0.5 * self.mean {
            PriceConfidence::Low
        } else {
            PriceConfidence::Medium
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
fn std_dev(values: &[f64], mean: f64) -> f64 {
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Expects sorted input.
pub fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_single_extreme_outlier() {
        let stats = PriceStats::from_prices(&[10.0, 12.0, 11.0, 500.0]).expect("stats");
        assert_eq!(stats.cleaned, vec![10.0, 11.0, 12.0]);
        assert_eq!(stats.outliers_removed, 1);
        assert_eq!(stats.median, 11.0);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 12.0);
        assert_eq!(stats.confidence(), PriceConfidence::Medium);
    }

    #[test]
    fn invalid_prices_are_ignored() {
        assert!(PriceStats::from_prices(&[]).is_none());
        assert!(PriceStats::from_prices(&[0.0, -4.0, f64::NAN]).is_none());
        let stats = PriceStats::from_prices(&[-1.0, 30.0]).expect("stats");
        assert_eq!(stats.sample_size(), 1);
        assert_eq!(stats.confidence(), PriceConfidence::Low);
    }

    #[test]
    fn identical_prices_keep_everything() {
        let stats = PriceStats::from_prices(&[40.0; 12]).expect("stats");
        assert_eq!(stats.outliers_removed, 0);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.confidence(), PriceConfidence::High);
    }

    #[test]
    fn wide_spread_is_low_confidence() {
        let stats = PriceStats::from_prices(&[5.0, 20.0, 60.0, 90.0]).expect("stats");
        assert_eq!(stats.outliers_removed, 0);
        assert_eq!(stats.confidence(), PriceConfidence::Low);
    }

    #[test]
    fn even_sample_median_averages_middle_pair() {
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_eq!(median(&[7.0]), 7.0);
    }
}
