/// Commodity Channel Index (CCI)
///
/// `cci = (tp - sma(tp, n)) / (0.015 * mean_abs_dev(tp, n))` with
/// `tp = (high + low + close) / 3` of the latest bar.
use crate::models::Bar;

const CCI_CONSTANT: f64 = 0.015;

pub fn calculate_cci(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period {
        return None;
    }

    let typical: Vec<f64> = bars[bars.len() - period..]
        .iter()
        .map(Bar::typical_price)
        .collect();

    let mean = typical.iter().sum::<f64>() / period as f64;
    let mean_dev = typical.iter().map(|tp| (tp - mean).abs()).sum::<f64>() / period as f64;

    // Flat window: every typical price equals the mean
    if mean_dev == 0.0 {
        return Some(0.0);
    }

    let current = *typical.last()?;
    Some((current - mean) / (CCI_CONSTANT * mean_dev))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Interval;
    use chrono::{Duration, TimeZone, Utc};

    fn bars_from_typical(values: &[f64]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Bar {
                instant: start + Duration::minutes(i as i64),
                open: v,
                high: v,
                low: v,
                close: v,
                volume: 0.0,
                interval: Interval::Minutes(1),
            })
            .collect()
    }

    #[test]
    fn test_cci_known_value() {
        // tp = 1, 2, 3, 4: mean 2.5, mean dev 1.0
        let bars = bars_from_typical(&[1.0, 2.0, 3.0, 4.0]);
        let cci = calculate_cci(&bars, 4).unwrap();
        assert!((cci - 1.5 / 0.015).abs() < 1e-9);
    }

    #[test]
    fn test_cci_negative_below_mean() {
        let bars = bars_from_typical(&[4.0, 3.0, 2.0, 1.0]);
        let cci = calculate_cci(&bars, 4).unwrap();
        assert!((cci + 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_cci_flat_window() {
        let bars = bars_from_typical(&[5.0; 6]);
        assert_eq!(calculate_cci(&bars, 6), Some(0.0));
    }

    #[test]
    fn test_cci_insufficient_data() {
        let bars = bars_from_typical(&[5.0; 3]);
        assert!(calculate_cci(&bars, 4).is_none());
    }
}
