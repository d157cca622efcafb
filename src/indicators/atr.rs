/// Average True Range (ATR)
///
/// True Range is the greatest of:
/// - High - Low
/// - Abs(High - Previous Close)
/// - Abs(Low - Previous Close)
///
/// ATR here is the plain mean of the last `period` true ranges (no Wilder
/// smoothing), so it only depends on the last `period + 1` bars.
use crate::models::Bar;

/// True range of `bar` given the previous bar's close
pub fn true_range(bar: &Bar, prev_close: f64) -> f64 {
    (bar.high - bar.low)
        .max((bar.high - prev_close).abs())
        .max((bar.low - prev_close).abs())
}

/// Calculate ATR over the last `period` bars
///
/// Returns None if fewer than `period + 1` bars are available
pub fn calculate_atr(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period + 1 {
        return None;
    }

    let recent = &bars[bars.len() - period - 1..];
    let sum: f64 = recent
        .windows(2)
        .map(|pair| true_range(&pair[1], pair[0].close))
        .sum();

    Some(sum / period as f64)
}
