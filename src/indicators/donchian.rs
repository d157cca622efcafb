use crate::models::Bar;

/// Donchian channel over the last `period` bars: (highest high, lowest low)
pub fn calculate_donchian(bars: &[Bar], period: usize) -> Option<(f64, f64)> {
    if period == 0 || bars.len() < period {
        return None;
    }

    let recent = &bars[bars.len() - period..];
    let upper = recent.iter().fold(f64::MIN, |max, b| max.max(b.high));
    let lower = recent.iter().fold(f64::MAX, |min, b| min.min(b.low));

    Some((upper, lower))
}
