/// Calculate Simple Moving Average (SMA) of the last `period` values
pub fn calculate_sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }

    let sum: f64 = values.iter().rev().take(period).sum();
    Some(sum / period as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma() {
        let closes = vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
        assert_eq!(calculate_sma(&closes, 3), Some(14.0));
        assert_eq!(calculate_sma(&closes, 6), Some(12.5));
    }

    #[test]
    fn test_sma_insufficient_data() {
        let closes = vec![100.0, 102.0];
        assert!(calculate_sma(&closes, 5).is_none());
        assert!(calculate_sma(&closes, 0).is_none());
    }
}
