/// Calculate Relative Strength Index (RSI)
///
/// Simple-average RSI over the last `period` close-to-close changes, so
/// `period + 1` closes are needed:
///
/// `rsi = 100 - 100 / (1 + avg_gain / avg_loss)`
///
/// A window without any loss reads 100.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let recent = &closes[closes.len() - period - 1..];
    let (gain_sum, loss_sum) = recent
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .fold((0.0, 0.0), |(gains, losses), change| {
            if change > 0.0 {
                (gains + change, losses)
            } else {
                (gains, losses - change)
            }
        });

    let avg_gain = gain_sum / period as f64;
    let avg_loss = loss_sum / period as f64;

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_known_value() {
        // changes +1 +1 -1 +1: avg gain 0.75, avg loss 0.25, rs 3
        let closes = vec![1.0, 2.0, 3.0, 2.0, 3.0];
        let rsi = calculate_rsi(&closes, 4).unwrap();
        assert!((rsi - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_only_uses_last_period() {
        // the early crash is outside the 3-change window
        let closes = vec![100.0, 50.0, 51.0, 52.0, 53.0];
        assert_eq!(calculate_rsi(&closes, 3), Some(100.0));
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let closes = vec![100.0, 102.0, 101.0];
        assert!(calculate_rsi(&closes, 14).is_none());
        assert!(calculate_rsi(&closes, 3).is_none());
    }

    #[test]
    fn test_rsi_all_losses() {
        let closes = vec![105.0, 104.0, 103.0, 102.0, 101.0, 100.0];
        let rsi = calculate_rsi(&closes, 5).unwrap();
        assert!(rsi.abs() < 1e-9);
    }
}
