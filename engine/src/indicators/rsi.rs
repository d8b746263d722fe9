// Relative Strength Index (RSI) indicator implementation
use super::IndicatorCalculator;
use serde_json::Value;

/// RSI from a trailing simple average of gains and losses over `period`
/// deltas. A zero loss average maps to 100.
pub struct Rsi {
    name: String,
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("RSI({})", period),
            period,
        }
    }

    /// Rolling (average gain, average loss) per index; `None` until `period`
    /// deltas are available.
    fn averages(&self, closes: &[f64]) -> Vec<Option<(f64, f64)>> {
        if self.period == 0 || closes.len() <= self.period {
            return vec![None; closes.len()];
        }

        let deltas: Vec<f64> = closes.windows(2).map(|pair| pair[1] - pair[0]).collect();
        let mut results = vec![None; self.period];
        results.extend(deltas.windows(self.period).map(|window| {
            let gains: f64 = window.iter().filter(|d| **d > 0.0).sum();
            let losses: f64 = window.iter().filter(|d| **d < 0.0).map(|d| -d).sum();
            Some((gains / self.period as f64, losses / self.period as f64))
        }));
        results
    }

    /// Marks positions whose window saw no price movement at all. RSI still
    /// reports 100 there, but it carries no momentum information.
    pub fn stalled(&self, closes: &[f64]) -> Vec<bool> {
        self.averages(closes)
            .into_iter()
            .map(|avg| matches!(avg, Some((gain, loss)) if gain == 0.0 && loss == 0.0))
            .collect()
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

impl IndicatorCalculator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, closes: &[f64]) -> Vec<Option<f64>> {
        self.averages(closes)
            .into_iter()
            .map(|avg| avg.map(|(gain, loss)| rsi_value(gain, loss)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_calculation() {
        let closes = [
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03, 45.61, 46.28, 46.28,
            46.00, 46.03, 46.41, 46.22, 45.64, 46.25,
        ];
        let results = Rsi::new(14).calculate(&closes);
        assert_eq!(results.len(), closes.len());

        for (i, value) in results.iter().enumerate().take(14) {
            assert_eq!(*value, None, "Expected None at index {}", i);
        }
        // First value uses the same simple averages as the usual seed: ~70.5
        let first = results[14].unwrap();
        assert!(first > 65.0 && first < 75.0, "RSI[14] out of expected range: {}", first);

        for value in results.iter().flatten() {
            assert!((0.0..=100.0).contains(value));
        }
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let rsi = Rsi::new(14);
        assert_eq!(rsi.calculate(&[1.0; 10]), vec![None; 10]);
        // exactly `period` closes is still one delta short
        assert_eq!(rsi.calculate(&[1.0; 14]), vec![None; 14]);
    }

    #[test]
    fn test_rsi_all_gains() {
        let closes: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let results = Rsi::new(14).calculate(&closes);
        for value in results.iter().take(14) {
            assert_eq!(*value, None);
        }
        for value in results.iter().skip(14) {
            assert_eq!(*value, Some(100.0));
        }
    }

    #[test]
    fn test_rsi_all_losses() {
        let closes: Vec<f64> = (1..=20).map(|i| 20.0 - i as f64).collect();
        let results = Rsi::new(14).calculate(&closes);
        for value in results.iter().skip(14) {
            assert_eq!(*value, Some(0.0));
        }
    }

    #[test]
    fn test_rsi_flat_window_is_100_and_stalled() {
        let closes = [50.0; 20];
        let rsi = Rsi::new(14);
        let results = rsi.calculate(&closes);
        let stalled = rsi.stalled(&closes);
        assert_eq!(results[19], Some(100.0));
        assert!(stalled[19]);
        assert!(!stalled[0]);
    }

    #[test]
    fn test_rsi_rolling_window_forgets_old_losses() {
        // one early drop, then only gains: once the drop leaves the window
        // RSI returns to 100
        let mut closes = vec![10.0, 9.0];
        closes.extend((1..=10).map(|i| 9.0 + i as f64));
        let results = Rsi::new(3).calculate(&closes);
        assert!(results[3].unwrap() < 100.0);
        assert_eq!(results[4], Some(100.0));
        assert!(!Rsi::new(3).stalled(&closes)[4]);
    }
}
