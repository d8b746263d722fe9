// Simple Moving Average (SMA) indicator implementation
use super::IndicatorCalculator;
use serde_json::Value;

pub struct Sma {
    name: String,
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("SMA({})", period),
            period,
        }
    }
}

impl IndicatorCalculator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, closes: &[f64]) -> Vec<Option<f64>> {
        if self.period == 0 || closes.len() < self.period {
            return vec![None; closes.len()];
        }

        let mut results = vec![None; self.period - 1];
        // Each window is summed on its own so constant input stays exact.
        results.extend(
            closes
                .windows(self.period)
                .map(|window| Some(window.iter().sum::<f64>() / self.period as f64)),
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_option_vec_eq(a: &[Option<f64>], b: &[Option<f64>]) {
        assert_eq!(a.len(), b.len(), "Vectors differ in length");
        for (i, (val_a, val_b)) in a.iter().zip(b.iter()).enumerate() {
            match (val_a, val_b) {
                (None, None) => {}
                (Some(x), Some(y)) => assert!((x - y).abs() < 1e-9, "Mismatch at index {}: {} != {}", i, x, y),
                _ => panic!("Mismatch at index {}: {:?} != {:?}", i, val_a, val_b),
            }
        }
    }

    #[test]
    fn test_sma_calculation() {
        let sma = Sma::new(3);
        let results = sma.calculate(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_option_vec_eq(&results, &[None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_sma_insufficient_data() {
        let sma = Sma::new(3);
        assert_eq!(sma.calculate(&[1.0, 2.0]), vec![None, None]);
    }

    #[test]
    fn test_sma_period_one() {
        let sma = Sma::new(1);
        assert_option_vec_eq(&sma.calculate(&[1.0, 2.0, 3.0]), &[Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_sma_empty_data() {
        let sma = Sma::new(3);
        assert!(sma.calculate(&[]).is_empty());
    }

    #[test]
    fn test_sma_period_zero_is_never_ready() {
        let sma = Sma::new(0);
        assert_eq!(sma.calculate(&[1.0, 2.0]), vec![None, None]);
        assert_eq!(sma.parameters(), serde_json::json!({ "period": 0 }));
    }
}
