// Exponential Moving Average (EMA) indicator implementation
use super::IndicatorCalculator;
use serde_json::Value;

/// EMA with span-style smoothing, `alpha = 2 / (period + 1)`.
///
/// Output starts at the first defined input. Each value is the
/// exponentially weighted mean of the prefix seen so far, normalised by the
/// sum of the weights, so early values lean on a short warm-up instead of
/// waiting for `period` bars behind an SMA seed.
pub struct Ema {
    name: String,
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("EMA({})", period),
            period,
        }
    }

    fn decay(&self) -> f64 {
        1.0 - 2.0 / (self.period as f64 + 1.0)
    }

    /// Applies the EMA to a series that may itself have leading gaps, such as
    /// another indicator's output. Gaps produce `None` and do not advance the
    /// weights.
    pub fn apply(&self, values: &[Option<f64>]) -> Vec<Option<f64>> {
        if self.period == 0 {
            return vec![None; values.len()];
        }

        let decay = self.decay();
        let mut weight_sum = 0.0;
        let mut previous: Option<f64> = None;

        values
            .iter()
            .map(|value| {
                let x = (*value)?;
                weight_sum = 1.0 + decay * weight_sum;
                let ema = match previous {
                    Some(prev) => prev + (x - prev) / weight_sum,
                    None => x,
                };
                previous = Some(ema);
                Some(ema)
            })
            .collect()
    }
}

impl IndicatorCalculator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period, "seeding": "adjusted-prefix" })
    }

    fn calculate(&self, closes: &[f64]) -> Vec<Option<f64>> {
        let values: Vec<Option<f64>> = closes.iter().copied().map(Some).collect();
        self.apply(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ema_calculation() {
        // Period 3 -> alpha 0.5, decay 0.5.
        // y0 = 10
        // y1 = (11 + 0.5*10) / 1.5 = 10.666..
        // y2 = (12 + 0.5*11 + 0.25*10) / 1.75 = 11.428571..
        let ema = Ema::new(3);
        let results = ema.calculate(&[10.0, 11.0, 12.0]);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], Some(10.0));
        assert!((results[1].unwrap() - 16.0 / 1.5).abs() < 1e-12);
        assert!((results[2].unwrap() - 20.0 / 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_ema_constant_input_is_exact() {
        let ema = Ema::new(12);
        let results = ema.calculate(&[42.5; 40]);
        assert!(results.iter().all(|v| *v == Some(42.5)));
    }

    #[test]
    fn test_ema_converges_to_standard_recursion() {
        // Once the weight sum saturates the update matches alpha smoothing.
        let ema = Ema::new(5);
        let closes: Vec<f64> = (0..200).map(|i| (i as f64 * 0.3).sin() * 10.0 + 100.0).collect();
        let results = ema.calculate(&closes);
        let alpha = 2.0 / 6.0;
        let prev = results[198].unwrap();
        let expected = prev + alpha * (closes[199] - prev);
        assert!((results[199].unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_ema_apply_skips_leading_gaps() {
        let ema = Ema::new(3);
        let results = ema.apply(&[None, None, Some(4.0), Some(6.0)]);
        assert_eq!(results[0], None);
        assert_eq!(results[1], None);
        assert_eq!(results[2], Some(4.0));
        assert!((results[3].unwrap() - (6.0 + 0.5 * 4.0) / 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_ema_empty_and_zero_period() {
        assert!(Ema::new(3).calculate(&[]).is_empty());
        assert_eq!(Ema::new(0).calculate(&[1.0, 2.0]), vec![None, None]);
    }
}
