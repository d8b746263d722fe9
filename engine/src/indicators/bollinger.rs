// Bollinger Bands: SMA envelope at +/- k sample standard deviations
use super::{IndicatorCalculator, Sma};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerOutput {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

pub struct BollingerBands {
    sma: Sma,
    period: usize,
    k: f64,
}

impl BollingerBands {
    pub fn new(period: usize, k: f64) -> Self {
        Self {
            sma: Sma::new(period),
            period,
            k,
        }
    }

    pub fn name(&self) -> String {
        format!("BB({},{})", self.period, self.k)
    }

    pub fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period, "k": self.k })
    }

    pub fn calculate(&self, closes: &[f64]) -> BollingerOutput {
        let middle = self.sma.calculate(closes);
        let deviation = self.rolling_std(closes);

        let (upper, lower): (Vec<Option<f64>>, Vec<Option<f64>>) = middle
            .iter()
            .zip(&deviation)
            .map(|(m, sd)| match (m, sd) {
                (Some(m), Some(sd)) => (Some(m + self.k * sd), Some(m - self.k * sd)),
                _ => (None, None),
            })
            .unzip();

        BollingerOutput { upper, middle, lower }
    }

    // Sample standard deviation (n - 1); needs at least two points.
    fn rolling_std(&self, closes: &[f64]) -> Vec<Option<f64>> {
        if self.period < 2 || closes.len() < self.period {
            return vec![None; closes.len()];
        }

        let n = self.period as f64;
        let mut results = vec![None; self.period - 1];
        results.extend(closes.windows(self.period).map(|window| {
            let mean = window.iter().sum::<f64>() / n;
            let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
            Some(variance.sqrt())
        }));
        results
    }
}
