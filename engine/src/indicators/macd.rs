// Moving Average Convergence Divergence (MACD)
use super::{Ema, IndicatorCalculator};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdOutput {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
    periods: (usize, usize, usize),
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            fast: Ema::new(fast),
            slow: Ema::new(slow),
            signal: Ema::new(signal),
            periods: (fast, slow, signal),
        }
    }

    pub fn name(&self) -> String {
        let (fast, slow, signal) = self.periods;
        format!("MACD({},{},{})", fast, slow, signal)
    }

    pub fn parameters(&self) -> Value {
        let (fast, slow, signal) = self.periods;
        serde_json::json!({ "fast": fast, "slow": slow, "signal": signal })
    }

    pub fn calculate(&self, closes: &[f64]) -> MacdOutput {
        let fast = self.fast.calculate(closes);
        let slow = self.slow.calculate(closes);

        let macd: Vec<Option<f64>> = fast
            .iter()
            .zip(&slow)
            .map(|(f, s)| Some((*f)? - (*s)?))
            .collect();
        let signal = self.signal.apply(&macd);
        let histogram = macd
            .iter()
            .zip(&signal)
            .map(|(m, s)| Some((*m)? - (*s)?))
            .collect();

        MacdOutput { macd, signal, histogram }
    }
}
