// Technical indicators module
pub mod bollinger;
pub mod ema;
pub mod engine;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use bollinger::{BollingerBands, BollingerOutput};
pub use ema::Ema;
pub use engine::{IndicatorEngine, IndicatorSet, IndicatorSettings};
pub use macd::{Macd, MacdOutput};
pub use rsi::Rsi;
pub use sma::Sma;

use serde_json::Value;

/// Common trait for single-output indicators over a closing-price column.
///
/// Output is index-aligned with the input; `None` marks positions where the
/// lookback is not yet satisfied. Implementations never emit NaN.
pub trait IndicatorCalculator: Send + Sync {
    fn name(&self) -> &str;
    fn parameters(&self) -> Value;
    fn calculate(&self, closes: &[f64]) -> Vec<Option<f64>>;
}
