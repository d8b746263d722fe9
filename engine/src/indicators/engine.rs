// Computes the full indicator set for a price series from explicit settings.
use super::{BollingerBands, Ema, IndicatorCalculator, Macd, Rsi, Sma};
use crate::error::EngineError;
use crate::models::PriceSeries;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use shared::models::IndicatorSnapshot;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct IndicatorSettings {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub sma_short: usize,
    pub sma_long: usize,
    pub ema_period: usize,
    pub bb_period: usize,
    pub bb_k: f64,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        IndicatorSettings {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            sma_short: 20,
            sma_long: 50,
            ema_period: 20,
            bb_period: 20,
            bb_k: 2.0,
        }
    }
}

impl IndicatorSettings {
    pub fn validate(&self) -> Result<(), EngineError> {
        let periods = [
            ("rsi_period", self.rsi_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("sma_short", self.sma_short),
            ("sma_long", self.sma_long),
            ("ema_period", self.ema_period),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, period)| *period == 0) {
            return Err(EngineError::IndicatorError(format!("{} must be at least 1", name)));
        }
        if self.bb_period < 2 {
            return Err(EngineError::IndicatorError(format!(
                "bb_period must be at least 2, got {}",
                self.bb_period
            )));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(EngineError::IndicatorError(format!(
                "macd_fast ({}) must be shorter than macd_slow ({})",
                self.macd_fast, self.macd_slow
            )));
        }
        if !(self.bb_k.is_finite() && self.bb_k > 0.0) {
            return Err(EngineError::IndicatorError(format!("bb_k must be positive, got {}", self.bb_k)));
        }
        Ok(())
    }
}

/// Index-aligned indicator columns for one series. `None` = not ready.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub timestamps: Vec<DateTime<Utc>>,
    pub close: Vec<f64>,
    pub rsi: Vec<Option<f64>>,
    /// RSI windows with neither gains nor losses.
    pub rsi_stalled: Vec<bool>,
    pub macd: Vec<Option<f64>>,
    pub macd_signal: Vec<Option<f64>>,
    pub macd_hist: Vec<Option<f64>>,
    pub sma_short: Vec<Option<f64>>,
    pub sma_long: Vec<Option<f64>>,
    pub ema: Vec<Option<f64>>,
    pub bb_upper: Vec<Option<f64>>,
    pub bb_middle: Vec<Option<f64>>,
    pub bb_lower: Vec<Option<f64>>,
}

impl IndicatorSet {
    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    pub fn snapshot_at(&self, index: usize) -> Option<IndicatorSnapshot> {
        if index >= self.len() {
            return None;
        }
        Some(IndicatorSnapshot {
            timestamp: self.timestamps.get(index).copied(),
            close: Some(self.close[index]),
            rsi: self.rsi[index],
            macd: self.macd[index],
            macd_signal: self.macd_signal[index],
            macd_hist: self.macd_hist[index],
            sma_short: self.sma_short[index],
            sma_long: self.sma_long[index],
            ema: self.ema[index],
            bb_upper: self.bb_upper[index],
            bb_middle: self.bb_middle[index],
            bb_lower: self.bb_lower[index],
        })
    }

    pub fn latest_snapshot(&self) -> Option<IndicatorSnapshot> {
        self.len().checked_sub(1).and_then(|i| self.snapshot_at(i))
    }
}

pub struct IndicatorEngine {
    settings: IndicatorSettings,
    rsi: Rsi,
    macd: Macd,
    sma_short: Sma,
    sma_long: Sma,
    ema: Ema,
    bollinger: BollingerBands,
}

impl IndicatorEngine {
    pub fn new(settings: IndicatorSettings) -> Result<Self, EngineError> {
        settings.validate()?;
        Ok(Self {
            rsi: Rsi::new(settings.rsi_period),
            macd: Macd::new(settings.macd_fast, settings.macd_slow, settings.macd_signal),
            sma_short: Sma::new(settings.sma_short),
            sma_long: Sma::new(settings.sma_long),
            ema: Ema::new(settings.ema_period),
            bollinger: BollingerBands::new(settings.bb_period, settings.bb_k),
            settings,
        })
    }

    /// Shortest series for which every indicator is ready at the last bar.
    pub fn required_history(&self) -> usize {
        let s = &self.settings;
        [s.rsi_period.saturating_add(1), s.macd_slow, s.sma_short, s.sma_long, s.ema_period, s.bb_period]
            .into_iter()
            .max()
            .unwrap_or(0)
    }

    pub fn parameters(&self) -> Value {
        serde_json::json!({
            "rsi": { "name": self.rsi.name(), "params": self.rsi.parameters() },
            "macd": { "name": self.macd.name(), "params": self.macd.parameters() },
            "sma_short": { "name": self.sma_short.name(), "params": self.sma_short.parameters() },
            "sma_long": { "name": self.sma_long.name(), "params": self.sma_long.parameters() },
            "ema": { "name": self.ema.name(), "params": self.ema.parameters() },
            "bollinger": { "name": self.bollinger.name(), "params": self.bollinger.parameters() },
        })
    }

    pub fn compute(&self, series: &PriceSeries) -> IndicatorSet {
        let closes = series.closes();
        if series.len() < self.required_history() {
            tracing::debug!(
                instrument = %series.instrument(),
                len = series.len(),
                required = self.required_history(),
                "Series shorter than the longest lookback; some indicators are not ready"
            );
        }

        let macd = self.macd.calculate(&closes);
        let bands = self.bollinger.calculate(&closes);

        IndicatorSet {
            timestamps: series.candles().iter().map(|c| c.timestamp).collect(),
            rsi: self.rsi.calculate(&closes),
            rsi_stalled: self.rsi.stalled(&closes),
            macd: macd.macd,
            macd_signal: macd.signal,
            macd_hist: macd.histogram,
            sma_short: self.sma_short.calculate(&closes),
            sma_long: self.sma_long.calculate(&closes),
            ema: self.ema.calculate(&closes),
            bb_upper: bands.upper,
            bb_middle: bands.middle,
            bb_lower: bands.lower,
            close: closes,
        }
    }
}
