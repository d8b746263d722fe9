// Ordered price history for one instrument and timeframe.
use crate::error::EngineError;
use shared::models::{Candle, PriceLevels, TimeFrame};

/// Bars used for the near support/resistance pair.
pub const NEAR_LEVEL_WINDOW: usize = 7;
/// Bars used for the far support/resistance pair.
pub const FAR_LEVEL_WINDOW: usize = 14;

/// Candles strictly increasing by timestamp, no duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    instrument: String,
    timeframe: TimeFrame,
    candles: Vec<Candle>,
}

impl PriceSeries {
    /// Builds a series, rejecting out-of-order or duplicated timestamps.
    pub fn new(instrument: &str, timeframe: TimeFrame, candles: Vec<Candle>) -> Result<Self, EngineError> {
        if let Some(pos) = candles
            .windows(2)
            .position(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(EngineError::MarketDataError(format!(
                "series for '{}' ({}) is not strictly increasing at index {}",
                instrument,
                timeframe,
                pos + 1
            )));
        }
        Ok(Self {
            instrument: instrument.to_string(),
            timeframe,
            candles,
        })
    }

    /// Sorts raw feed output and drops repeated timestamps (first one wins).
    pub fn from_unsorted(instrument: &str, timeframe: TimeFrame, mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.timestamp);
        candles.dedup_by_key(|c| c.timestamp);
        Self {
            instrument: instrument.to_string(),
            timeframe,
            candles,
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn timeframe(&self) -> TimeFrame {
        self.timeframe
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// The most recent `n` candles (all of them if the series is shorter).
    pub fn tail(&self, n: usize) -> &[Candle] {
        &self.candles[self.candles.len().saturating_sub(n)..]
    }

    /// Current price and recent extremes, derived the same way from any
    /// timeframe (the default provider feeds it daily bars).
    pub fn price_levels(&self) -> Result<PriceLevels, EngineError> {
        let latest = self.last().ok_or_else(|| {
            EngineError::MarketDataError(format!("no candles for '{}' to derive price levels", self.instrument))
        })?;
        if !latest.close.is_finite() || latest.close <= 0.0 {
            return Err(EngineError::MarketDataError(format!(
                "invalid current price {} for '{}'",
                latest.close, self.instrument
            )));
        }

        let lowest = |window: &[Candle]| window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        let highest = |window: &[Candle]| window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);

        Ok(PriceLevels {
            current_price: latest.close,
            support_1: lowest(self.tail(NEAR_LEVEL_WINDOW)),
            support_2: lowest(self.tail(FAR_LEVEL_WINDOW)),
            resistance_1: highest(self.tail(NEAR_LEVEL_WINDOW)),
            resistance_2: highest(self.tail(FAR_LEVEL_WINDOW)),
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use shared::models::{Candle, TimeFrame};

    use super::PriceSeries;

    pub fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    pub fn candle_at(index: i64, close: f64) -> Candle {
        Candle {
            timestamp: base_time() + Duration::hours(index),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10.0,
        }
    }

    pub fn series_from_closes(instrument: &str, closes: &[f64]) -> PriceSeries {
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, close)| candle_at(i as i64, *close))
            .collect();
        PriceSeries::new(instrument, TimeFrame::Hour1, candles).unwrap()
    }
}
