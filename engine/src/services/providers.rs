// Contracts for the collaborators the monitor drives: market data, sentiment,
// notification, persistence and the instrument list.
use async_trait::async_trait;
use shared::models::{IndicatorSnapshot, PriceLevels, Recommendation, TimeFrame};

use crate::error::EngineError;
use crate::models::PriceSeries;

/// Daily bars requested when deriving support/resistance levels.
pub const LEVELS_LOOKBACK_DAYS: usize = 30;

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Latest `limit` bars for an instrument, oldest first. Retries, if any,
    /// belong to the implementation.
    async fn fetch_series(&self, instrument: &str, timeframe: TimeFrame, limit: usize) -> Result<PriceSeries, EngineError>;

    /// Current price and recent extremes, from daily bars by default.
    async fn fetch_levels(&self, instrument: &str) -> Result<PriceLevels, EngineError> {
        let daily = self.fetch_series(instrument, TimeFrame::Day1, LEVELS_LOOKBACK_DAYS).await?;
        daily.price_levels()
    }
}

#[async_trait]
pub trait SentimentProvider: Send + Sync {
    /// Signed score; positive is bullish. `None` when nothing is known.
    async fn sentiment(&self, instrument: &str) -> Option<f64>;
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Fire-and-forget: delivery problems are handled (and logged) inside.
    async fn notify(&self, recommendation: &Recommendation, snapshot: &IndicatorSnapshot);
}

#[async_trait]
pub trait SignalRecorder: Send + Sync {
    async fn record(&self, recommendation: &Recommendation, snapshot: &IndicatorSnapshot) -> Result<(), EngineError>;
}

#[async_trait]
pub trait InstrumentSource: Send + Sync {
    async fn instruments(&self) -> Result<Vec<String>, EngineError>;
}

/// A fixed instrument list, usually straight from settings.
#[derive(Debug, Clone, Default)]
pub struct StaticInstruments(pub Vec<String>);

#[async_trait]
impl InstrumentSource for StaticInstruments {
    async fn instruments(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.0.clone())
    }
}
