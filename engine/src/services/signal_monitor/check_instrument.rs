// One instrument's pass through the pipeline:
// fetch -> indicators -> votes -> aggregate -> cooldown -> notify + record.
use chrono::Utc;
use shared::models::Recommendation;
use std::sync::Arc;

use super::MonitorOptions;
use crate::error::EngineError;
use crate::indicators::IndicatorEngine;
use crate::services::providers::{MarketDataProvider, NotificationSink, SentimentProvider, SignalRecorder};
use crate::signals::{CooldownTracker, Reservation, SignalAggregator, VoteExtractor};

#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// Notified and recorded.
    Emitted(Recommendation),
    /// A recommendation was built but the instrument is still cooling down.
    CooldownBlocked,
    /// Votes did not clear the threshold (or there were none).
    NoSignal,
    /// Market data was unavailable this cycle.
    Skipped(String),
}

/// Everything a cycle needs to evaluate an instrument. Shared by all the
/// instrument tasks of a cycle.
pub struct InstrumentChecker {
    pub(crate) market_data: Arc<dyn MarketDataProvider>,
    pub(crate) sentiment: Option<Arc<dyn SentimentProvider>>,
    pub(crate) notifier: Arc<dyn NotificationSink>,
    pub(crate) recorder: Arc<dyn SignalRecorder>,
    pub(crate) indicators: IndicatorEngine,
    pub(crate) votes: VoteExtractor,
    pub(crate) aggregator: SignalAggregator,
    pub(crate) cooldown: Arc<CooldownTracker>,
    pub(crate) options: MonitorOptions,
}

impl InstrumentChecker {
    pub async fn check(&self, instrument: &str) -> Result<CheckOutcome, EngineError> {
        let series = match self
            .market_data
            .fetch_series(instrument, self.options.timeframe, self.options.series_limit)
            .await
        {
            Ok(series) if !series.is_empty() => series,
            Ok(_) => return Ok(CheckOutcome::Skipped("empty price series".to_string())),
            Err(e) if e.is_data_unavailable() => {
                tracing::warn!(instrument = %instrument, error = %e, "Price series unavailable, skipping this cycle");
                return Ok(CheckOutcome::Skipped(e.to_string()));
            }
            Err(e) => return Err(e),
        };

        let levels = match self.market_data.fetch_levels(instrument).await {
            Ok(levels) => levels,
            Err(e) if e.is_data_unavailable() => {
                tracing::warn!(instrument = %instrument, error = %e, "Price levels unavailable, skipping this cycle");
                return Ok(CheckOutcome::Skipped(e.to_string()));
            }
            Err(e) => return Err(e),
        };

        let indicators = self.indicators.compute(&series);
        let votes = self.votes.extract(&indicators);
        tracing::debug!(
            instrument = %instrument,
            bars = series.len(),
            votes = ?votes,
            current_price = levels.current_price,
            support_1 = levels.support_1,
            resistance_1 = levels.resistance_1,
            "Votes extracted"
        );

        let sentiment = match (&self.sentiment, self.options.enable_sentiment) {
            (Some(provider), true) => provider.sentiment(instrument).await,
            _ => None,
        };

        let Some(recommendation) = self
            .aggregator
            .evaluate(instrument, &votes, &levels, sentiment, Utc::now())
        else {
            return Ok(CheckOutcome::NoSignal);
        };

        let snapshot = indicators.latest_snapshot().ok_or_else(|| {
            EngineError::ProcessingError(format!("no indicator snapshot for '{}'", instrument))
        })?;

        match self
            .cooldown
            .try_reserve(instrument, recommendation.generated_at, self.options.cooldown)
        {
            Reservation::Allowed => {}
            Reservation::Blocked { remaining } => {
                tracing::info!(
                    instrument = %instrument,
                    direction = %recommendation.direction,
                    remaining_secs = remaining.as_secs(),
                    "Signal suppressed by cooldown"
                );
                return Ok(CheckOutcome::CooldownBlocked);
            }
        }

        self.notifier.notify(&recommendation, &snapshot).await;
        if let Err(e) = self.recorder.record(&recommendation, &snapshot).await {
            tracing::error!(instrument = %instrument, id = %recommendation.id, error = %e, "Failed to record signal");
        }

        tracing::info!(
            instrument = %instrument,
            id = %recommendation.id,
            direction = %recommendation.direction,
            entry = recommendation.entry,
            stop_loss = recommendation.stop_loss,
            "Signal emitted"
        );
        Ok(CheckOutcome::Emitted(recommendation))
    }
}
