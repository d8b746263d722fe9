// News sentiment from a CSV of headlines scored by an external analyzer.
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::providers::SentimentProvider;
use crate::error::EngineError;

/// One scored headline.
///
/// CSV Header: instrument,published_at,polarity
/// Example Row: BTC/USDT,2024-05-01T08:00:00Z,0.35
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoredHeadline {
    pub instrument: String,
    pub published_at: DateTime<Utc>,
    /// Headline polarity in [-1, 1].
    pub polarity: f64,
}

/// Averages the polarity of an instrument's headlines published within the
/// look-back window. The file is re-read on every query.
#[derive(Debug, Clone)]
pub struct CsvSentimentFeed {
    path: PathBuf,
    window: Duration,
}

impl CsvSentimentFeed {
    pub fn new(path: impl Into<PathBuf>, window_hours: u64) -> Self {
        let hours = i64::try_from(window_hours).unwrap_or(i64::MAX);
        Self {
            path: path.into(),
            window: Duration::try_hours(hours).unwrap_or(Duration::MAX),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_headlines(path: &Path) -> Result<Vec<ScoredHeadline>, EngineError> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_path(path)?;
        let mut headlines = Vec::new();
        for (idx, row) in reader.deserialize::<ScoredHeadline>().enumerate() {
            let headline = row?;
            if !(-1.0..=1.0).contains(&headline.polarity) {
                return Err(EngineError::CsvDataFormatError(format!(
                    "polarity {} outside [-1, 1] at line {} of {}",
                    headline.polarity,
                    idx + 2,
                    path.display()
                )));
            }
            headlines.push(headline);
        }
        Ok(headlines)
    }

    /// Mean polarity of the instrument's headlines in `(now - window, now]`;
    /// `None` when there are none.
    pub async fn average_polarity(&self, instrument: &str, now: DateTime<Utc>) -> Result<Option<f64>, EngineError> {
        let path = self.path.clone();
        let headlines = tokio::task::spawn_blocking(move || Self::load_headlines(&path))
            .await
            .map_err(|e| EngineError::ProcessingError(format!("Sentiment reader task failed: {}", e)))??;

        // A window reaching past the start of time has no lower bound.
        let since = now.checked_sub_signed(self.window);
        let recent: Vec<f64> = headlines
            .iter()
            .filter(|h| h.instrument == instrument && h.published_at <= now)
            .filter(|h| since.map_or(true, |since| h.published_at > since))
            .map(|h| h.polarity)
            .collect();

        if recent.is_empty() {
            return Ok(None);
        }
        Ok(Some(recent.iter().sum::<f64>() / recent.len() as f64))
    }
}

#[async_trait]
impl SentimentProvider for CsvSentimentFeed {
    async fn sentiment(&self, instrument: &str) -> Option<f64> {
        match self.average_polarity(instrument, Utc::now()).await {
            Ok(score) => {
                tracing::debug!(instrument = %instrument, score = ?score, "News sentiment");
                score
            }
            Err(e) => {
                tracing::warn!(instrument = %instrument, path = %self.path.display(), error = %e, "News sentiment unavailable");
                None
            }
        }
    }
}
