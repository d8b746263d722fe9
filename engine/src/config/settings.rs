// Engine settings, loaded from a JSON config file or the bundled defaults
use serde::Deserialize;
use shared::models::TimeFrame;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::EngineError;
use crate::indicators::{IndicatorEngine, IndicatorSettings};
use crate::services::{CsvSentimentFeed, MonitorOptions, SentimentProvider};
use crate::signals::{AggregatorSettings, VoteSettings};

const DEFAULT_CONFIG: &str = include_str!("../../config/default.json");

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    pub instruments: Vec<String>,
    pub timeframe: TimeFrame,
    pub series_limit: usize,
    pub poll_interval_secs: u64,
    pub error_backoff_secs: u64,
    pub cooldown_secs: u64,
    pub enable_sentiment: bool,
    /// Scored headlines (`instrument,published_at,polarity`), read when
    /// sentiment is enabled.
    pub sentiment_path: PathBuf,
    pub sentiment_window_hours: u64,
    pub indicators: IndicatorSettings,
    pub votes: VoteSettings,
    pub aggregator: AggregatorSettings,
    /// Directory holding `<INSTRUMENT>_<timeframe>.csv` files.
    pub data_dir: PathBuf,
    pub journal_path: PathBuf,
    pub log_level: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            instruments: vec!["BTC/USDT".to_string(), "ETH/USDT".to_string()],
            timeframe: TimeFrame::Hour1,
            series_limit: 100,
            poll_interval_secs: 300,
            error_backoff_secs: 60,
            cooldown_secs: 3600,
            enable_sentiment: false,
            sentiment_path: PathBuf::from("data/sentiment.csv"),
            sentiment_window_hours: 24,
            indicators: IndicatorSettings::default(),
            votes: VoteSettings::default(),
            aggregator: AggregatorSettings::default(),
            data_dir: PathBuf::from("data"),
            journal_path: PathBuf::from("data/signals.csv"),
            log_level: "info".to_string(),
        }
    }
}

impl EngineSettings {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| EngineError::ConfigError(format!("cannot read {}: {}", path.display(), e)))?;
        let settings = Self::from_json(&raw)?;
        tracing::debug!(path = %path.display(), "Loaded engine settings");
        Ok(settings)
    }

    /// Settings bundled with the binary.
    pub fn load_default() -> Result<Self, EngineError> {
        Self::from_json(DEFAULT_CONFIG)
    }

    pub fn from_json(raw: &str) -> Result<Self, EngineError> {
        let settings: EngineSettings = serde_json::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.instruments.is_empty() {
            return Err(EngineError::ConfigError("at least one instrument is required".to_string()));
        }
        if let Some(blank) = self.instruments.iter().find(|i| i.trim().is_empty()) {
            return Err(EngineError::ConfigError(format!("invalid instrument name '{}'", blank)));
        }
        if self.poll_interval_secs == 0 {
            return Err(EngineError::ConfigError("poll_interval_secs must be positive".to_string()));
        }
        if self.error_backoff_secs == 0 {
            return Err(EngineError::ConfigError("error_backoff_secs must be positive".to_string()));
        }
        if self.enable_sentiment && self.sentiment_window_hours == 0 {
            return Err(EngineError::ConfigError("sentiment_window_hours must be positive".to_string()));
        }
        if self.votes.rsi_oversold >= self.votes.rsi_overbought {
            return Err(EngineError::ConfigError(format!(
                "rsi_oversold ({}) must be below rsi_overbought ({})",
                self.votes.rsi_oversold, self.votes.rsi_overbought
            )));
        }
        tracing::Level::from_str(&self.log_level)
            .map_err(|_| EngineError::ConfigError(format!("unknown log level '{}'", self.log_level)))?;

        let engine = IndicatorEngine::new(self.indicators.clone())?;
        self.aggregator.validate()?;

        if self.series_limit < engine.required_history() {
            return Err(EngineError::ConfigError(format!(
                "series_limit ({}) is shorter than the {} bars the indicators need",
                self.series_limit,
                engine.required_history()
            )));
        }
        Ok(())
    }

    pub fn log_level(&self) -> tracing::Level {
        tracing::Level::from_str(&self.log_level).unwrap_or(tracing::Level::INFO)
    }

    /// The headline feed when sentiment is enabled, otherwise nothing.
    pub fn sentiment_provider(&self) -> Option<Arc<dyn SentimentProvider>> {
        if !self.enable_sentiment {
            return None;
        }
        Some(Arc::new(CsvSentimentFeed::new(
            self.sentiment_path.clone(),
            self.sentiment_window_hours,
        )))
    }

    pub fn monitor_options(&self) -> MonitorOptions {
        MonitorOptions {
            timeframe: self.timeframe,
            series_limit: self.series_limit,
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            error_backoff: Duration::from_secs(self.error_backoff_secs),
            cooldown: Duration::from_secs(self.cooldown_secs),
            enable_sentiment: self.enable_sentiment,
            indicators: self.indicators.clone(),
            votes: self.votes.clone(),
            aggregator: self.aggregator.clone(),
        }
    }
}
