use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("CSV parsing system error: {source}")]
    CsvSystemError {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("JSON error: {source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },

    #[error("CSV data format error: {0}")]
    CsvDataFormatError(String),

    #[error("Market data error: {0}")]
    MarketDataError(String),

    #[error("Indicator calculation error: {0}")]
    IndicatorError(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Internal processing error: {0}")]
    ProcessingError(String),

    // Catch-all for anyhow errors coming out of parsing helpers.
    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),
}

impl EngineError {
    /// Data-unavailable errors are an expected outcome: the instrument is
    /// skipped for the cycle rather than counted as a failure.
    pub fn is_data_unavailable(&self) -> bool {
        matches!(
            self,
            EngineError::MarketDataError(_)
                | EngineError::CsvSystemError { .. }
                | EngineError::CsvDataFormatError(_)
                | EngineError::IoError { .. }
        )
    }
}
