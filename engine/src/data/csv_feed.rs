// Market data read from per-instrument OHLCV files that an external
// collector keeps up to date.
use async_trait::async_trait;
use shared::models::TimeFrame;
use shared::utils::sanitize_instrument;
use std::path::PathBuf;

use super::csv_parser::OhlcvCsvParser;
use crate::error::EngineError;
use crate::models::PriceSeries;
use crate::services::providers::MarketDataProvider;

/// Reads `<data_dir>/<INSTRUMENT>_<timeframe>.csv` on every fetch, e.g.
/// `data/BTC_USDT_1h.csv`.
#[derive(Debug, Clone)]
pub struct CsvMarketFeed {
    data_dir: PathBuf,
}

impl CsvMarketFeed {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    pub fn path_for(&self, instrument: &str, timeframe: TimeFrame) -> PathBuf {
        self.data_dir
            .join(format!("{}_{}.csv", sanitize_instrument(instrument), timeframe.as_str()))
    }
}

#[async_trait]
impl MarketDataProvider for CsvMarketFeed {
    async fn fetch_series(&self, instrument: &str, timeframe: TimeFrame, limit: usize) -> Result<PriceSeries, EngineError> {
        let path = self.path_for(instrument, timeframe);
        tracing::debug!(instrument = %instrument, path = %path.display(), "Reading OHLCV file");

        let candles = tokio::task::spawn_blocking(move || OhlcvCsvParser::load_candles_from_csv(&path))
            .await
            .map_err(|e| EngineError::ProcessingError(format!("CSV reader task failed: {}", e)))?
            .map_err(|e| EngineError::MarketDataError(format!("{:#}", e)))?;

        if candles.is_empty() {
            return Err(EngineError::MarketDataError(format!(
                "Feed for '{}' ({}) has no candles",
                instrument, timeframe
            )));
        }

        let mut series = PriceSeries::from_unsorted(instrument, timeframe, candles);
        if series.len() > limit {
            let keep = series.tail(limit).to_vec();
            series = PriceSeries::new(instrument, timeframe, keep)?;
        }
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_feed(dir: &TempDir, name: &str, rows: &[(i64, f64)]) {
        let mut content = String::from("timestamp,open,high,low,close,volume\n");
        for (ts, close) in rows {
            content.push_str(&format!("{},{},{},{},{},1\n", ts, close, close + 1.0, close - 1.0, close));
        }
        fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn test_path_for_sanitizes_instrument() {
        let feed = CsvMarketFeed::new("data");
        assert_eq!(feed.path_for("BTC/USDT", TimeFrame::Hour1), PathBuf::from("data/BTC_USDT_1h.csv"));
    }

    #[tokio::test]
    async fn test_fetch_series_sorts_and_limits() {
        let dir = TempDir::new().unwrap();
        write_feed(&dir, "BTC_USDT_1h.csv", &[(3_600_000, 2.0), (0, 1.0), (10_800_000, 4.0), (7_200_000, 3.0)]);

        let feed = CsvMarketFeed::new(dir.path());
        let series = feed.fetch_series("BTC/USDT", TimeFrame::Hour1, 3).await.unwrap();
        assert_eq!(series.closes(), vec![2.0, 3.0, 4.0]);
        assert_eq!(series.timeframe(), TimeFrame::Hour1);
    }

    #[tokio::test]
    async fn test_missing_or_empty_feed_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let feed = CsvMarketFeed::new(dir.path());
        let err = feed.fetch_series("ETH/USDT", TimeFrame::Hour1, 10).await.unwrap_err();
        assert!(err.is_data_unavailable());

        write_feed(&dir, "ETH_USDT_1h.csv", &[]);
        let err = feed.fetch_series("ETH/USDT", TimeFrame::Hour1, 10).await.unwrap_err();
        assert!(err.to_string().contains("has no candles"));
    }
}
