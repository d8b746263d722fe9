// In-memory candle store keyed by instrument and timeframe.
use async_trait::async_trait;
use shared::models::{Candle, TimeFrame};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::EngineError;
use crate::models::PriceSeries;
use crate::services::providers::MarketDataProvider;

#[derive(Debug, Default)]
pub struct MarketDataStore {
    data: HashMap<String, HashMap<TimeFrame, Vec<Candle>>>,
}

impl MarketDataStore {
    pub fn new() -> Self {
        MarketDataStore { data: HashMap::new() }
    }

    /// Merges new candles in; the result stays sorted with one candle per
    /// timestamp (the newest write wins).
    pub fn add_candles(&mut self, instrument: &str, timeframe: TimeFrame, new_candles: Vec<Candle>) {
        let timeframe_data = self
            .data
            .entry(instrument.to_string())
            .or_default()
            .entry(timeframe)
            .or_default();

        // New candles go first so dedup keeps them over stale copies.
        let mut merged = new_candles;
        merged.append(timeframe_data);
        merged.sort_by_key(|c| c.timestamp);
        merged.dedup_by_key(|c| c.timestamp);
        *timeframe_data = merged;
    }

    /// The most recent `limit` candles, or `None` when nothing is stored.
    pub fn latest(&self, instrument: &str, timeframe: TimeFrame, limit: usize) -> Option<PriceSeries> {
        let candles = self.data.get(instrument)?.get(&timeframe)?;
        let start = candles.len().saturating_sub(limit);
        PriceSeries::new(instrument, timeframe, candles[start..].to_vec()).ok()
    }

    pub fn instruments(&self) -> Vec<String> {
        let mut names: Vec<String> = self.data.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn clear(&mut self, instrument: &str) {
        self.data.remove(instrument);
    }
}

#[async_trait]
impl MarketDataProvider for RwLock<MarketDataStore> {
    async fn fetch_series(&self, instrument: &str, timeframe: TimeFrame, limit: usize) -> Result<PriceSeries, EngineError> {
        let store = self.read().await;
        store.latest(instrument, timeframe, limit).ok_or_else(|| {
            EngineError::MarketDataError(format!(
                "No candle data found for instrument '{}' and timeframe {}",
                instrument, timeframe
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::series::test_support::candle_at;
    use std::sync::Arc;

    #[test]
    fn test_add_candles_sorts_and_dedups() {
        let mut store = MarketDataStore::new();
        store.add_candles("BTC/USDT", TimeFrame::Hour1, vec![candle_at(2, 3.0), candle_at(0, 1.0)]);
        store.add_candles("BTC/USDT", TimeFrame::Hour1, vec![candle_at(1, 2.0), candle_at(2, 30.0)]);

        let series = store.latest("BTC/USDT", TimeFrame::Hour1, 10).unwrap();
        assert_eq!(series.closes(), vec![1.0, 2.0, 30.0]);
    }

    #[test]
    fn test_latest_respects_limit_and_timeframe() {
        let mut store = MarketDataStore::new();
        store.add_candles("ETH/USDT", TimeFrame::Hour1, (0..10).map(|i| candle_at(i, i as f64)).collect());

        let series = store.latest("ETH/USDT", TimeFrame::Hour1, 3).unwrap();
        assert_eq!(series.closes(), vec![7.0, 8.0, 9.0]);
        assert!(store.latest("ETH/USDT", TimeFrame::Day1, 3).is_none());
        assert!(store.latest("XRP/USDT", TimeFrame::Hour1, 3).is_none());
        assert_eq!(store.instruments(), vec!["ETH/USDT".to_string()]);

        store.clear("ETH/USDT");
        assert!(store.instruments().is_empty());
    }

    #[tokio::test]
    async fn test_provider_reports_missing_data() {
        let store = Arc::new(RwLock::new(MarketDataStore::new()));
        let err = store.fetch_series("BTC/USDT", TimeFrame::Hour1, 100).await.unwrap_err();
        assert!(err.is_data_unavailable());
        assert!(err.to_string().contains("No candle data found"));
    }

    #[tokio::test]
    async fn test_provider_derives_levels_from_daily_bars() {
        let store = RwLock::new(MarketDataStore::new());
        store
            .write()
            .await
            .add_candles("BTC/USDT", TimeFrame::Day1, (0..40).map(|i| candle_at(i * 24, 100.0 + i as f64)).collect());

        let levels = store.fetch_levels("BTC/USDT").await.unwrap();
        assert_eq!(levels.current_price, 139.0);
        assert_eq!(levels.resistance_1, 140.0);
        assert_eq!(levels.support_2, 125.0);
    }
}
