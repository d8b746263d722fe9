use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One OHLCV bar. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TimeFrame {
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "5m")]
    Minute5,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "30m")]
    Minute30,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1d")]
    Day1,
}

impl TimeFrame {
    /// Exchange-style label, also used in feed file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFrame::Minute1 => "1m",
            TimeFrame::Minute5 => "5m",
            TimeFrame::Minute15 => "15m",
            TimeFrame::Minute30 => "30m",
            TimeFrame::Hour1 => "1h",
            TimeFrame::Hour4 => "4h",
            TimeFrame::Day1 => "1d",
        }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => f.write_str("BUY"),
            Direction::Sell => f.write_str("SELL"),
        }
    }
}

/// A single rule's directional opinion for the current cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub source: String,
    pub rationale: String,
    pub direction: Direction,
}

impl Vote {
    pub fn new(source: &str, rationale: &str, direction: Direction) -> Self {
        Self {
            source: source.to_string(),
            rationale: rationale.to_string(),
            direction,
        }
    }
}

/// Current price plus recent support/resistance extremes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevels {
    pub current_price: f64,
    /// Lowest low over the last 7 bars.
    pub support_1: f64,
    /// Lowest low over the last 14 bars.
    pub support_2: f64,
    /// Highest high over the last 7 bars.
    pub resistance_1: f64,
    /// Highest high over the last 14 bars.
    pub resistance_2: f64,
}

/// Every indicator value at one point of a series. `None` means not ready.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub timestamp: Option<DateTime<Utc>>,
    pub close: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub ema: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
}

/// The aggregator's final, immutable output for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: Uuid,
    pub instrument: String,
    pub direction: Direction,
    pub entry: f64,
    pub targets: [f64; 3],
    pub stop_loss: f64,
    pub risk_reward: f64,
    pub sentiment: Option<f64>,
    pub generated_at: DateTime<Utc>,
}
