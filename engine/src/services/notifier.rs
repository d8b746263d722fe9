// Notification sinks: a log-backed one and a channel for embedding callers.
use async_trait::async_trait;
use shared::models::{IndicatorSnapshot, Recommendation};
use shared::utils::format_price;
use tokio::sync::mpsc;

use super::providers::NotificationSink;

const PRICE_DECIMALS: usize = 8;

fn rsi_label(rsi: f64) -> &'static str {
    if rsi < 30.0 {
        "Oversold"
    } else if rsi > 70.0 {
        "Overbought"
    } else {
        "Neutral"
    }
}

/// Human-readable signal message.
pub fn format_signal_message(rec: &Recommendation, snapshot: &IndicatorSnapshot) -> String {
    let mut lines = vec![
        "Trading Signal".to_string(),
        format!("Pair: {}", rec.instrument),
        format!("Signal: {}", rec.direction),
        format!("Entry Price: {}", format_price(rec.entry, PRICE_DECIMALS)),
        "Targets:".to_string(),
    ];
    for (i, target) in rec.targets.iter().enumerate() {
        lines.push(format!("  Target {}: {}", i + 1, format_price(*target, PRICE_DECIMALS)));
    }
    lines.push(format!("Stop Loss: {}", format_price(rec.stop_loss, PRICE_DECIMALS)));
    lines.push(format!("Risk/Reward: {:.2}", rec.risk_reward));

    if let Some(rsi) = snapshot.rsi {
        lines.push(format!("RSI: {:.2} ({})", rsi, rsi_label(rsi)));
    }
    if let Some(macd) = snapshot.macd {
        lines.push(format!("MACD: {}", format_price(macd, PRICE_DECIMALS)));
    }
    if let Some(signal) = snapshot.macd_signal {
        lines.push(format!("Signal Line: {}", format_price(signal, PRICE_DECIMALS)));
    }
    if let Some(sentiment) = rec.sentiment {
        let mood = if sentiment > 0.0 {
            "positive"
        } else if sentiment < 0.0 {
            "negative"
        } else {
            "neutral"
        };
        lines.push(format!("News Sentiment: {:.2} ({})", sentiment, mood));
    }
    lines.push(format!("Time: {}", rec.generated_at.format("%Y-%m-%d %H:%M:%S UTC")));
    lines.join("\n")
}

/// Writes every recommendation to the log.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(&self, recommendation: &Recommendation, snapshot: &IndicatorSnapshot) {
        tracing::info!(
            instrument = %recommendation.instrument,
            direction = %recommendation.direction,
            id = %recommendation.id,
            "\n{}",
            format_signal_message(recommendation, snapshot)
        );
    }
}

/// Hands recommendations to whoever holds the receiver. Never blocks: when
/// the channel is full or closed the message is dropped with a warning.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<(Recommendation, IndicatorSnapshot)>,
}

impl ChannelNotifier {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<(Recommendation, IndicatorSnapshot)>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl NotificationSink for ChannelNotifier {
    async fn notify(&self, recommendation: &Recommendation, snapshot: &IndicatorSnapshot) {
        if let Err(e) = self.tx.try_send((recommendation.clone(), snapshot.clone())) {
            tracing::warn!(
                instrument = %recommendation.instrument,
                error = %e,
                "Dropping signal notification"
            );
        }
    }
}
