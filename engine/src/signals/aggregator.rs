// Combines votes (and optional sentiment) into one trade recommendation.
use crate::error::EngineError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::models::{Direction, PriceLevels, Recommendation, Vote};
use uuid::Uuid;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AggregatorSettings {
    /// A side must strictly exceed this share of the votes.
    pub signal_threshold: f64,
    /// Added to the side the sentiment score points at.
    pub sentiment_bonus: f64,
    /// Fractional distance of the three targets from entry.
    pub target_steps: [f64; 3],
    /// Fractional distance of the stop-loss from entry.
    pub stop_loss_step: f64,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        AggregatorSettings {
            signal_threshold: 0.6,
            sentiment_bonus: 0.2,
            target_steps: [0.02, 0.04, 0.06],
            stop_loss_step: 0.02,
        }
    }
}

impl AggregatorSettings {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.signal_threshold > 0.0 && self.signal_threshold <= 1.0) {
            return Err(EngineError::ConfigError(format!(
                "signal_threshold must be in (0, 1], got {}",
                self.signal_threshold
            )));
        }
        if !(self.sentiment_bonus.is_finite() && self.sentiment_bonus >= 0.0) {
            return Err(EngineError::ConfigError(format!(
                "sentiment_bonus must be non-negative, got {}",
                self.sentiment_bonus
            )));
        }
        let [t1, t2, t3] = self.target_steps;
        // Steps below 1 keep SELL targets above zero.
        if !(t1 > 0.0 && t1 < t2 && t2 < t3 && t3 < 1.0) {
            return Err(EngineError::ConfigError(format!(
                "target_steps must be strictly increasing within (0, 1), got {:?}",
                self.target_steps
            )));
        }
        if !(self.stop_loss_step > 0.0 && self.stop_loss_step < 1.0) {
            return Err(EngineError::ConfigError(format!(
                "stop_loss_step must be within (0, 1), got {}",
                self.stop_loss_step
            )));
        }
        Ok(())
    }
}

/// Share of BUY and SELL votes after the sentiment bonus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strength {
    pub buy: f64,
    pub sell: f64,
}

pub struct SignalAggregator {
    settings: AggregatorSettings,
}

impl SignalAggregator {
    pub fn new(settings: AggregatorSettings) -> Result<Self, EngineError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn strength(&self, votes: &[Vote], sentiment: Option<f64>) -> Option<Strength> {
        if votes.is_empty() {
            return None;
        }
        let total = votes.len() as f64;
        let buys = votes.iter().filter(|v| v.direction == Direction::Buy).count() as f64;
        let sells = votes.iter().filter(|v| v.direction == Direction::Sell).count() as f64;

        let mut strength = Strength {
            buy: buys / total,
            sell: sells / total,
        };
        match sentiment {
            Some(score) if score > 0.0 => strength.buy += self.settings.sentiment_bonus,
            Some(score) if score < 0.0 => strength.sell += self.settings.sentiment_bonus,
            _ => {}
        }
        Some(strength)
    }

    /// Picks a side. When both sides clear the threshold BUY wins because it
    /// is checked first.
    pub fn decide(&self, votes: &[Vote], sentiment: Option<f64>) -> Option<Direction> {
        let strength = self.strength(votes, sentiment)?;
        if strength.buy > self.settings.signal_threshold {
            Some(Direction::Buy)
        } else if strength.sell > self.settings.signal_threshold {
            Some(Direction::Sell)
        } else {
            None
        }
    }

    pub fn evaluate(
        &self,
        instrument: &str,
        votes: &[Vote],
        levels: &PriceLevels,
        sentiment: Option<f64>,
        now: DateTime<Utc>,
    ) -> Option<Recommendation> {
        let direction = self.decide(votes, sentiment)?;
        let entry = levels.current_price;
        if !(entry.is_finite() && entry > 0.0) {
            tracing::warn!(instrument = %instrument, entry, "Refusing to build a recommendation from an invalid price");
            return None;
        }

        let steps = self.settings.target_steps;
        let stop_step = self.settings.stop_loss_step;
        let (targets, stop_loss) = match direction {
            Direction::Buy => (steps.map(|step| entry * (1.0 + step)), entry * (1.0 - stop_step)),
            Direction::Sell => (steps.map(|step| entry * (1.0 - step)), entry * (1.0 + stop_step)),
        };
        let risk_reward = (targets[1] - entry).abs() / (entry - stop_loss).abs();

        Some(Recommendation {
            id: Uuid::new_v4(),
            instrument: instrument.to_string(),
            direction,
            entry,
            targets,
            stop_loss,
            risk_reward,
            sentiment,
            generated_at: now,
        })
    }
}

impl Default for SignalAggregator {
    fn default() -> Self {
        Self {
            settings: AggregatorSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(price: f64) -> PriceLevels {
        PriceLevels {
            current_price: price,
            support_1: price * 0.95,
            support_2: price * 0.9,
            resistance_1: price * 1.05,
            resistance_2: price * 1.1,
        }
    }

    fn votes(buys: usize, sells: usize) -> Vec<Vote> {
        let mut votes = vec![Vote::new("RSI", "oversold", Direction::Buy); buys];
        votes.extend(vec![Vote::new("RSI", "overbought", Direction::Sell); sells]);
        votes
    }

    #[test]
    fn test_empty_votes_no_recommendation() {
        let agg = SignalAggregator::default();
        assert!(agg.evaluate("BTC/USDT", &[], &levels(100.0), Some(1.0), Utc::now()).is_none());
    }

    #[test]
    fn test_threshold_is_strict() {
        let agg = SignalAggregator::default();
        // 3 of 5 = exactly 0.6
        assert_eq!(agg.strength(&votes(3, 2), None).unwrap().buy, 0.6);
        assert!(agg.decide(&votes(3, 2), None).is_none());
        assert!(agg.decide(&votes(3, 2), Some(0.0)).is_none());
        // 2 of 3 clears it
        assert_eq!(agg.decide(&votes(2, 1), Some(0.0)), Some(Direction::Buy));
    }

    #[test]
    fn test_sentiment_bonus_tips_the_balance() {
        let agg = SignalAggregator::default();
        assert!(agg.decide(&votes(1, 1), None).is_none());
        assert_eq!(agg.decide(&votes(1, 1), Some(0.4)), Some(Direction::Buy));
        assert_eq!(agg.decide(&votes(1, 1), Some(-0.1)), Some(Direction::Sell));
    }

    #[test]
    fn test_buy_wins_when_both_sides_clear() {
        // 0.5 / 0.5 both clear a 0.3 threshold
        let agg = SignalAggregator::new(AggregatorSettings {
            signal_threshold: 0.3,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(agg.decide(&votes(1, 1), None), Some(Direction::Buy));
    }

    #[test]
    fn test_buy_recommendation_levels() {
        let agg = SignalAggregator::default();
        let rec = agg.evaluate("BTC/USDT", &votes(1, 0), &levels(100.0), None, Utc::now()).unwrap();
        assert_eq!(rec.direction, Direction::Buy);
        assert_eq!(rec.entry, 100.0);
        assert!((rec.targets[0] - 102.0).abs() < 1e-9);
        assert!((rec.targets[1] - 104.0).abs() < 1e-9);
        assert!((rec.targets[2] - 106.0).abs() < 1e-9);
        assert!((rec.stop_loss - 98.0).abs() < 1e-9);
        assert!((rec.risk_reward - 2.0).abs() < 1e-9);

        assert!(rec.targets[0] > rec.entry && rec.targets[0] < rec.targets[1] && rec.targets[1] < rec.targets[2]);
        assert!(rec.stop_loss < rec.entry);
    }

    #[test]
    fn test_sell_recommendation_levels() {
        let agg = SignalAggregator::default();
        let rec = agg.evaluate("ETH/USDT", &votes(0, 2), &levels(2000.0), None, Utc::now()).unwrap();
        assert_eq!(rec.direction, Direction::Sell);
        assert!((rec.targets[0] - 1960.0).abs() < 1e-9);
        assert!((rec.targets[1] - 1920.0).abs() < 1e-9);
        assert!((rec.targets[2] - 1880.0).abs() < 1e-9);
        assert!((rec.stop_loss - 2040.0).abs() < 1e-9);
        assert!((rec.risk_reward - 2.0).abs() < 1e-9);

        assert!(rec.targets[0] < rec.entry && rec.targets[0] > rec.targets[1] && rec.targets[1] > rec.targets[2]);
        assert!(rec.stop_loss > rec.entry);
        assert_eq!(rec.instrument, "ETH/USDT");
    }

    #[test]
    fn test_sentiment_is_carried_on_recommendation() {
        let agg = SignalAggregator::default();
        let now = Utc::now();
        let rec = agg.evaluate("BTC/USDT", &votes(1, 1), &levels(10.0), Some(0.35), now).unwrap();
        assert_eq!(rec.sentiment, Some(0.35));
        assert_eq!(rec.generated_at, now);
    }

    #[test]
    fn test_invalid_price_yields_nothing() {
        let agg = SignalAggregator::default();
        assert!(agg.evaluate("X", &votes(2, 0), &levels(0.0), None, Utc::now()).is_none());
        assert!(agg.evaluate("X", &votes(2, 0), &levels(f64::NAN), None, Utc::now()).is_none());
    }

    #[test]
    fn test_settings_validation() {
        assert!(AggregatorSettings::default().validate().is_ok());
        let bad_steps = AggregatorSettings {
            target_steps: [0.04, 0.02, 0.06],
            ..Default::default()
        };
        assert!(SignalAggregator::new(bad_steps).is_err());
        let bad_threshold = AggregatorSettings {
            signal_threshold: 1.5,
            ..Default::default()
        };
        assert!(bad_threshold.validate().is_err());
    }
}
