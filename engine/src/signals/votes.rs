// Turns the two most recent indicator points into directional votes.
use crate::indicators::IndicatorSet;
use serde::Deserialize;
use shared::models::{Direction, Vote};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct VoteSettings {
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
}

impl Default for VoteSettings {
    fn default() -> Self {
        VoteSettings {
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
        }
    }
}

/// Direction of a line crossing a reference line between two points.
fn crossover(prev_line: f64, prev_ref: f64, line: f64, reference: f64) -> Option<Direction> {
    if prev_line <= prev_ref && line > reference {
        Some(Direction::Buy)
    } else if prev_line >= prev_ref && line < reference {
        Some(Direction::Sell)
    } else {
        None
    }
}

pub struct VoteExtractor {
    settings: VoteSettings,
}

impl VoteExtractor {
    pub fn new(settings: VoteSettings) -> Self {
        Self { settings }
    }

    /// Rules run in a fixed order: RSI level, MACD crossover, price/SMA
    /// crossover. A rule whose inputs are not ready at either point is
    /// silently skipped.
    pub fn extract(&self, set: &IndicatorSet) -> Vec<Vote> {
        let mut votes = Vec::new();
        if set.len() < 2 {
            return votes;
        }
        let latest = set.len() - 1;
        let prev = latest - 1;

        if let Some(vote) = self.rsi_level(set, latest, prev) {
            votes.push(vote);
        }

        if let (Some(pm), Some(ps), Some(m), Some(s)) =
            (set.macd[prev], set.macd_signal[prev], set.macd[latest], set.macd_signal[latest])
        {
            match crossover(pm, ps, m, s) {
                Some(Direction::Buy) => votes.push(Vote::new("MACD", "bullish crossover", Direction::Buy)),
                Some(Direction::Sell) => votes.push(Vote::new("MACD", "bearish crossover", Direction::Sell)),
                None => {}
            }
        }

        if let (Some(prev_sma), Some(sma)) = (set.sma_short[prev], set.sma_short[latest]) {
            match crossover(set.close[prev], prev_sma, set.close[latest], sma) {
                Some(Direction::Buy) => votes.push(Vote::new("MA", "ma crossover up", Direction::Buy)),
                Some(Direction::Sell) => votes.push(Vote::new("MA", "ma crossover down", Direction::Sell)),
                None => {}
            }
        }

        votes
    }

    fn rsi_level(&self, set: &IndicatorSet, latest: usize, prev: usize) -> Option<Vote> {
        // The level rule reads the latest point only, but both points must be
        // ready like every other rule.
        set.rsi[prev]?;
        let rsi = set.rsi[latest]?;
        if set.rsi_stalled[latest] {
            return None;
        }
        if rsi < self.settings.rsi_oversold {
            Some(Vote::new("RSI", "oversold", Direction::Buy))
        } else if rsi > self.settings.rsi_overbought {
            Some(Vote::new("RSI", "overbought", Direction::Sell))
        } else {
            None
        }
    }
}

impl Default for VoteExtractor {
    fn default() -> Self {
        Self::new(VoteSettings::default())
    }
}
