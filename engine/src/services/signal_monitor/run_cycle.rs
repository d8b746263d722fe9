// One monitoring cycle: every instrument checked in its own task so a
// failure or panic stays contained.
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::{self, JoinSet};

use super::check_instrument::{CheckOutcome, InstrumentChecker};
use crate::error::EngineError;
use crate::services::providers::InstrumentSource;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub instruments: usize,
    pub emitted: usize,
    pub cooldown_blocked: usize,
    pub no_signal: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Instruments whose check returned an error or panicked.
    pub failed_instruments: Vec<String>,
}

/// Fails only when the instrument list itself cannot be obtained.
pub async fn run_cycle(
    checker: &Arc<InstrumentChecker>,
    instruments: &dyn InstrumentSource,
) -> Result<CycleSummary, EngineError> {
    let instruments = instruments.instruments().await?;
    let mut summary = CycleSummary {
        instruments: instruments.len(),
        ..Default::default()
    };

    let mut tasks = JoinSet::new();
    // a panicked task only reports its id
    let mut names: HashMap<task::Id, String> = HashMap::new();
    for instrument in instruments {
        let checker = Arc::clone(checker);
        let name = instrument.clone();
        let handle = tasks.spawn(async move {
            let outcome = checker.check(&instrument).await;
            (instrument, outcome)
        });
        names.insert(handle.id(), name);
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(CheckOutcome::Emitted(_)))) => summary.emitted += 1,
            Ok((_, Ok(CheckOutcome::CooldownBlocked))) => summary.cooldown_blocked += 1,
            Ok((_, Ok(CheckOutcome::NoSignal))) => summary.no_signal += 1,
            Ok((_, Ok(CheckOutcome::Skipped(_)))) => summary.skipped += 1,
            Ok((instrument, Err(e))) => {
                summary.failed += 1;
                tracing::error!(instrument = %instrument, error = %e, "Error checking signals");
                summary.failed_instruments.push(instrument);
            }
            Err(join_error) => {
                summary.failed += 1;
                let instrument = names.remove(&join_error.id()).unwrap_or_else(|| "unknown".to_string());
                tracing::error!(instrument = %instrument, error = %join_error, "Instrument check task aborted");
                summary.failed_instruments.push(instrument);
            }
        }
    }

    Ok(summary)
}
