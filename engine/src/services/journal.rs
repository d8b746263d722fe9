// Append-only CSV history of emitted recommendations.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::{Direction, IndicatorSnapshot, Recommendation};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::providers::SignalRecorder;
use crate::error::EngineError;

/// One journal line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalRow {
    pub id: Uuid,
    pub instrument: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub target_1: f64,
    pub target_2: f64,
    pub target_3: f64,
    pub stop_loss: f64,
    pub risk_reward: f64,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub sentiment: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl JournalRow {
    pub fn new(rec: &Recommendation, snapshot: &IndicatorSnapshot) -> Self {
        JournalRow {
            id: rec.id,
            instrument: rec.instrument.clone(),
            direction: rec.direction,
            entry_price: rec.entry,
            target_1: rec.targets[0],
            target_2: rec.targets[1],
            target_3: rec.targets[2],
            stop_loss: rec.stop_loss,
            risk_reward: rec.risk_reward,
            rsi: snapshot.rsi,
            macd: snapshot.macd,
            macd_signal: snapshot.macd_signal,
            sentiment: rec.sentiment,
            created_at: rec.generated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CsvSignalJournal {
    path: PathBuf,
    // serialises appends from concurrent instrument tasks
    write_lock: Arc<Mutex<()>>,
}

impl CsvSignalJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, row: &JournalRow) -> Result<(), EngineError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new().has_headers(needs_header).from_writer(file);
        writer.serialize(row)?;
        writer.flush()?;
        Ok(())
    }

    /// Every row recorded so far; an absent file is an empty journal.
    pub fn read_all(&self) -> Result<Vec<JournalRow>, EngineError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let rows = reader.deserialize().collect::<Result<Vec<JournalRow>, csv::Error>>()?;
        Ok(rows)
    }

    /// Latest emission per instrument, for seeding the cooldown tracker.
    pub fn last_emissions(&self) -> Result<HashMap<String, DateTime<Utc>>, EngineError> {
        let mut latest: HashMap<String, DateTime<Utc>> = HashMap::new();
        for row in self.read_all()? {
            latest
                .entry(row.instrument)
                .and_modify(|at| {
                    if row.created_at > *at {
                        *at = row.created_at;
                    }
                })
                .or_insert(row.created_at);
        }
        Ok(latest)
    }
}

#[async_trait]
impl SignalRecorder for CsvSignalJournal {
    async fn record(&self, recommendation: &Recommendation, snapshot: &IndicatorSnapshot) -> Result<(), EngineError> {
        let journal = self.clone();
        let row = JournalRow::new(recommendation, snapshot);
        tokio::task::spawn_blocking(move || journal.append(&row))
            .await
            .map_err(|e| EngineError::ProcessingError(format!("Journal writer task failed: {}", e)))?
            .map_err(|e| EngineError::PersistenceError(format!("{} ({})", e, self.path.display())))
    }
}
