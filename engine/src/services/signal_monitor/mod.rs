// engine/src/services/signal_monitor/mod.rs
// The monitoring scheduler. Owns the background loop; the per-instrument
// pipeline and the cycle fan-out live in the sibling modules.
use shared::models::TimeFrame;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::EngineError;
use crate::indicators::{IndicatorEngine, IndicatorSettings};
use crate::services::providers::{InstrumentSource, MarketDataProvider, NotificationSink, SentimentProvider, SignalRecorder};
use crate::signals::{AggregatorSettings, CooldownTracker, SignalAggregator, VoteExtractor, VoteSettings};

pub mod check_instrument;
pub mod run_cycle;

pub use check_instrument::{CheckOutcome, InstrumentChecker};
pub use run_cycle::CycleSummary;

/// Scheduler and analysis parameters, fixed for the life of a monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorOptions {
    pub timeframe: TimeFrame,
    pub series_limit: usize,
    /// Pause between the end of one cycle and the start of the next.
    pub poll_interval: Duration,
    /// Pause after a cycle that could not run at all.
    pub error_backoff: Duration,
    /// Minimum time between two emissions for one instrument.
    pub cooldown: Duration,
    pub enable_sentiment: bool,
    pub indicators: IndicatorSettings,
    pub votes: VoteSettings,
    pub aggregator: AggregatorSettings,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        MonitorOptions {
            timeframe: TimeFrame::Hour1,
            series_limit: 100,
            poll_interval: Duration::from_secs(300),
            error_backoff: Duration::from_secs(60),
            cooldown: Duration::from_secs(3600),
            enable_sentiment: false,
            indicators: IndicatorSettings::default(),
            votes: VoteSettings::default(),
            aggregator: AggregatorSettings::default(),
        }
    }
}

/// External collaborators the monitor drives.
pub struct MonitorDeps {
    pub market_data: Arc<dyn MarketDataProvider>,
    pub sentiment: Option<Arc<dyn SentimentProvider>>,
    pub notifier: Arc<dyn NotificationSink>,
    pub recorder: Arc<dyn SignalRecorder>,
    pub instruments: Arc<dyn InstrumentSource>,
    pub cooldown: Arc<CooldownTracker>,
}

#[derive(Clone)]
struct MonitorLoop {
    checker: Arc<InstrumentChecker>,
    instruments: Arc<dyn InstrumentSource>,
    poll_interval: Duration,
    error_backoff: Duration,
    // held for the whole of a cycle so cycles never overlap
    cycle_lock: Arc<tokio::sync::Mutex<()>>,
    cycles: Arc<AtomicU64>,
}

impl MonitorLoop {
    async fn cycle(&self) -> Result<CycleSummary, EngineError> {
        let _cycle = self.cycle_lock.lock().await;
        let summary = run_cycle::run_cycle(&self.checker, self.instruments.as_ref()).await?;
        self.cycles.fetch_add(1, Ordering::SeqCst);
        Ok(summary)
    }

    async fn run(self, mut stop_rx: watch::Receiver<bool>) {
        loop {
            if *stop_rx.borrow() {
                break;
            }

            let pause = match self.cycle().await {
                Ok(summary) => {
                    tracing::info!(
                        instruments = summary.instruments,
                        emitted = summary.emitted,
                        cooldown_blocked = summary.cooldown_blocked,
                        no_signal = summary.no_signal,
                        skipped = summary.skipped,
                        failed = summary.failed,
                        failed_instruments = ?summary.failed_instruments,
                        "Monitoring cycle finished"
                    );
                    self.poll_interval
                }
                Err(e) => {
                    tracing::error!(error = %e, backoff_secs = self.error_backoff.as_secs_f64(), "Error in monitoring loop");
                    self.error_backoff
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                changed = stop_rx.changed() => {
                    // a dropped sender means the monitor itself is gone
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
    }
}

struct RunningLoop {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// STOPPED until `start`, RUNNING until `stop`.
pub struct SignalMonitor {
    inner: MonitorLoop,
    running: Mutex<Option<RunningLoop>>,
}

impl SignalMonitor {
    pub fn new(options: MonitorOptions, deps: MonitorDeps) -> Result<Self, EngineError> {
        let indicators = IndicatorEngine::new(options.indicators.clone())?;
        let aggregator = SignalAggregator::new(options.aggregator.clone())?;
        let votes = VoteExtractor::new(options.votes.clone());
        tracing::debug!(indicators = %indicators.parameters(), "Indicator engine configured");
        if options.enable_sentiment && deps.sentiment.is_none() {
            tracing::warn!("Sentiment is enabled but no sentiment provider was supplied; scoring votes only");
        }

        let checker = InstrumentChecker {
            market_data: deps.market_data,
            sentiment: deps.sentiment,
            notifier: deps.notifier,
            recorder: deps.recorder,
            indicators,
            votes,
            aggregator,
            cooldown: deps.cooldown,
            options: options.clone(),
        };

        Ok(Self {
            inner: MonitorLoop {
                checker: Arc::new(checker),
                instruments: deps.instruments,
                poll_interval: options.poll_interval,
                error_backoff: options.error_backoff,
                cycle_lock: Arc::new(tokio::sync::Mutex::new(())),
                cycles: Arc::new(AtomicU64::new(0)),
            },
            running: Mutex::new(None),
        })
    }

    fn running(&self) -> std::sync::MutexGuard<'_, Option<RunningLoop>> {
        self.running.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Spawns the monitoring loop. Returns `false` if it was already running.
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut running = self.running();
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            tracing::debug!("Signal monitoring already running");
            return false;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(self.inner.clone().run(stop_rx));
        *running = Some(RunningLoop { stop_tx, handle });
        tracing::info!(
            poll_interval_secs = self.inner.poll_interval.as_secs_f64(),
            "Signal monitoring started"
        );
        true
    }

    /// Signals the loop and waits for the in-flight cycle to finish.
    pub async fn stop(&self) {
        let Some(running) = self.running().take() else {
            return;
        };
        // The loop may already be gone; nothing to signal then.
        let _ = running.stop_tx.send(true);
        if let Err(e) = running.handle.await {
            tracing::error!(error = %e, "Signal monitoring task ended abnormally");
        }
        tracing::info!("Signal monitoring stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running().as_ref().is_some_and(|r| !r.handle.is_finished())
    }

    /// Cycles that reached every instrument since construction.
    pub fn cycles_completed(&self) -> u64 {
        self.inner.cycles.load(Ordering::SeqCst)
    }

    /// Runs a single cycle now, waiting for any in-flight one first.
    pub async fn run_once(&self) -> Result<CycleSummary, EngineError> {
        self.inner.cycle().await
    }
}
