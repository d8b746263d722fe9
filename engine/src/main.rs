// Engine main entry point
use anyhow::Context;
use signal_engine::config::EngineSettings;
use signal_engine::data::CsvMarketFeed;
use signal_engine::services::{CsvSignalJournal, LogNotifier, MonitorDeps, SignalMonitor, StaticInstruments};
use signal_engine::signals::CooldownTracker;
use std::sync::Arc;
use tracing::info;

const CONFIG_ENV: &str = "SIGNAL_ENGINE_CONFIG";

fn load_settings(path: Option<String>) -> anyhow::Result<EngineSettings> {
    match path.or_else(|| std::env::var(CONFIG_ENV).ok()) {
        Some(path) => EngineSettings::load_from_file(&path).with_context(|| format!("loading settings from {}", path)),
        None => EngineSettings::load_default().context("loading bundled settings"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `--once` runs a single cycle and exits; any other argument is a config path.
    let mut once = false;
    let mut config_path = None;
    for arg in std::env::args().skip(1) {
        if arg == "--once" {
            once = true;
        } else {
            config_path = Some(arg);
        }
    }

    let settings = load_settings(config_path)?;
    tracing_subscriber::fmt().with_max_level(settings.log_level()).init();

    info!(
        instruments = ?settings.instruments,
        timeframe = %settings.timeframe,
        data_dir = %settings.data_dir.display(),
        "Starting signal engine..."
    );

    let journal = Arc::new(CsvSignalJournal::new(settings.journal_path.clone()));
    let cooldown = Arc::new(CooldownTracker::new());
    for (instrument, at) in journal.last_emissions()? {
        cooldown.seed(&instrument, at);
    }
    info!(seeded = cooldown.len(), journal = %journal.path().display(), "Cooldown restored from journal");

    let sentiment = settings.sentiment_provider();
    if sentiment.is_some() {
        info!(
            path = %settings.sentiment_path.display(),
            window_hours = settings.sentiment_window_hours,
            "News sentiment enabled"
        );
    }

    let monitor = SignalMonitor::new(
        settings.monitor_options(),
        MonitorDeps {
            market_data: Arc::new(CsvMarketFeed::new(settings.data_dir.clone())),
            sentiment,
            notifier: Arc::new(LogNotifier),
            recorder: journal,
            instruments: Arc::new(StaticInstruments(settings.instruments.clone())),
            cooldown,
        },
    )?;

    if once {
        let summary = monitor.run_once().await?;
        info!(?summary, "Single cycle finished");
        return Ok(());
    }

    monitor.start();
    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    info!("Shutdown requested, waiting for the current cycle...");
    monitor.stop().await;

    Ok(())
}
