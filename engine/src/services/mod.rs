// Services: collaborator contracts, reference collaborators and the monitor.
pub mod journal;
pub mod notifier;
pub mod providers;
pub mod sentiment;
pub mod signal_monitor;

pub use journal::{CsvSignalJournal, JournalRow};
pub use notifier::{format_signal_message, ChannelNotifier, LogNotifier};
pub use providers::{
    InstrumentSource, MarketDataProvider, NotificationSink, SentimentProvider, SignalRecorder, StaticInstruments,
};
pub use sentiment::CsvSentimentFeed;
pub use signal_monitor::{CheckOutcome, CycleSummary, MonitorDeps, MonitorOptions, SignalMonitor};
