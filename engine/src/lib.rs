// Engine library root
// This file declares the modules for the signal engine crate.

pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod models;
pub mod services;
pub mod signals;

pub use config::EngineSettings;
pub use error::EngineError;
pub use services::{MonitorDeps, MonitorOptions, SignalMonitor};
