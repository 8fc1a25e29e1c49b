#![deny(unreachable_pub)]
pub mod config;
pub mod feed;
pub mod monitor;
pub mod runner;
mod server;

pub use config::Settings;
pub use feed::{Feed, HttpFeed, LocalFeed};
pub use monitor::{
    build_report, derive_kpis, normalize_gain, select_window, Kpis, MonitorError, MonitorReport,
    MonitorResult, MonitoringSeries, MonitoringSnapshot, Period, PositionSnapshot, WindowAnchor,
};
pub use runner::{evaluate, MonitorRunner, StatusReport};
