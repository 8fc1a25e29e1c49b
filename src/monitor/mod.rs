//! Metric Pipeline Module
//!
//! Turns the bot's append-only monitoring feed and its current positions
//! into the series and indicators shown on the dashboard.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   select_window    ┌────────────┐  normalize_gain  ┌────────────┐
//! │ MonitoringSeries │ ─────────────────► │   window   │ ───────────────► │ normalized │
//! └──────────────────┘                    └────────────┘                  └─────┬──────┘
//!                                                          derive_kpis / derive_chart
//!                                                                               ▼
//!                                                                      ┌───────────────┐
//!                                                                      │ MonitorReport │
//!                                                                      └───────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use bot_monitor::monitor::{build_report, MonitoringSeries, MonitoringSnapshot, Period, WindowAnchor};
//! use chrono::{Duration, Utc};
//!
//! let now = Utc::now();
//! let series = MonitoringSeries::with_all_columns(vec![
//!     MonitoringSnapshot::empty(now - Duration::hours(2)).with_balance(1000.0, 800.0),
//!     MonitoringSnapshot::empty(now).with_balance(1100.0, 800.0),
//! ]);
//!
//! let report = build_report(&series, &[], Period::OneDay, WindowAnchor::Latest, now).unwrap();
//! assert_eq!(report.kpis.gain_total, Some(100.0));
//! ```

pub mod chart;
pub mod errors;
pub mod health;
pub mod period;
pub mod pipeline;
mod rolling;
pub mod types;

pub use chart::{derive_chart, ChartPoint};
pub use errors::{MonitorError, MonitorResult};
pub use health::{Health, KpiHealth};
pub use period::{Period, WindowAnchor};
pub use pipeline::{
    build_report, derive_kpis, normalize_gain, select_window, select_window_at, Kpis,
    MonitorReport,
};
pub use types::{ColumnSet, MonitoringSeries, MonitoringSnapshot, PositionSnapshot};
