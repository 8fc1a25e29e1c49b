use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use serde::Serialize;

use crate::config::{ConfigError, MonitorConfig, Settings};
use crate::feed::{self, fetch_tables, Feed};
use crate::monitor::{build_report, KpiHealth, MonitorReport, MonitorResult, Period};

/// A report plus the display health of its KPIs
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    #[serde(flatten)]
    pub report: MonitorReport,
    pub health: KpiHealth,
}

/// Fetch both tables and run the pipeline for one period selection
///
/// This is the handler invoked on every period change: nothing is carried
/// over from earlier invocations.
pub async fn evaluate(
    feed: &dyn Feed,
    monitor: &MonitorConfig,
    period: Period,
    now: DateTime<Utc>,
) -> MonitorResult<StatusReport> {
    let (series, positions) = fetch_tables(feed).await?;
    let report = build_report(&series, &positions, period, monitor.window_anchor, now)?;
    let health = KpiHealth::from_kpis(&report.kpis, Duration::minutes(monitor.freshness_minutes));
    Ok(StatusReport { report, health })
}

/// Shared state of the status server
pub struct MonitorState {
    pub feed: Box<dyn Feed>,
    pub monitor: MonitorConfig,
}

/// Runner for the monitor
pub struct MonitorRunner {
    config: Settings,
}

impl MonitorRunner {
    /// Create a new runner from a configuration file
    pub fn new(config_path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = config_path.as_ref();
        let path = path
            .to_str()
            .ok_or_else(|| ConfigError::Message(format!("Non UTF-8 config path: {}", path.display())))?;
        let config = Settings::new(path)?;
        Ok(Self { config })
    }

    pub fn settings(&self) -> &Settings {
        &self.config
    }

    /// Run the monitor
    ///
    /// Serves the status API when enabled, otherwise prints one report for
    /// `period` (or the configured default) as JSON.
    pub async fn run(self, period: Option<Period>) -> Result<(), Box<dyn std::error::Error>> {
        // 1. Setup Logging
        if std::env::var("RUST_LOG").is_err() {
            std::env::set_var("RUST_LOG", &self.config.log.level);
        }
        env_logger::try_init().ok();

        info!("Starting MonitorRunner...");

        // 2. Setup Feed
        let feed = feed::from_config(&self.config.feed);
        info!("Using {}", feed.describe());

        let state = Arc::new(MonitorState {
            feed,
            monitor: self.config.monitor.clone(),
        });

        // 3. Serve or report once
        if self.config.server.enabled {
            let server = &self.config.server;
            crate::server::start_server(state, server.port, server.host.clone()).await?;
            return Ok(());
        }

        let period = period.unwrap_or(state.monitor.default_period);
        let status = evaluate(state.feed.as_ref(), &state.monitor, period, Utc::now()).await?;
        log_summary(&status);
        println!("{}", serde_json::to_string_pretty(&status)?);

        Ok(())
    }
}

fn log_summary(status: &StatusReport) {
    let kpis = &status.report.kpis;
    info!(
        "Period '{}': {} rows, last snapshot {} ({} min old)",
        status.report.period,
        status.report.window.len(),
        kpis.last_timestamp,
        kpis.staleness().num_minutes()
    );
    match (kpis.balance, kpis.gain_total) {
        (Some(balance), Some(gain)) => info!("Balance={:.2}$ Gain total={:.2}$", balance, gain),
        _ => warn!("Balance column missing from feed"),
    }
    if let (Some(remaining), Some(ratio)) = (kpis.remaining, kpis.risk_ratio) {
        info!("Remaining={:.0}$ Risk ratio={:.2} ({:?})", remaining, ratio, status.health.risk);
    }
    info!(
        "Fees: interest={:.2}$ transaction={}",
        kpis.interest_fees,
        kpis.transaction_fees
            .map(|f| format!("{:.2}$", f))
            .unwrap_or_else(|| "N/A".to_string())
    );
}
