//! Metric pipeline: window selection, gain rebasing and KPI derivation
//!
//! Every function here is pure. The caller passes the two feed tables, the
//! selected period and the current instant, and gets back a report; nothing
//! is cached between invocations.

use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde::Serialize;

use super::chart::{self, ChartPoint};
use super::errors::{MonitorError, MonitorResult};
use super::period::{Period, WindowAnchor};
use super::rolling;
use super::types::{columns, MonitoringSeries, MonitoringSnapshot, PositionSnapshot};

/// Keep the rows newer than `max(timestamp) - period`
pub fn select_window(series: &MonitoringSeries, period: Period) -> MonitorResult<MonitoringSeries> {
    let anchor = series.latest_timestamp().ok_or(MonitorError::NoData)?;
    select_window_at(series, period, anchor)
}

/// Keep the rows newer than `anchor - period`, in their original order
pub fn select_window_at(
    series: &MonitoringSeries,
    period: Period,
    anchor: DateTime<Utc>,
) -> MonitorResult<MonitoringSeries> {
    if series.is_empty() {
        return Err(MonitorError::NoData);
    }

    let rows: Vec<MonitoringSnapshot> = match period.cutoff(anchor) {
        Some(cutoff) => series
            .rows
            .iter()
            .filter(|r| r.timestamp > cutoff)
            .cloned()
            .collect(),
        None => series.rows.clone(),
    };

    if rows.is_empty() {
        return Err(MonitorError::EmptyWindow { period });
    }

    debug!(
        "Selected {} of {} rows for period '{}'",
        rows.len(),
        series.len(),
        period
    );

    Ok(MonitoringSeries {
        columns: series.columns.clone(),
        rows,
    })
}

/// Rebase `gain_theoretical` so the window's first value is zero
///
/// The base is the first present value; rows before it stay missing.
pub fn normalize_gain(mut window: MonitoringSeries) -> MonitoringSeries {
    if let Some(base) = rolling::first_present(&window.values(|r| r.gain_theoretical)) {
        for row in &mut window.rows {
            row.gain_theoretical = row.gain_theoretical.map(|g| g - base);
        }
    }
    window
}

/// Scalar indicators for the latest snapshot of a window
///
/// `None` fields are omitted from the serialized form so the renderer can
/// decide whether to show them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub last_timestamp: DateTime<Utc>,
    /// Age of the latest snapshot at report time
    pub staleness_seconds: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_balance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// Cushion above the threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<f64>,
    /// Current cushion relative to the largest cushion in the window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain_24h: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain_theoretical: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_profit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usdc_invested: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usdc_borrowed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_fees: Option<f64>,
    /// Zero outside margin mode
    pub interest_fees: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_fees: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_24h: Option<f64>,
}

impl Kpis {
    pub fn staleness(&self) -> Duration {
        Duration::seconds(self.staleness_seconds)
    }
}

/// Compute the KPI set of a normalized window
///
/// Returns `None` for an empty window.
pub fn derive_kpis(
    window: &MonitoringSeries,
    positions: &[PositionSnapshot],
    now: DateTime<Utc>,
) -> Option<Kpis> {
    let last = window.last()?;
    debug!(
        "Deriving KPIs over {} rows and {} positions",
        window.len(),
        positions.len()
    );

    let balances = window.values(|r| r.tot_usdc);
    let first_balance = rolling::first_present(&balances);
    let max_balance = rolling::max_present(&balances);

    let balance = last.tot_usdc;
    let threshold = last.usdc_threshold;
    let remaining = diff(balance, threshold);
    let risk_ratio = match (remaining, max_balance, threshold) {
        (Some(cushion), Some(max), Some(floor)) => Some(risk_ratio(cushion, max - floor)),
        _ => None,
    };

    // first row of the trailing 24h, if the window reaches that far back
    let day_start = now
        .checked_sub_signed(Duration::hours(24))
        .and_then(|cutoff| window.rows.iter().position(|r| r.timestamp > cutoff));
    let gain_24h = day_start
        .and_then(|i| rolling::first_present(&balances[i..]))
        .and_then(|start| diff(balance, Some(start)));

    let total_fees = window
        .has_column(columns::TOTAL_FEES_USDC)
        .then(|| rolling::sum_present(&window.values(|r| r.total_fees_usdc)));
    let interest_fees = if window.has_column(columns::INTEREST_FEES_USDC) {
        rolling::sum_present(&window.values(|r| r.interest_fees_usdc))
    } else {
        0.0
    };
    let transaction_fees = total_fees.map(|total| total - interest_fees);

    let (market_total, market_24h) = if window.has_column(columns::MEAN_PRICE_DIFF) {
        let diffs = window.values(|r| r.mean_price_diff);
        let total = 100.0 * rolling::sum_present(&diffs);
        // missing cells carry the running sum forward
        let day = day_start.map(|i| total - 100.0 * rolling::sum_present(&diffs[..=i]));
        (Some(total), day)
    } else {
        (None, None)
    };

    Some(Kpis {
        last_timestamp: last.timestamp,
        staleness_seconds: (now - last.timestamp).num_seconds(),
        balance,
        max_balance,
        threshold,
        remaining,
        risk_ratio,
        gain_total: diff(balance, first_balance),
        gain_24h,
        gain_theoretical: last.gain_theoretical,
        pending_profit: last.pending_profit,
        usdc_invested: last.usdc_invested,
        usdc_borrowed: last.usdc_borrowed,
        accuracy: last.accuracy,
        tax: last.tax,
        total_fees,
        interest_fees,
        transaction_fees,
        market_total,
        market_24h,
    })
}

/// `cushion / max_cushion`, or 1 when the largest cushion is not positive
pub fn risk_ratio(cushion: f64, max_cushion: f64) -> f64 {
    if max_cushion <= 0.0 {
        1.0
    } else {
        cushion / max_cushion
    }
}

fn diff(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? - b?)
}

/// Everything the renderer needs for one period selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorReport {
    pub period: Period,
    pub generated_at: DateTime<Utc>,
    /// Windowed rows with `gain_theoretical` rebased
    pub window: MonitoringSeries,
    pub chart: Vec<ChartPoint>,
    pub kpis: Kpis,
    /// Current positions, unchanged
    pub positions: Vec<PositionSnapshot>,
}

/// Run the whole pipeline for one period selection
pub fn build_report(
    series: &MonitoringSeries,
    positions: &[PositionSnapshot],
    period: Period,
    anchor: WindowAnchor,
    now: DateTime<Utc>,
) -> MonitorResult<MonitorReport> {
    let window = match anchor {
        WindowAnchor::Latest => select_window(series, period)?,
        WindowAnchor::Now => select_window_at(series, period, now)?,
    };
    let window = normalize_gain(window);
    let kpis = derive_kpis(&window, positions, now).ok_or(MonitorError::EmptyWindow { period })?;
    let chart = chart::derive_chart(&window);

    Ok(MonitorReport {
        period,
        generated_at: now,
        window,
        chart,
        kpis,
        positions: positions.to_vec(),
    })
}
