//! Display policy: KPI values mapped to a tri-state health
//!
//! Thresholds:
//! - risk ratio: below 0.33 is bad, below 0.66 is a warning
//! - gains: negative is bad
//! - pending profit: negative is bad
//! - market change: not strictly positive is bad
//! - freshness: latest snapshot older than the configured age is bad

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::pipeline::Kpis;
use super::types::PositionSnapshot;

pub const RISK_BAD_BELOW: f64 = 0.33;
pub const RISK_WARNING_BELOW: f64 = 0.66;
pub const DEFAULT_FRESHNESS_MINUTES: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    Good,
    Warning,
    Bad,
}

impl Health {
    pub fn risk(ratio: f64) -> Self {
        if ratio < RISK_BAD_BELOW {
            Health::Bad
        } else if ratio < RISK_WARNING_BELOW {
            Health::Warning
        } else {
            Health::Good
        }
    }

    pub fn gain(value: f64) -> Self {
        if value >= 0.0 {
            Health::Good
        } else {
            Health::Bad
        }
    }

    pub fn pending(value: f64) -> Self {
        if value < 0.0 {
            Health::Bad
        } else {
            Health::Good
        }
    }

    pub fn market(value: f64) -> Self {
        if value > 0.0 {
            Health::Good
        } else {
            Health::Bad
        }
    }

    pub fn freshness(staleness: Duration, max_age: Duration) -> Self {
        if staleness < max_age {
            Health::Good
        } else {
            Health::Bad
        }
    }
}

/// Health of each displayed KPI; omitted KPIs have no health
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiHealth {
    pub freshness: Health,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<Health>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain_total: Option<Health>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain_theoretical: Option<Health>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_profit: Option<Health>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_total: Option<Health>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_24h: Option<Health>,
}

impl KpiHealth {
    pub fn from_kpis(kpis: &Kpis, max_age: Duration) -> Self {
        Self {
            freshness: Health::freshness(kpis.staleness(), max_age),
            risk: kpis.risk_ratio.map(Health::risk),
            gain_total: kpis.gain_total.map(Health::gain),
            gain_theoretical: kpis.gain_theoretical.map(Health::gain),
            pending_profit: kpis.pending_profit.map(Health::pending),
            market_total: kpis.market_total.map(Health::market),
            market_24h: kpis.market_24h.map(Health::market),
        }
    }
}

impl PositionSnapshot {
    /// `(gain, loss)` halves of the pending profit for dual-colored bars
    ///
    /// Exactly one side is set when the profit is present.
    pub fn profit_split(&self) -> (Option<f64>, Option<f64>) {
        match self.pending_profit {
            Some(p) if p >= 0.0 => (Some(p), None),
            Some(p) => (None, Some(p)),
            None => (None, None),
        }
    }
}
