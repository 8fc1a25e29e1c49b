//! Core data types for the monitoring feed

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Column names of the monitoring feed
pub mod columns {
    pub const TIMESTAMP: &str = "timestamp";
    pub const TOT_USDC: &str = "tot_usdc";
    pub const GAIN_THEORETICAL: &str = "gain_theoretical";
    pub const USDC_INVESTED: &str = "usdc_invested";
    pub const USDC_BORROWED: &str = "usdc_borrowed";
    pub const PENDING_PROFIT: &str = "pending_profit";
    pub const USDC_THRESHOLD: &str = "usdc_threshold";
    pub const ACCURACY: &str = "accuracy";
    pub const TAX: &str = "tax";
    pub const TOTAL_FEES_USDC: &str = "total_fees_usdc";
    pub const INTEREST_FEES_USDC: &str = "interest_fees_usdc";
    pub const PRICE_BTC: &str = "price_btc";
    pub const MEAN_PRICE_DIFF: &str = "mean_price_diff";
    pub const NB_SIGNALS: &str = "nb_y2h_less_1_percent";
    pub const NB_BORROWABLE_SIGNALS: &str = "nb_borrowable_y2h_less_1_percent";
    pub const ASSET: &str = "asset";

    /// Numeric monitoring columns, each backed by a `MonitoringSnapshot` field
    pub const NUMERIC: [&str; 14] = [
        TOT_USDC,
        GAIN_THEORETICAL,
        USDC_INVESTED,
        USDC_BORROWED,
        PENDING_PROFIT,
        USDC_THRESHOLD,
        ACCURACY,
        TAX,
        TOTAL_FEES_USDC,
        INTEREST_FEES_USDC,
        PRICE_BTC,
        MEAN_PRICE_DIFF,
        NB_SIGNALS,
        NB_BORROWABLE_SIGNALS,
    ];
}

/// One row of the monitoring feed, appended by the bot every polling interval
///
/// Numeric fields are `None` when the column is absent from the feed or the
/// cell could not be coerced to a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringSnapshot {
    pub timestamp: DateTime<Utc>,
    /// Total account balance
    pub tot_usdc: Option<f64>,
    /// Strategy's own profit estimate (rebased per window once normalized)
    pub gain_theoretical: Option<f64>,
    pub usdc_invested: Option<f64>,
    pub usdc_borrowed: Option<f64>,
    /// Unrealized profit on open positions
    pub pending_profit: Option<f64>,
    /// Balance floor the account must stay above
    pub usdc_threshold: Option<f64>,
    pub accuracy: Option<f64>,
    pub tax: Option<f64>,
    pub total_fees_usdc: Option<f64>,
    /// Only reported in margin mode
    pub interest_fees_usdc: Option<f64>,
    pub price_btc: Option<f64>,
    /// Per-interval market differential, not cumulative
    pub mean_price_diff: Option<f64>,
    pub nb_signals: Option<f64>,
    pub nb_borrowable_signals: Option<f64>,
}

impl MonitoringSnapshot {
    /// A snapshot with every numeric field missing
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            tot_usdc: None,
            gain_theoretical: None,
            usdc_invested: None,
            usdc_borrowed: None,
            pending_profit: None,
            usdc_threshold: None,
            accuracy: None,
            tax: None,
            total_fees_usdc: None,
            interest_fees_usdc: None,
            price_btc: None,
            mean_price_diff: None,
            nb_signals: None,
            nb_borrowable_signals: None,
        }
    }

    /// Builder helper for the balance columns
    pub fn with_balance(mut self, tot_usdc: f64, usdc_threshold: f64) -> Self {
        self.tot_usdc = Some(tot_usdc);
        self.usdc_threshold = Some(usdc_threshold);
        self
    }

    /// Builder helper for the fee columns
    pub fn with_fees(mut self, total: f64, interest: Option<f64>) -> Self {
        self.total_fees_usdc = Some(total);
        self.interest_fees_usdc = interest;
        self
    }

    /// Mutable access to a numeric field by feed column name
    pub fn field_mut(&mut self, column: &str) -> Option<&mut Option<f64>> {
        let field = match column {
            columns::TOT_USDC => &mut self.tot_usdc,
            columns::GAIN_THEORETICAL => &mut self.gain_theoretical,
            columns::USDC_INVESTED => &mut self.usdc_invested,
            columns::USDC_BORROWED => &mut self.usdc_borrowed,
            columns::PENDING_PROFIT => &mut self.pending_profit,
            columns::USDC_THRESHOLD => &mut self.usdc_threshold,
            columns::ACCURACY => &mut self.accuracy,
            columns::TAX => &mut self.tax,
            columns::TOTAL_FEES_USDC => &mut self.total_fees_usdc,
            columns::INTEREST_FEES_USDC => &mut self.interest_fees_usdc,
            columns::PRICE_BTC => &mut self.price_btc,
            columns::MEAN_PRICE_DIFF => &mut self.mean_price_diff,
            columns::NB_SIGNALS => &mut self.nb_signals,
            columns::NB_BORROWABLE_SIGNALS => &mut self.nb_borrowable_signals,
            _ => return None,
        };
        Some(field)
    }
}

/// Set of feed columns that were present in the header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSet(BTreeSet<String>);

impl ColumnSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every column the monitoring feed can carry
    pub fn full() -> Self {
        std::iter::once(columns::TIMESTAMP)
            .chain(columns::NUMERIC)
            .collect()
    }

    pub fn insert(&mut self, column: impl Into<String>) {
        self.0.insert(column.into());
    }

    pub fn remove(&mut self, column: &str) {
        self.0.remove(column);
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Time-ordered monitoring rows plus the columns the feed carried
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitoringSeries {
    pub columns: ColumnSet,
    pub rows: Vec<MonitoringSnapshot>,
}

impl MonitoringSeries {
    /// Create a series, sorting rows by timestamp
    ///
    /// The sort is stable so rows sharing a timestamp keep their feed order.
    pub fn new(columns: ColumnSet, mut rows: Vec<MonitoringSnapshot>) -> Self {
        rows.sort_by_key(|r| r.timestamp);
        Self { columns, rows }
    }

    /// A series carrying every known column
    pub fn with_all_columns(rows: Vec<MonitoringSnapshot>) -> Self {
        Self::new(ColumnSet::full(), rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&MonitoringSnapshot> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&MonitoringSnapshot> {
        self.rows.last()
    }

    /// Most recent timestamp in the series
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.rows.iter().map(|r| r.timestamp).max()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    /// Values of one numeric field, in row order
    pub fn values<F>(&self, field: F) -> Vec<Option<f64>>
    where
        F: Fn(&MonitoringSnapshot) -> Option<f64>,
    {
        self.rows.iter().map(field).collect()
    }
}

/// One held asset in the current positions snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub asset: String,
    pub usdc_borrowed: Option<f64>,
    pub usdc_invested: Option<f64>,
    /// Signed unrealized profit, never pre-split
    pub pending_profit: Option<f64>,
}

impl PositionSnapshot {
    pub fn new(
        asset: impl Into<String>,
        usdc_borrowed: f64,
        usdc_invested: f64,
        pending_profit: f64,
    ) -> Self {
        Self {
            asset: asset.into(),
            usdc_borrowed: Some(usdc_borrowed),
            usdc_invested: Some(usdc_invested),
            pending_profit: Some(pending_profit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_series_sorted_on_construction() {
        let rows = vec![
            MonitoringSnapshot::empty(at(3)).with_balance(3.0, 0.0),
            MonitoringSnapshot::empty(at(1)).with_balance(1.0, 0.0),
            MonitoringSnapshot::empty(at(2)).with_balance(2.0, 0.0),
        ];
        let series = MonitoringSeries::with_all_columns(rows);

        assert_eq!(series.first().unwrap().timestamp, at(1));
        assert_eq!(series.latest_timestamp(), Some(at(3)));
        assert_eq!(
            series.values(|r| r.tot_usdc),
            vec![Some(1.0), Some(2.0), Some(3.0)]
        );
    }

    #[test]
    fn test_field_mut_by_column_name() {
        let mut row = MonitoringSnapshot::empty(at(0));
        *row.field_mut(columns::PRICE_BTC).unwrap() = Some(42_000.0);
        assert_eq!(row.price_btc, Some(42_000.0));
        assert!(row.field_mut("unknown_column").is_none());
        assert!(row.field_mut(columns::TIMESTAMP).is_none());
    }

    #[test]
    fn test_column_set() {
        let mut set = ColumnSet::full();
        assert!(set.contains(columns::INTEREST_FEES_USDC));
        set.remove(columns::INTEREST_FEES_USDC);
        assert!(!set.contains(columns::INTEREST_FEES_USDC));
        assert!(!ColumnSet::new().contains(columns::TOT_USDC));
    }

    #[test]
    fn test_every_numeric_column_has_a_field() {
        let full = ColumnSet::full();
        let mut row = MonitoringSnapshot::empty(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        for name in columns::NUMERIC {
            assert!(full.contains(name), "{} missing from full set", name);
            assert!(row.field_mut(name).is_some(), "{} has no field", name);
        }
        assert!(full.contains(columns::TIMESTAMP));
        assert!(row.field_mut(columns::TIMESTAMP).is_none());
        assert!(row.field_mut(columns::ASSET).is_none());
    }
}
