//! Per-row derived columns for the dashboard charts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rolling;
use super::types::{columns, MonitoringSeries};

/// Derived values for one row of a normalized window
///
/// Fields are `None` where the source column is absent or the source cell is
/// missing; they serialize as `null` so every chart column stays aligned
/// with `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    /// Rebased theoretical gain
    pub gain_theoretical: Option<f64>,
    /// Balance minus the window's first balance
    pub balance_change: Option<f64>,
    /// Highest balance seen so far in the window
    pub max_balance: Option<f64>,
    pub usdc_borrowed: Option<f64>,
    pub borrowed_ma: Option<f64>,
    pub usdc_invested: Option<f64>,
    pub invested_ma: Option<f64>,
    /// BTC price change since window start, in percent
    pub btc_change: Option<f64>,
    /// Cumulative market differential, in percent
    pub market_change: Option<f64>,
    /// Balance change since window start, in percent
    pub real_profit_pct: Option<f64>,
    pub btc_change_smoothed: Option<f64>,
    pub market_change_smoothed: Option<f64>,
    pub real_profit_smoothed: Option<f64>,
    /// Accuracy in percent
    pub accuracy_pct: Option<f64>,
    pub total_fees_cum: Option<f64>,
    pub interest_fees_cum: Option<f64>,
    pub transaction_fees_cum: Option<f64>,
    /// Mean number of sharp signals per interval
    pub signal_rate: Option<f64>,
    /// Share of sharp signals that were borrowable
    pub borrow_probability: Option<f64>,
}

/// Per-row `100 * cumsum(mean_price_diff)`
pub fn market_change(window: &MonitoringSeries) -> Vec<Option<f64>> {
    rolling::cumsum(&window.values(|r| r.mean_price_diff))
        .into_iter()
        .map(|v| v.map(|x| x * 100.0))
        .collect()
}

/// Per-row `100 * (price_btc / price_btc[first] - 1)`
pub fn btc_change(window: &MonitoringSeries) -> Vec<Option<f64>> {
    rolling::pct_change_from_first(&window.values(|r| r.price_btc))
}

/// Per-row `100 * (tot_usdc / tot_usdc[first] - 1)`
pub fn real_profit_pct(window: &MonitoringSeries) -> Vec<Option<f64>> {
    rolling::pct_change_from_first(&window.values(|r| r.tot_usdc))
}

/// Derive the chart series of a normalized window
pub fn derive_chart(window: &MonitoringSeries) -> Vec<ChartPoint> {
    let balance = window.values(|r| r.tot_usdc);
    let balance_base = rolling::first_present(&balance);
    let borrowed = window.values(|r| r.usdc_borrowed);
    let invested = window.values(|r| r.usdc_invested);

    let btc = btc_change(window);
    let market = market_change(window);
    let real_profit = real_profit_pct(window);
    let width = rolling::smoothing_width(window.len());

    let total_fees = rolling::cumsum(&window.values(|r| r.total_fees_usdc));
    let interest_fees = if window.has_column(columns::INTEREST_FEES_USDC) {
        rolling::cumsum(&window.values(|r| r.interest_fees_usdc))
    } else {
        vec![Some(0.0); window.len()]
    };
    let transaction_fees: Vec<Option<f64>> = total_fees
        .iter()
        .zip(&interest_fees)
        .map(|(t, i)| Some((*t)? - (*i)?))
        .collect();

    let signals = window.values(|r| r.nb_signals);
    let signal_cum = rolling::cumsum(&signals);
    let borrowable_cum = rolling::cumsum(&window.values(|r| r.nb_borrowable_signals));

    let columns = ChartColumns {
        balance_change: balance
            .iter()
            .map(|v| Some((*v)? - balance_base?))
            .collect(),
        max_balance: rolling::running_max(&balance),
        borrowed_ma: rolling::cumulative_mean(&borrowed),
        invested_ma: rolling::cumulative_mean(&invested),
        btc_change_smoothed: rolling::rolling_mean(&btc, width),
        market_change_smoothed: rolling::rolling_mean(&market, width),
        real_profit_smoothed: rolling::rolling_mean(&real_profit, width),
        signal_rate: rolling::cumulative_mean(&signals),
        borrow_probability: rolling::ratio(&borrowable_cum, &signal_cum),
        btc_change: btc,
        market_change: market,
        real_profit_pct: real_profit,
        total_fees_cum: total_fees,
        interest_fees_cum: interest_fees,
        transaction_fees_cum: transaction_fees,
    };

    window
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| ChartPoint {
            timestamp: row.timestamp,
            gain_theoretical: row.gain_theoretical,
            balance_change: columns.balance_change[i],
            max_balance: columns.max_balance[i],
            usdc_borrowed: row.usdc_borrowed,
            borrowed_ma: columns.borrowed_ma[i],
            usdc_invested: row.usdc_invested,
            invested_ma: columns.invested_ma[i],
            btc_change: columns.btc_change[i],
            market_change: columns.market_change[i],
            real_profit_pct: columns.real_profit_pct[i],
            btc_change_smoothed: columns.btc_change_smoothed[i],
            market_change_smoothed: columns.market_change_smoothed[i],
            real_profit_smoothed: columns.real_profit_smoothed[i],
            accuracy_pct: row.accuracy.map(|a| a * 100.0),
            total_fees_cum: columns.total_fees_cum[i],
            interest_fees_cum: columns.interest_fees_cum[i],
            transaction_fees_cum: columns.transaction_fees_cum[i],
            signal_rate: columns.signal_rate[i],
            borrow_probability: columns.borrow_probability[i],
        })
        .collect()
}

struct ChartColumns {
    balance_change: Vec<Option<f64>>,
    max_balance: Vec<Option<f64>>,
    borrowed_ma: Vec<Option<f64>>,
    invested_ma: Vec<Option<f64>>,
    btc_change: Vec<Option<f64>>,
    market_change: Vec<Option<f64>>,
    real_profit_pct: Vec<Option<f64>>,
    btc_change_smoothed: Vec<Option<f64>>,
    market_change_smoothed: Vec<Option<f64>>,
    real_profit_smoothed: Vec<Option<f64>>,
    total_fees_cum: Vec<Option<f64>>,
    interest_fees_cum: Vec<Option<f64>>,
    transaction_fees_cum: Vec<Option<f64>>,
    signal_rate: Vec<Option<f64>>,
    borrow_probability: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::types::{ColumnSet, MonitoringSnapshot};
    use chrono::{Duration, TimeZone};

    fn series(balances: &[f64], prices: &[f64]) -> MonitoringSeries {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let rows = balances
            .iter()
            .zip(prices)
            .enumerate()
            .map(|(i, (b, p))| {
                let mut row = MonitoringSnapshot::empty(start + Duration::minutes(5 * i as i64))
                    .with_balance(*b, 800.0)
                    .with_fees(0.5, Some(0.25));
                row.price_btc = Some(*p);
                row.mean_price_diff = Some(0.01);
                row.usdc_borrowed = Some(100.0 * (i + 1) as f64);
                row.nb_signals = Some(4.0);
                row.nb_borrowable_signals = Some(1.0);
                row
            })
            .collect();
        MonitoringSeries::with_all_columns(rows)
    }

    #[test]
    fn test_market_comparison_columns() {
        let window = series(&[1000.0, 1100.0, 900.0], &[50_000.0, 55_000.0, 45_000.0]);
        let chart = derive_chart(&window);

        assert_eq!(chart.len(), 3);
        assert_eq!(chart[0].btc_change, Some(0.0));
        assert!((chart[1].btc_change.unwrap() - 10.0).abs() < 1e-9);
        assert!((chart[2].real_profit_pct.unwrap() + 10.0).abs() < 1e-9);
        assert!((chart[2].market_change.unwrap() - 3.0).abs() < 1e-9);
        // fewer than 1000 rows: smoothing is the identity
        assert_eq!(chart[1].btc_change_smoothed, chart[1].btc_change);
    }

    #[test]
    fn test_balance_columns() {
        let window = series(&[1000.0, 1100.0, 900.0], &[1.0, 1.0, 1.0]);
        let chart = derive_chart(&window);

        assert_eq!(chart[2].balance_change, Some(-100.0));
        assert_eq!(chart[2].max_balance, Some(1100.0));
        assert_eq!(chart[2].borrowed_ma, Some(200.0));
    }

    #[test]
    fn test_fee_cumulatives_decompose() {
        let window = series(&[1.0, 1.0, 1.0, 1.0], &[1.0, 1.0, 1.0, 1.0]);
        let chart = derive_chart(&window);
        let last = chart.last().unwrap();

        assert_eq!(last.total_fees_cum, Some(2.0));
        assert_eq!(last.interest_fees_cum, Some(1.0));
        assert_eq!(last.transaction_fees_cum, Some(1.0));
    }

    #[test]
    fn test_interest_column_absent_defaults_to_zero() {
        let mut window = series(&[1.0, 1.0], &[1.0, 1.0]);
        let mut cols = ColumnSet::full();
        cols.remove(columns::INTEREST_FEES_USDC);
        window.columns = cols;
        for row in &mut window.rows {
            row.interest_fees_usdc = None;
        }
        let chart = derive_chart(&window);

        assert_eq!(chart[1].interest_fees_cum, Some(0.0));
        assert_eq!(chart[1].transaction_fees_cum, chart[1].total_fees_cum);
    }

    #[test]
    fn test_signal_columns() {
        let window = series(&[1.0, 1.0], &[1.0, 1.0]);
        let chart = derive_chart(&window);

        assert_eq!(chart[1].signal_rate, Some(4.0));
        assert_eq!(chart[1].borrow_probability, Some(0.25));
    }
}
