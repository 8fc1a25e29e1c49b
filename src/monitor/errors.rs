//! Monitor error types

use thiserror::Error;

use super::period::Period;

/// Errors that can occur while loading feeds or deriving metrics
///
/// Missing columns and unparseable cells are not errors: they surface as
/// `None` fields on the snapshot and omitted KPIs on the report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MonitorError {
    #[error("Feed fetch failed: {0}")]
    FetchFailure(String),

    #[error("No monitoring data available")]
    NoData,

    #[error("No data for period '{period}'")]
    EmptyWindow { period: Period },

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl MonitorError {
    /// Whether the caller should treat this as "no data" rather than "pick a wider period"
    pub fn is_no_data(&self) -> bool {
        matches!(self, MonitorError::FetchFailure(_) | MonitorError::NoData)
    }
}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        MonitorError::FetchFailure(err.to_string())
    }
}

impl From<csv::Error> for MonitorError {
    fn from(err: csv::Error) -> Self {
        MonitorError::FetchFailure(format!("CSV decode error: {}", err))
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        MonitorError::FetchFailure(err.to_string())
    }
}

/// Result type for monitor operations
pub type MonitorResult<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_data_classification() {
        assert!(MonitorError::NoData.is_no_data());
        assert!(MonitorError::FetchFailure("timeout".into()).is_no_data());
        assert!(!MonitorError::EmptyWindow {
            period: Period::SixHours
        }
        .is_no_data());
    }

    #[test]
    fn test_empty_window_message() {
        let err = MonitorError::EmptyWindow {
            period: Period::OneWeek,
        };
        assert_eq!(err.to_string(), "No data for period '1 week'");
    }
}
