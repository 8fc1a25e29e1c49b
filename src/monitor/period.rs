//! Selectable lookback periods

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::errors::MonitorError;

/// Lookback period offered by the dashboard's period selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    SixHours,
    TwelveHours,
    OneDay,
    TwoDays,
    OneWeek,
    TwoWeeks,
    OneMonth,
    All,
}

impl Period {
    /// Every selectable period, narrowest first
    pub const ALL: [Period; 8] = [
        Period::SixHours,
        Period::TwelveHours,
        Period::OneDay,
        Period::TwoDays,
        Period::OneWeek,
        Period::TwoWeeks,
        Period::OneMonth,
        Period::All,
    ];

    /// Display label, also accepted by `FromStr`
    pub fn label(&self) -> &'static str {
        match self {
            Period::SixHours => "6h",
            Period::TwelveHours => "12h",
            Period::OneDay => "1 day",
            Period::TwoDays => "2 days",
            Period::OneWeek => "1 week",
            Period::TwoWeeks => "2 weeks",
            Period::OneMonth => "1 month",
            Period::All => "all",
        }
    }

    /// Lookback in hours, `None` for an unbounded period
    pub fn hours(&self) -> Option<i64> {
        match self {
            Period::SixHours => Some(6),
            Period::TwelveHours => Some(12),
            Period::OneDay => Some(24),
            Period::TwoDays => Some(48),
            Period::OneWeek => Some(7 * 24),
            Period::TwoWeeks => Some(14 * 24),
            Period::OneMonth => Some(30 * 24),
            Period::All => None,
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        self.hours().map(Duration::hours)
    }

    /// Rows strictly after this instant belong to a window ending at `anchor`
    pub fn cutoff(&self, anchor: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.duration().and_then(|d| anchor.checked_sub_signed(d))
    }
}

impl Default for Period {
    fn default() -> Self {
        Period::OneWeek
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Period {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let period = match normalized.as_str() {
            "6h" => Period::SixHours,
            "12h" => Period::TwelveHours,
            "1 day" | "1d" | "24h" => Period::OneDay,
            "2 days" | "2d" | "48h" => Period::TwoDays,
            "1 week" | "1w" => Period::OneWeek,
            "2 weeks" | "2w" => Period::TwoWeeks,
            "1 month" | "1m" => Period::OneMonth,
            "all" => Period::All,
            _ => return Err(MonitorError::InvalidPeriod(s.to_string())),
        };
        Ok(period)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Instant a window is measured back from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowAnchor {
    /// Most recent timestamp in the series
    #[default]
    Latest,
    /// Wall clock at report time; a stale feed yields an empty window
    Now,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip_through_from_str() {
        for period in Period::ALL {
            assert_eq!(period.label().parse::<Period>().unwrap(), period);
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!("1w".parse::<Period>().unwrap(), Period::OneWeek);
        assert_eq!(" 1 Day ".parse::<Period>().unwrap(), Period::OneDay);
        assert_eq!("1m".parse::<Period>().unwrap(), Period::OneMonth);
        assert!(matches!(
            "3 days".parse::<Period>(),
            Err(MonitorError::InvalidPeriod(_))
        ));
    }

    #[test]
    fn test_all_is_unbounded() {
        assert!(Period::All.duration().is_none());
        assert!(Period::All.cutoff(Utc::now()).is_none());
        assert_eq!(Period::OneMonth.hours(), Some(720));
    }

    #[test]
    fn test_serde_uses_label() {
        let json = serde_json::to_string(&Period::TwoWeeks).unwrap();
        assert_eq!(json, "\"2 weeks\"");
        let period: Period = serde_json::from_str("\"6h\"").unwrap();
        assert_eq!(period, Period::SixHours);
        let anchor: WindowAnchor = serde_json::from_str("\"now\"").unwrap();
        assert_eq!(anchor, WindowAnchor::Now);
    }
}
