//! Feed Module
//!
//! Loads the monitoring time series and the positions snapshot the bot
//! publishes, either as local CSV files or as remote CSV exports.
//!
//! Numeric cells may use a comma decimal separator; cells that cannot be
//! coerced become missing values instead of failing the load.

mod decode;
mod source;

pub use decode::{coerce_number, parse_timestamp, read_monitoring, read_positions};
pub use source::{fetch_tables, Feed, HttpFeed, LocalFeed};

use crate::config::{FeedConfig, FeedSource};

/// Build the feed described by the configuration
pub fn from_config(config: &FeedConfig) -> Box<dyn Feed> {
    let delimiter = config.delimiter_byte();
    match config.source {
        FeedSource::Local => Box::new(LocalFeed::new(
            &config.monitoring,
            &config.positions,
            delimiter,
        )),
        FeedSource::Remote => Box::new(HttpFeed::new(
            config.monitoring.clone(),
            config.positions.clone(),
            delimiter,
        )),
    }
}
