//! CSV decoding with locale-tolerant numeric coercion

use std::collections::HashMap;
use std::io::Read;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::{debug, warn};

use crate::monitor::types::{columns, ColumnSet, MonitoringSeries, MonitoringSnapshot, PositionSnapshot};
use crate::monitor::{MonitorError, MonitorResult};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
];

/// Coerce a feed cell to a number
///
/// A comma is accepted as decimal separator. Empty, unparseable and
/// non-finite cells are missing.
pub fn coerce_number(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    cell.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Parse a feed timestamp; naive values are taken as UTC
pub fn parse_timestamp(cell: &str) -> Option<DateTime<Utc>> {
    let cell = cell.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(cell) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(cell, format) {
            return Some(ts.and_utc());
        }
    }
    NaiveDate::parse_from_str(cell, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
}

fn reader<R: Read>(source: R, delimiter: u8) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source)
}

fn header_index(headers: &csv::ByteRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, name)| (String::from_utf8_lossy(name).trim().to_string(), i))
        .collect()
}

/// A cell as text; invalid UTF-8 reads as a missing cell
fn text(record: &csv::ByteRecord, i: usize) -> Option<&str> {
    record.get(i).and_then(|cell| std::str::from_utf8(cell).ok())
}

/// Decode the monitoring feed
///
/// The `timestamp` column is required. Unknown columns are ignored, rows
/// with an unparseable timestamp are skipped, and rows are returned sorted
/// by timestamp.
pub fn read_monitoring<R: Read>(source: R, delimiter: u8) -> MonitorResult<MonitoringSeries> {
    let mut rdr = reader(source, delimiter);
    let index = header_index(rdr.byte_headers()?);

    let ts_col = *index.get(columns::TIMESTAMP).ok_or_else(|| {
        MonitorError::FetchFailure("monitoring feed has no 'timestamp' column".into())
    })?;

    let numeric: Vec<(&str, usize)> = columns::NUMERIC
        .iter()
        .filter_map(|name| index.get(*name).map(|i| (*name, *i)))
        .collect();
    let present: ColumnSet = std::iter::once(columns::TIMESTAMP)
        .chain(numeric.iter().map(|(name, _)| *name))
        .collect();

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for record in rdr.byte_records() {
        let record = record?;
        let Some(timestamp) = text(&record, ts_col).and_then(parse_timestamp) else {
            skipped += 1;
            continue;
        };
        let mut row = MonitoringSnapshot::empty(timestamp);
        for (name, i) in &numeric {
            if let Some(field) = row.field_mut(name) {
                *field = text(&record, *i).and_then(coerce_number);
            }
        }
        rows.push(row);
    }

    if skipped > 0 {
        warn!("Skipped {} monitoring rows with an unparseable timestamp", skipped);
    }
    debug!(
        "Decoded {} monitoring rows ({} numeric columns)",
        rows.len(),
        numeric.len()
    );

    Ok(MonitoringSeries::new(present, rows))
}

/// Decode the positions snapshot; the `asset` column is required
pub fn read_positions<R: Read>(source: R, delimiter: u8) -> MonitorResult<Vec<PositionSnapshot>> {
    let mut rdr = reader(source, delimiter);
    let index = header_index(rdr.byte_headers()?);

    let asset_col = *index.get(columns::ASSET).ok_or_else(|| {
        MonitorError::FetchFailure("positions feed has no 'asset' column".into())
    })?;
    let cell = |record: &csv::ByteRecord, name: &str| {
        index
            .get(name)
            .and_then(|i| text(record, *i))
            .and_then(coerce_number)
    };

    let mut positions = Vec::new();
    for record in rdr.byte_records() {
        let record = record?;
        let Some(asset) = text(&record, asset_col).map(str::trim).filter(|a| !a.is_empty()) else {
            continue;
        };
        positions.push(PositionSnapshot {
            asset: asset.to_string(),
            usdc_borrowed: cell(&record, columns::USDC_BORROWED),
            usdc_invested: cell(&record, columns::USDC_INVESTED),
            pending_profit: cell(&record, columns::PENDING_PROFIT),
        });
    }

    debug!("Decoded {} positions", positions.len());
    Ok(positions)
}
