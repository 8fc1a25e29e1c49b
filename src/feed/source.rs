//! Feed sources: local CSV files or remote CSV exports

use std::path::PathBuf;

use async_trait::async_trait;
use log::{debug, info};

use super::decode::{read_monitoring, read_positions};
use crate::monitor::{MonitorResult, MonitoringSeries, PositionSnapshot};

/// Source of the two tables the pipeline consumes
///
/// Implementations fetch afresh on every call; there is no caching layer.
#[async_trait]
pub trait Feed: Send + Sync {
    /// Fetch and decode the monitoring time series
    async fn fetch_monitoring(&self) -> MonitorResult<MonitoringSeries>;

    /// Fetch and decode the current positions snapshot
    async fn fetch_positions(&self) -> MonitorResult<Vec<PositionSnapshot>>;

    /// Short description for logging
    fn describe(&self) -> String {
        "feed".to_string()
    }
}

/// Fetch both tables concurrently
///
/// Fails as soon as either fetch fails; the pipeline then never runs.
pub async fn fetch_tables<F: Feed + ?Sized>(
    feed: &F,
) -> MonitorResult<(MonitoringSeries, Vec<PositionSnapshot>)> {
    let (series, positions) =
        futures_util::future::try_join(feed.fetch_monitoring(), feed.fetch_positions()).await?;
    debug!(
        "Fetched {} monitoring rows and {} positions from {}",
        series.len(),
        positions.len(),
        feed.describe()
    );
    Ok((series, positions))
}

/// Two CSV files on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalFeed {
    monitoring: PathBuf,
    positions: PathBuf,
    delimiter: u8,
}

impl LocalFeed {
    pub fn new(monitoring: impl Into<PathBuf>, positions: impl Into<PathBuf>, delimiter: u8) -> Self {
        Self {
            monitoring: monitoring.into(),
            positions: positions.into(),
            delimiter,
        }
    }
}

#[async_trait]
impl Feed for LocalFeed {
    async fn fetch_monitoring(&self) -> MonitorResult<MonitoringSeries> {
        let bytes = tokio::fs::read(&self.monitoring).await?;
        read_monitoring(bytes.as_slice(), self.delimiter)
    }

    async fn fetch_positions(&self) -> MonitorResult<Vec<PositionSnapshot>> {
        let bytes = tokio::fs::read(&self.positions).await?;
        read_positions(bytes.as_slice(), self.delimiter)
    }

    fn describe(&self) -> String {
        format!(
            "local files {} / {}",
            self.monitoring.display(),
            self.positions.display()
        )
    }
}

/// Two CSV exports served over HTTP (e.g. a published spreadsheet)
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: reqwest::Client,
    monitoring_url: String,
    positions_url: String,
    delimiter: u8,
}

impl HttpFeed {
    pub fn new(monitoring_url: impl Into<String>, positions_url: impl Into<String>, delimiter: u8) -> Self {
        Self {
            client: reqwest::Client::new(),
            monitoring_url: monitoring_url.into(),
            positions_url: positions_url.into(),
            delimiter,
        }
    }

    async fn download(&self, url: &str) -> MonitorResult<String> {
        info!("Fetching {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Feed for HttpFeed {
    async fn fetch_monitoring(&self) -> MonitorResult<MonitoringSeries> {
        let body = self.download(&self.monitoring_url).await?;
        read_monitoring(body.as_bytes(), self.delimiter)
    }

    async fn fetch_positions(&self) -> MonitorResult<Vec<PositionSnapshot>> {
        let body = self.download(&self.positions_url).await?;
        read_positions(body.as_bytes(), self.delimiter)
    }

    fn describe(&self) -> String {
        format!("remote export {}", self.monitoring_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::MonitorError;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_local_feed_fetches_both_tables() {
        let monitoring = write_csv(
            "timestamp;tot_usdc;usdc_threshold\n2024-02-03 10:00:00;1000;800\n2024-02-03 10:05:00;1010,5;800\n",
        );
        let positions = write_csv("asset;usdc_borrowed;usdc_invested;pending_profit\nBTC;0;250;1,5\n");
        let feed = LocalFeed::new(monitoring.path(), positions.path(), b';');

        let (series, positions) = fetch_tables(&feed).await.unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.last().unwrap().tot_usdc, Some(1010.5));
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].pending_profit, Some(1.5));
    }

    #[tokio::test]
    async fn test_missing_file_is_fetch_failure() {
        let positions = write_csv("asset\nBTC\n");
        let feed = LocalFeed::new("/nonexistent/monitoring.csv", positions.path(), b',');

        let err = fetch_tables(&feed).await.unwrap_err();
        assert!(matches!(err, MonitorError::FetchFailure(_)));
        assert!(err.is_no_data());
    }

    #[tokio::test]
    async fn test_unreachable_remote_is_fetch_failure() {
        let feed = HttpFeed::new("http://127.0.0.1:9/monitoring.csv", "http://127.0.0.1:9/positions.csv", b',');
        let err = feed.fetch_monitoring().await.unwrap_err();
        assert!(matches!(err, MonitorError::FetchFailure(_)));
    }
}
