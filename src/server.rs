use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;

use crate::monitor::{MonitorError, Period};
use crate::runner::{evaluate, MonitorState, StatusReport};

type AppState = Arc<MonitorState>;

/// Start the status API server
pub(crate) async fn start_server(state: AppState, port: u16, host: String) -> std::io::Result<()> {
    let addr_str = format!("{}:{}", host, port);
    let addr: SocketAddr = addr_str.parse().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Invalid address {}: {}", addr_str, e),
        )
    })?;

    info!("Status server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/report", get(report_handler))
        .route("/api/periods", get(periods_handler))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReportQuery {
    period: Option<String>,
}

/// API error wrapper mapping pipeline errors to HTTP statuses
#[derive(Debug)]
pub(crate) struct ApiError(MonitorError);

impl From<MonitorError> for ApiError {
    fn from(err: MonitorError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            MonitorError::InvalidPeriod(_) => StatusCode::BAD_REQUEST,
            MonitorError::EmptyWindow { .. } => StatusCode::NOT_FOUND,
            MonitorError::FetchFailure(_) | MonitorError::NoData => StatusCode::SERVICE_UNAVAILABLE,
            MonitorError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({
            "error": self.0.to_string(),
            "no_data": self.0.is_no_data(),
        });
        (status, Json(body)).into_response()
    }
}

async fn report_handler(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<StatusReport>, ApiError> {
    let period = match query.period.as_deref() {
        Some(label) => label.parse::<Period>()?,
        None => state.monitor.default_period,
    };

    match evaluate(state.feed.as_ref(), &state.monitor, period, Utc::now()).await {
        Ok(status) => Ok(Json(status)),
        Err(e) => {
            warn!("Report for period '{}' failed: {}", period, e);
            Err(e.into())
        }
    }
}

async fn periods_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let periods: Vec<&str> = Period::ALL.iter().map(Period::label).collect();
    Json(json!({
        "periods": periods,
        "default": state.monitor.default_period,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use crate::monitor::MonitoringSeries;
    use crate::runner::tests::{sample_feed, StaticFeed};

    fn state(feed: StaticFeed) -> AppState {
        Arc::new(MonitorState {
            feed: Box::new(feed),
            monitor: MonitorConfig::default(),
        })
    }

    #[tokio::test]
    async fn test_report_handler_all_period() {
        let query = ReportQuery {
            period: Some("all".into()),
        };
        let Json(status) = report_handler(State(state(sample_feed())), Query(query))
            .await
            .unwrap();

        assert_eq!(status.report.period, Period::All);
        assert_eq!(status.report.window.len(), 49);
        assert_eq!(status.report.kpis.total_fees, Some(24.5));
    }

    #[tokio::test]
    async fn test_report_handler_rejects_unknown_period() {
        let query = ReportQuery {
            period: Some("fortnight".into()),
        };
        let err = report_handler(State(state(sample_feed())), Query(query))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_report_handler_no_data() {
        let feed = StaticFeed {
            series: MonitoringSeries::default(),
            positions: vec![],
        };
        let err = report_handler(State(state(feed)), Query(ReportQuery::default()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_empty_window_maps_to_not_found() {
        let err = ApiError::from(MonitorError::EmptyWindow {
            period: Period::SixHours,
        });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_periods_handler() {
        let Json(body) = periods_handler(State(state(sample_feed()))).await;
        assert_eq!(body["periods"].as_array().unwrap().len(), 8);
        assert_eq!(body["periods"][0], "6h");
        assert_eq!(body["default"], "1 week");
    }
}
