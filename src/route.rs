use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    aggregator::{aggregate_parsed, aggregate_values},
    error::AppResult,
    file_reader::read_transactions,
    model::{
        request::{AggregateRequest, NowQuery},
        response::RevenueReport,
    },
    upstream::SalesClient,
    view_state::DashboardState,
};

#[derive(Clone)]
pub struct AppState {
    pub sales: Arc<SalesClient>,
    pub dashboard: Arc<Mutex<DashboardState>>,
}

impl AppState {
    pub fn new(sales: SalesClient) -> Self {
        Self {
            sales: Arc::new(sales),
            dashboard: Arc::new(Mutex::new(DashboardState::default())),
        }
    }
}

pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/revenue", get(get_revenue))
        .route("/revenue/aggregate", post(post_aggregate))
        .route("/revenue/import", post(post_import))
        .route("/revenue/state", get(get_dashboard_state))
        .fallback(handler_404)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                )),
        )
        .with_state(state)
}

pub async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "")
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Pulls the current transactions from the sales API and aggregates them.
pub async fn get_revenue(
    State(state): State<AppState>,
    Query(NowQuery { now }): Query<NowQuery>,
) -> AppResult<Json<RevenueReport>> {
    let generation = state.dashboard.lock().await.begin_refresh();
    info!(generation, base_url = state.sales.base_url(), "Refreshing revenue");

    let outcome = state
        .sales
        .fetch_transactions()
        .await
        .map(|records| aggregate_values(&records, now.unwrap_or_else(Utc::now)));

    let mut dashboard = state.dashboard.lock().await;
    match outcome {
        Ok(report) => {
            dashboard.complete(generation, Ok(report.clone()), Utc::now());
            Ok(Json(report))
        }
        Err(e) => {
            error!(generation, "Error refreshing revenue: {e}");
            dashboard.complete(generation, Err(e.to_string()), Utc::now());
            Err(e)
        }
    }
}

pub async fn post_aggregate(
    Json(request): Json<Option<AggregateRequest>>,
) -> Json<RevenueReport> {
    let AggregateRequest { transactions, now } = request.unwrap_or_default();
    let transactions = transactions.unwrap_or_default();
    info!(count = transactions.len(), now = ?now, "Received aggregation request");

    Json(aggregate_values(&transactions, now.unwrap_or_else(Utc::now)))
}

/// Aggregates a CSV export (`createdAt,adminEarning,payoutStatus[,id]`).
pub async fn post_import(
    Query(NowQuery { now }): Query<NowQuery>,
    body: String,
) -> Json<RevenueReport> {
    let report = aggregate_parsed(
        read_transactions(body.as_bytes()),
        now.unwrap_or_else(Utc::now),
    );
    info!(
        buckets = report.all_time_series.len(),
        skipped = report.diagnostics.skipped_count,
        "Imported CSV export"
    );
    Json(report)
}

pub async fn get_dashboard_state(State(state): State<AppState>) -> Json<DashboardState> {
    Json(state.dashboard.lock().await.clone())
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use axum::{
        Json, Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        routing::get,
    };
    use serde::de::DeserializeOwned;
    use serde_json::json;
    use tower::ServiceExt as _;

    use super::{AppState, router};
    use crate::{
        error::DataFormatError,
        model::response::RevenueReport,
        upstream::{SalesClient, test::spawn_upstream},
        view_state::{DashboardState, LoadStatus},
    };

    fn app(base_url: &str) -> (Router, AppState) {
        let sales = SalesClient::new(base_url, None, Duration::from_secs(5)).unwrap();
        let state = AppState::new(sales);
        (router(state.clone(), Duration::from_secs(10)), state)
    }

    async fn read_json<T: DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(uri: &str, content_type: &str, body: String) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_post_aggregate() {
        let (app, _) = app("http://127.0.0.1:9");
        let body = json!({
            "now": "2024-03-06T00:00:00Z",
            "transactions": [
                { "createdAt": "2024-03-04", "adminEarning": 10, "payoutStatus": "paid" },
                { "createdAt": "2024-03-04", "adminEarning": 5, "payoutStatus": "pending" },
                { "_id": "x", "createdAt": "???", "adminEarning": 1, "payoutStatus": "paid" }
            ]
        });

        let response = app
            .oneshot(post("/revenue/aggregate", "application/json", body.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let value: serde_json::Value = read_json(response).await;
        assert_eq!(value["weeklySeries"], json!([{ "date": "2024-03-04", "adminEarning": 15.0 }]));
        assert_eq!(value["summary"], json!({ "totalEarning": 15.0, "pendingPayout": 5.0 }));
        assert_eq!(value["diagnostics"]["skippedCount"], 1);
        assert_eq!(value["diagnostics"]["skipped"][0]["id"], "x");
        assert_eq!(
            value["diagnostics"]["skipped"][0]["reason"]["kind"],
            "invalidCreatedAt"
        );
    }

    #[tokio::test]
    async fn test_post_aggregate_null_and_invalid_bodies() {
        let (app, _) = app("http://127.0.0.1:9");

        let response = app
            .clone()
            .oneshot(post("/revenue/aggregate", "application/json", "null".into()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let report: RevenueReport = read_json(response).await;
        assert!(!report.has_data());
        assert_eq!(report.summary.total_earning, 0.0);

        let response = app
            .oneshot(post(
                "/revenue/aggregate",
                "application/json",
                json!({ "transactions": "not a list" }).to_string(),
            ))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_post_import() {
        let (app, _) = app("http://127.0.0.1:9");
        let csv = "createdAt,adminEarning,payoutStatus\n\
                   2024-03-05T08:00:00Z,2.5,pending\n\
                   2024-02-01,4,paid\n\
                   soon,1,paid\n";

        let response = app
            .oneshot(post(
                "/revenue/import?now=2024-03-06T12:00:00Z",
                "text/csv",
                csv.into(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let report: RevenueReport = read_json(response).await;
        assert_eq!(report.weekly_series.len(), 1);
        assert_eq!(report.all_time_series.len(), 2);
        assert_eq!(report.summary.total_earning, 6.5);
        assert_eq!(report.diagnostics.skipped[0].index, 2);
    }

    #[tokio::test]
    async fn test_get_revenue_records_dashboard_state() {
        let upstream = Router::new().route(
            "/sale",
            get(|| async {
                Json(json!([
                    { "createdAt": "2024-03-04T09:00:00Z", "adminEarning": 3, "payoutStatus": "pending" },
                    { "createdAt": "2023-11-20T09:00:00Z", "adminEarning": 7, "payoutStatus": "paid" }
                ]))
            }),
        );
        let base_url = spawn_upstream(upstream).await;
        let (app, state) = app(&base_url);

        let response = app
            .clone()
            .oneshot(
                Request::get("/revenue?now=2024-03-06T12:00:00Z")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let report: RevenueReport = read_json(response).await;
        assert_eq!(report.summary.total_earning, 10.0);
        assert_eq!(report.summary.pending_payout, 3.0);
        assert_eq!(report.weekly_series.len(), 1);

        let dashboard = state.dashboard.lock().await.clone();
        assert_eq!(dashboard.status, LoadStatus::Loaded);
        assert_eq!(dashboard.generation, 1);

        let response = app
            .oneshot(Request::get("/revenue/state").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let served: DashboardState = read_json(response).await;
        assert_eq!(served.report, Some(report));
    }

    #[tokio::test]
    async fn test_get_revenue_upstream_failure() {
        let upstream = Router::new().route(
            "/sale",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let base_url = spawn_upstream(upstream).await;
        let (app, state) = app(&base_url);

        let response = app
            .oneshot(Request::get("/revenue").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body: serde_json::Value = read_json(response).await;
        assert_eq!(body["code"], 502);

        let dashboard = state.dashboard.lock().await;
        assert_eq!(dashboard.status, LoadStatus::Failed);
        assert!(dashboard.error.as_deref().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_post_aggregate_skips_odd_elements() {
        let (app, _) = app("http://127.0.0.1:9");
        let body = json!({
            "now": "2024-03-06T12:00:00Z",
            "transactions": [
                { "createdAt": "2024-03-04", "adminEarning": 4, "payoutStatus": 3 },
                { "_id": "m1", "id": "m1", "createdAt": "2024-03-05", "adminEarning": 6, "payoutStatus": "pending" },
                42,
                { "createdAt": "2024-03-05", "adminEarning": 1, "payoutStatus": "paid" }
            ]
        });

        let response = app
            .oneshot(post("/revenue/aggregate", "application/json", body.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let report: RevenueReport = read_json(response).await;
        assert_eq!(report.summary.total_earning, 11.0);
        assert_eq!(report.summary.pending_payout, 6.0);
        assert_eq!(report.diagnostics.skipped_count, 1);
        assert_eq!(report.diagnostics.skipped[0].index, 2);
        assert!(matches!(
            report.diagnostics.skipped[0].reason,
            DataFormatError::MalformedRecord(_)
        ));
    }

    #[tokio::test]
    async fn test_get_revenue_with_odd_documents() {
        let upstream = Router::new().route(
            "/sale",
            get(|| async {
                Json(json!([
                    "not a sale",
                    { "_id": "a", "id": "a", "createdAt": "2024-03-05", "adminEarning": 2, "payoutStatus": "paid" },
                    { "_id": "b", "createdAt": "2024-03-05", "adminEarning": 3, "payoutStatus": false }
                ]))
            }),
        );
        let base_url = spawn_upstream(upstream).await;
        let (app, _) = app(&base_url);

        let response = app
            .oneshot(
                Request::get("/revenue?now=2024-03-06T12:00:00Z")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let report: RevenueReport = read_json(response).await;
        assert_eq!(report.summary.total_earning, 5.0);
        assert_eq!(report.diagnostics.skipped_count, 1);
        assert_eq!(report.diagnostics.skipped[0].index, 0);
    }

    #[tokio::test]
    async fn test_get_revenue_unexpected_payload() {
        let upstream = Router::new().route(
            "/sale",
            get(|| async { Json(json!({ "message": "Unauthorized" })) }),
        );
        let base_url = spawn_upstream(upstream).await;
        let (app, state) = app(&base_url);

        let response = app
            .oneshot(Request::get("/revenue").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let dashboard = state.dashboard.lock().await;
        assert_eq!(dashboard.status, LoadStatus::Failed);
        assert!(dashboard.report.is_none());
    }

    #[tokio::test]
    async fn test_slow_request_times_out() {
        let upstream = Router::new().route(
            "/sale",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!([]))
            }),
        );
        let base_url = spawn_upstream(upstream).await;
        let sales = SalesClient::new(base_url, None, Duration::from_secs(5)).unwrap();
        let app = router(AppState::new(sales), Duration::from_millis(50));

        let response = app
            .oneshot(Request::get("/revenue").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (app, _) = app("http://127.0.0.1:9");
        let response = app
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
