use crate::auth::CurrentUser;
use crate::dashboard::{DashboardError, DashboardService, DashboardState};
use axum::{
    Extension, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use citypulse_core::{DashboardStats, SlaAlert};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Successful dashboard payload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    success: bool,
    /// Status counts, category breakdown, recent activity and mean resolution time
    #[schema(value_type = Object)]
    stats: DashboardStats,
    /// Unresolved issues close to or past their deadline, soonest first
    #[schema(value_type = Vec<Object>)]
    sla_alerts: Vec<SlaAlert>,
    /// Share of resolved issues that met their deadline, in percent
    sla_compliance: Option<f64>,
}

/// Failed dashboard payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardErrorResponse {
    success: bool,
    error: String,
}

impl DashboardErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Query parameters for the dashboard.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DashboardQuery {
    /// Length of the recent activity window in days
    #[serde(default, rename = "windowDays")]
    window_days: Option<u32>,
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match &self {
            DashboardError::Unauthorized => StatusCode::UNAUTHORIZED,
            DashboardError::InvalidQuery(_) | DashboardError::InvalidWindow(_) => {
                StatusCode::BAD_REQUEST
            }
            DashboardError::Store(err) => {
                tracing::error!("Failed to fetch dashboard statistics: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(DashboardErrorResponse::new(self.to_string()))).into_response()
    }
}

/// Handler for GET /api/v1/dashboard - Returns live statistics for staff.
#[tracing::instrument(skip(state, current_user))]
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    params(
        ("windowDays" = Option<u32>, Query, description = "Recent activity window in days, 30 when omitted")
    ),
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardResponse),
        (status = 400, description = "Window cannot be represented", body = DashboardErrorResponse),
        (status = 401, description = "Not logged in", body = DashboardErrorResponse),
        (status = 500, description = "Issue store failure", body = DashboardErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn get_dashboard_handler(
    State(state): State<Arc<DashboardState>>,
    current_user: Option<Extension<CurrentUser>>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> Result<Json<DashboardResponse>, DashboardError> {
    let Some(Extension(user)) = current_user else {
        tracing::warn!("Rejected unauthenticated dashboard request");
        return Err(DashboardError::Unauthorized);
    };
    let Query(query) = query.map_err(|err| DashboardError::InvalidQuery(err.body_text()))?;

    let report = DashboardService::new(&state)
        .build_report(chrono::Utc::now(), query.window_days)
        .await?;
    tracing::debug!("Dashboard served to {}", user.username);

    Ok(Json(DashboardResponse {
        success: true,
        stats: report.stats,
        sla_alerts: report.sla_alerts,
        sla_compliance: report.sla_compliance,
    }))
}

/// Creates and returns the dashboard API router.
pub fn create_api_router(state: Arc<DashboardState>) -> Router {
    Router::new()
        .route("/dashboard", get(get_dashboard_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryIssueStore, IssueStore, MockIssueStore, StoreError};
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{TimeDelta, Utc};
    use citypulse_core::{Issue, IssueCategory, SlaPolicy};
    use tower::ServiceExt;

    fn dashboard_state(store: Arc<dyn IssueStore>) -> Arc<DashboardState> {
        Arc::new(DashboardState {
            store,
            window_days: 30,
            sla_policy: SlaPolicy::standard(),
            alert_threshold: TimeDelta::hours(48),
        })
    }

    fn staff_router(state: Arc<DashboardState>) -> Router {
        create_api_router(state).layer(Extension(CurrentUser::new("admin".to_string())))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn rejects_anonymous_requests_without_reading_store() {
        let mut store = MockIssueStore::new();
        store.expect_get_all().never();
        let app = create_api_router(dashboard_state(Arc::new(store)));

        let response = app.oneshot(get("/dashboard")).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Unauthorized - Please login");
    }

    #[tokio::test]
    async fn serves_statistics_to_staff() {
        let issue = Issue::reported(
            "1",
            "Broken light",
            "Flickering",
            IssueCategory::Streetlight,
            "Beach Road",
            Utc::now() - TimeDelta::hours(1),
        );
        let store = InMemoryIssueStore::with_issues(vec![issue]);
        let app = staff_router(dashboard_state(Arc::new(store)));

        let response = app.oneshot(get("/dashboard?windowDays=7")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["stats"]["totalIssues"], 1);
        assert_eq!(json["stats"]["openIssues"], 1);
        assert_eq!(json["stats"]["averageResolutionTime"], 0.0);
        assert_eq!(json["stats"]["categoryBreakdown"][0]["category"], "streetlight");
        assert_eq!(json["slaAlerts"][0]["issueId"], "1");
        assert_eq!(json["slaCompliance"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn rejects_window_that_cannot_be_represented() {
        let mut store = MockIssueStore::new();
        store.expect_get_all().never();
        let app = staff_router(dashboard_state(Arc::new(store)));

        let response = app
            .oneshot(get("/dashboard?windowDays=4294967295"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn rejects_malformed_window() {
        let app = staff_router(dashboard_state(Arc::new(InMemoryIssueStore::new())));

        let response = app.oneshot(get("/dashboard?windowDays=soon")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn reports_store_failure_as_generic_error() {
        let mut store = MockIssueStore::new();
        store
            .expect_get_all()
            .times(1)
            .returning(|| Err(StoreError::Unavailable("replica lag".to_string())));
        let app = staff_router(dashboard_state(Arc::new(store)));

        let response = app.oneshot(get("/dashboard")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Failed to fetch dashboard statistics");
    }
}
