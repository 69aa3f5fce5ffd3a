use crate::auth::{CurrentUser, api::v1::require_auth_middleware};
use crate::issue::{IssueFilter, IssueService, IssueServiceError, IssueState, NewIssue};
use crate::web::api::ErrorResponse;
use axum::{
    Extension, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware::from_fn,
    response::{IntoResponse, Json, Response},
    routing::{get, patch},
};
use citypulse_core::{Coordinates, Issue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Geographic point as exchanged over the API.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
pub struct CoordinatesJson {
    pub lat: f64,
    pub lng: f64,
}

impl From<Coordinates> for CoordinatesJson {
    fn from(coordinates: Coordinates) -> Self {
        Self {
            lat: coordinates.lat,
            lng: coordinates.lng,
        }
    }
}

impl From<CoordinatesJson> for Coordinates {
    fn from(coordinates: CoordinatesJson) -> Self {
        Self {
            lat: coordinates.lat,
            lng: coordinates.lng,
        }
    }
}

/// JSON representation of an Issue for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueJson {
    /// Unique identifier of the issue
    pub id: String,
    pub title: String,
    pub description: String,
    /// Category name, e.g. `pothole` or `water_leak`
    pub category: String,
    /// One of `open`, `in-progress`, `resolved` or `closed`
    pub status: String,
    pub priority: String,
    pub location: String,
    pub coordinates: CoordinatesJson,
    pub photo_url: Option<String>,
    pub reported_by: String,
    pub votes: u32,
    /// RFC 3339 creation time
    pub created_at: String,
    pub updated_at: Option<String>,
    pub resolved_at: Option<String>,
}

impl From<Issue> for IssueJson {
    fn from(issue: Issue) -> Self {
        Self {
            id: issue.id,
            title: issue.title,
            description: issue.description,
            category: issue.category.into(),
            status: issue.status.into(),
            priority: issue.priority.as_str().to_string(),
            location: issue.location,
            coordinates: issue.coordinates.into(),
            photo_url: issue.photo_url,
            reported_by: issue.reported_by,
            votes: issue.votes,
            created_at: issue.created_at.into(),
            updated_at: issue.updated_at.map(String::from),
            resolved_at: issue.resolved_at.map(String::from),
        }
    }
}

/// API response for listing issues.
#[derive(Debug, Serialize, ToSchema)]
pub struct IssuesResponse {
    /// Issues matching the filters
    issues: Vec<IssueJson>,
    /// Number of issues returned
    total: usize,
}

/// Query parameters for filtering issues.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IssuesQuery {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

/// JSON request payload for reporting an issue.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportIssueRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub coordinates: Option<CoordinatesJson>,
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Defaults to `medium`
    #[serde(default)]
    pub priority: Option<String>,
}

impl From<ReportIssueRequest> for NewIssue {
    fn from(request: ReportIssueRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            category: request.category,
            location: request.location,
            coordinates: request.coordinates.map(Coordinates::from),
            photo_url: request.photo_url,
            priority: request.priority,
        }
    }
}

/// API response for a newly reported issue.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReportIssueResponse {
    message: String,
    issue: IssueJson,
}

/// JSON request payload for changing an issue's status.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: String,
}

impl IntoResponse for IssueServiceError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            IssueServiceError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            IssueServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            IssueServiceError::InvalidTransition(_) => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            IssueServiceError::Store(err) => {
                tracing::error!("Issue store failure: {}", err);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new(
                        "INTERNAL_ERROR",
                        "Failed to process issue request",
                    )),
                )
                    .into_response();
            }
        };
        (status, Json(ErrorResponse::new(error, &self.to_string()))).into_response()
    }
}

/// Handler for GET /api/v1/issues - Returns issues, optionally filtered.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/issues",
    params(
        ("status" = Option<String>, Query, description = "Only issues with this status"),
        ("category" = Option<String>, Query, description = "Only issues in this category")
    ),
    responses(
        (status = 200, description = "Successfully retrieved issues", body = IssuesResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Issues"
)]
pub async fn list_issues_handler(
    State(state): State<Arc<IssueState>>,
    Query(query): Query<IssuesQuery>,
) -> Result<Json<IssuesResponse>, IssueServiceError> {
    let service = IssueService::new(state.store.as_ref());
    let filter = IssueFilter {
        status: query.status,
        category: query.category,
    };

    let issues: Vec<IssueJson> = service
        .list_issues(&filter)
        .await?
        .into_iter()
        .map(IssueJson::from)
        .collect();
    let total = issues.len();

    Ok(Json(IssuesResponse { issues, total }))
}

/// Handler for POST /api/v1/issues - Reports a new issue.
#[tracing::instrument(skip(state, current_user, payload))]
#[utoipa::path(
    post,
    path = "/api/v1/issues",
    request_body = ReportIssueRequest,
    responses(
        (status = 201, description = "Issue reported", body = ReportIssueResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse)
    ),
    tag = "Issues"
)]
pub async fn report_issue_handler(
    State(state): State<Arc<IssueState>>,
    current_user: Option<Extension<CurrentUser>>,
    Json(payload): Json<ReportIssueRequest>,
) -> Result<(StatusCode, Json<ReportIssueResponse>), IssueServiceError> {
    let service = IssueService::new(state.store.as_ref());
    let reporter = current_user.map(|Extension(user)| user.username);

    let issue = service
        .report_issue(payload.into(), reporter.as_deref(), chrono::Utc::now())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReportIssueResponse {
            message: "Issue reported successfully".to_string(),
            issue: issue.into(),
        }),
    ))
}

/// Handler for GET /api/v1/issues/{id} - Returns a single issue.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/issues/{id}",
    params(("id" = String, Path, description = "Issue ID")),
    responses(
        (status = 200, description = "Issue found", body = IssueJson),
        (status = 404, description = "Issue not found", body = ErrorResponse)
    ),
    tag = "Issues"
)]
pub async fn get_issue_handler(
    State(state): State<Arc<IssueState>>,
    Path(id): Path<String>,
) -> Result<Json<IssueJson>, IssueServiceError> {
    let service = IssueService::new(state.store.as_ref());
    let issue = service.get_issue(&id).await?;
    Ok(Json(issue.into()))
}

/// Handler for PATCH /api/v1/issues/{id}/status - Moves an issue along its lifecycle.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    patch,
    path = "/api/v1/issues/{id}/status",
    params(("id" = String, Path, description = "Issue ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = IssueJson),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 404, description = "Issue not found", body = ErrorResponse),
        (status = 409, description = "Transition not allowed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Issues"
)]
pub async fn update_status_handler(
    State(state): State<Arc<IssueState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<IssueJson>, IssueServiceError> {
    let service = IssueService::new(state.store.as_ref());
    let issue = service
        .update_status(&id, &payload.status, chrono::Utc::now())
        .await?;
    Ok(Json(issue.into()))
}

/// Creates and returns the issues API router.
///
/// Reading and reporting issues is public; changing a status requires a
/// logged-in staff member.
pub fn create_api_router(state: Arc<IssueState>) -> Router {
    let public_routes = Router::new()
        .route("/issues", get(list_issues_handler).post(report_issue_handler))
        .route("/issues/{id}", get(get_issue_handler));
    let staff_routes = Router::new()
        .route("/issues/{id}/status", patch(update_status_handler))
        .layer(from_fn(require_auth_middleware));

    public_routes.merge(staff_routes).with_state(state)
}
