use std::sync::Arc;

use crate::{
    auth::{self, AuthState},
    dashboard::{self, DashboardState},
    issue::{self, IssueState},
};

use axum::{Router, middleware::from_fn_with_state};
use serde::Serialize;
use tower::ServiceBuilder;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

/// Error body shared by the JSON API endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine readable error code
    error: String,
    /// Human readable description
    message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

/// OpenAPI document for the JSON API.
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::api::v1::json_login_handler,
        issue::api::v1::list_issues_handler,
        issue::api::v1::report_issue_handler,
        issue::api::v1::get_issue_handler,
        issue::api::v1::update_status_handler,
        dashboard::api::v1::get_dashboard_handler,
    ),
    components(schemas(
        ErrorResponse,
        auth::api::v1::JsonLoginRequest,
        auth::api::v1::LoginResponse,
        issue::api::v1::IssueJson,
        issue::api::v1::CoordinatesJson,
        issue::api::v1::IssuesResponse,
        issue::api::v1::ReportIssueRequest,
        issue::api::v1::ReportIssueResponse,
        issue::api::v1::UpdateStatusRequest,
        dashboard::api::v1::DashboardResponse,
        dashboard::api::v1::DashboardErrorResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Staff login"),
        (name = "Issues", description = "Citizen issue reports"),
        (name = "Dashboard", description = "Operational statistics for staff"),
    ),
    info(
        title = "CityPulse API",
        description = "Civic issue reporting and the staff dashboard.",
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Creates the API routes for JSON API endpoints.
///
/// Every request passes through `auth_user_middleware`; each sub-router
/// decides for itself which of its routes need a logged-in user.
pub fn create_api_router(
    auth_state: Arc<AuthState>,
    issue_state: Arc<IssueState>,
    dashboard_state: Arc<DashboardState>,
) -> Router {
    let api_routes = auth::api::v1::create_api_router(auth_state.clone())
        .merge(issue::api::v1::create_api_router(issue_state))
        .merge(dashboard::api::v1::create_api_router(dashboard_state));
    Router::new()
        .nest("/api/v1", api_routes)
        .layer(ServiceBuilder::new().layer(from_fn_with_state(
            auth_state,
            auth::api::v1::auth_user_middleware,
        )))
}
