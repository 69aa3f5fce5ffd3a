use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::http::header::AUTHORIZATION;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::AuthState;
use crate::config::Config;
use crate::dashboard::DashboardState;
use crate::issue::IssueState;
use crate::store::{InMemoryIssueStore, IssueStore};

pub mod api;
pub mod middleware;

use api::ApiDoc;
use middleware::FilteredMakeSpan;

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let store: Arc<dyn IssueStore> = match &config.seed_path {
        Some(seed_path) => Arc::new(InMemoryIssueStore::load_seed_file(Path::new(seed_path)).await?),
        None => {
            tracing::info!("No seed file configured, starting with an empty issue store");
            Arc::new(InMemoryIssueStore::new())
        }
    };

    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let app = build_app(&config, store);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Assembles the full application router over `store`.
pub fn build_app(config: &Config, store: Arc<dyn IssueStore>) -> Router {
    let auth_state = Arc::new(AuthState::from_config(config));
    let issue_state = Arc::new(IssueState {
        store: store.clone(),
    });
    let dashboard_state = Arc::new(DashboardState::from_config(config, store));

    Router::new()
        .route("/health", axum::routing::get(health_check_handler))
        .merge(api::create_api_router(
            auth_state,
            issue_state,
            dashboard_state,
        ))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetSensitiveRequestHeadersLayer::new([AUTHORIZATION]))
                .layer(TraceLayer::new_for_http().make_span_with(FilteredMakeSpan))
                .layer(CorsLayer::permissive()),
        )
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}
