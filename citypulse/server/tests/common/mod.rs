use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use citypulse_server::config::Config;
use citypulse_server::store::{InMemoryIssueStore, IssueStore};
use tower::ServiceExt;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "password";

pub fn test_config() -> Config {
    Config {
        port: 0,
        admin_username: ADMIN_USERNAME.to_string(),
        admin_password: ADMIN_PASSWORD.to_string(),
        jwt_secret: "test_secret".to_string(),
        seed_path: None,
        activity_window_days: 30,
        sla_alert_threshold_hours: 48,
    }
}

/// Builds the full application over an empty store.
pub fn setup() -> Router {
    setup_with_store(Arc::new(InMemoryIssueStore::new()))
}

pub fn setup_with_store(store: Arc<dyn IssueStore>) -> Router {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    citypulse_server::web::build_app(&test_config(), store)
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Logs in as the configured staff account and returns the bearer token.
pub async fn login(app: &Router) -> String {
    let body = format!(
        r#"{{"username":"{}","password":"{}"}}"#,
        ADMIN_USERNAME, ADMIN_PASSWORD
    );
    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/login", None, &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string()
}
