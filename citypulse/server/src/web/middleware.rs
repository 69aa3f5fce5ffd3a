use axum::extract::MatchedPath;
use axum::http::Request;
use tower_http::trace::MakeSpan;
use tracing::Span;

/// Routes whose requests carry credentials in the body.
const SENSITIVE_PATHS: [&str; 1] = ["/api/v1/login"];

/// Span maker for the HTTP trace layer.
/// Requests to credential-bearing routes are marked and never record more than method and path.
#[derive(Clone, Debug, Default)]
pub struct FilteredMakeSpan;

impl<B> MakeSpan<B> for FilteredMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let method = request.method();
        let matched_path = request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str);

        if SENSITIVE_PATHS.contains(&request.uri().path()) {
            tracing::info_span!(
                "request",
                method = %method,
                path = %request.uri().path(),
                sensitive_route = true,
            )
        } else {
            tracing::info_span!(
                "request",
                method = %method,
                uri = %request.uri(),
                matched_path,
            )
        }
    }
}
