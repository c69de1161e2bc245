// CORS middleware configuration.
//
// The browser IDE may be served from any origin, so every origin is allowed
// unless `CODELAB_CORS_ORIGINS` narrows it to a comma-separated list.

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Build a [`CorsLayer`] from the configured origin list.
///
/// - Unset, empty or `"*"`: any origin.
/// - A comma-separated list: exactly those origins.
///
/// All configurations allow GET, POST, PUT, DELETE and OPTIONS with the
/// Content-Type and X-Request-Id headers, expose X-Request-Id, and cache
/// preflight responses for 1 hour.
pub fn cors_layer(origins: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
        .expose_headers([HeaderName::from_static("x-request-id")])
        .max_age(std::time::Duration::from_secs(3600));

    match origins.map(str::trim) {
        None | Some("") | Some("*") => base.allow_origin(AllowOrigin::any()),
        Some(list) => base.allow_origin(parse_origins(list)),
    }
}

fn parse_origins(comma_separated: &str) -> Vec<HeaderValue> {
    comma_separated
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect()
}
