//! HTTP span helpers.

use crate::router::ROUTES;

/// Route label used for paths that match no known route.
const UNMATCHED_ROUTE: &str = "{unmatched}";

#[derive(Debug, Clone)]
pub(super) struct RequestSpanName {
    /// Bounded-cardinality route label for metrics.
    pub(super) route: &'static str,
    pub(super) otel_span_name: String,
}

pub(super) fn request_span_name(method: &str, path: &str) -> RequestSpanName {
    let route = route_label(path);
    let otel_span_name = format!("{method} {route}");

    RequestSpanName {
        route,
        otel_span_name,
    }
}

fn route_label(path: &str) -> &'static str {
    let trimmed = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    ROUTES
        .iter()
        .copied()
        .find(|route| *route == trimmed)
        .unwrap_or(UNMATCHED_ROUTE)
}
