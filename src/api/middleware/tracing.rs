//! HTTP request/response tracing middleware.

use axum::http::{Request, header};
use tower_http::LatencyUnit;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnResponse, MakeSpan, TraceLayer};
use tracing::{Level, Span};

/// Span factory recording the `Host` header next to method and path.
///
/// Redirects are host-scoped, so the same path on two domains is two
/// different links.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostAwareSpan;

impl<B> MakeSpan<B> for HostAwareSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let host = request
            .headers()
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri().path(),
            host = %host,
        )
    }
}

/// Creates a tracing middleware for HTTP requests.
///
/// Each request gets an `INFO` span with method, path and host; the response
/// is logged at `INFO` with status and latency in milliseconds:
///
/// ```text
/// INFO request{method=GET uri=/abc123 host=s.example.com}: finished processing request latency=3 ms status=302
/// ```
pub fn layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, HostAwareSpan> {
    TraceLayer::new_for_http()
        .make_span_with(HostAwareSpan)
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
}
