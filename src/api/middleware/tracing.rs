//! HTTP request/response tracing middleware.

use tower_http::LatencyUnit;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Request span plus one log line per response.
///
/// Spans carry method, URI and HTTP version at `INFO`. Responses are logged
/// at `INFO` with status and latency in milliseconds; 5xx responses are
/// additionally reported at `ERROR`.
///
/// ```text
/// INFO request{method=POST uri=/api/links version=HTTP/1.1}: finished processing request latency=3 ms status=201
/// INFO request{method=GET uri=/Ab3dE9x version=HTTP/1.1}: finished processing request latency=1 ms status=302
/// ```
pub fn layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
        .on_failure(
            DefaultOnFailure::new()
                .level(Level::ERROR)
                .latency_unit(LatencyUnit::Millis),
        )
}
