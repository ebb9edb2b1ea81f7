use crate::api::middleware::request_id::REQUEST_ID_HEADER;
use axum::body::Body;
use axum::http::{Request, Response};
use std::time::Duration;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::TraceLayer;
use tracing::Span;

pub type GatewayTraceLayer = TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    fn(&Request<Body>) -> Span,
    fn(&Request<Body>, &Span),
    fn(&Response<Body>, Duration, &Span),
>;

/// HTTP tracing for the gateway routes.
///
/// Must sit inside the request-id middleware so every span carries the id
/// that is echoed back to the client.
pub fn trace_layer() -> GatewayTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(request_span as fn(&Request<Body>) -> Span)
        .on_request(log_request as fn(&Request<Body>, &Span))
        .on_response(log_response as fn(&Response<Body>, Duration, &Span))
}

pub fn request_id_of<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}

fn request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "gateway_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id_of(request),
    )
}

fn log_request(request: &Request<Body>, _span: &Span) {
    tracing::info!("📥 {} {}", request.method(), request.uri().path());
}

fn log_response(response: &Response<Body>, latency: Duration, _span: &Span) {
    tracing::info!("📤 {} after {} ms", response.status(), latency.as_millis());
}
