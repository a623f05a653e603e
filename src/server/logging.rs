use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

const LOG_TARGET: &str = "server::http";

/// Logs one line per handled request with its latency and status.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let start = Instant::now();
    let response = next.run(request).await;

    tracing::info!(
        target = LOG_TARGET,
        %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = %start.elapsed().as_millis(),
        "handled request"
    );

    response
}
