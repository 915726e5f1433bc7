use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::info;

/// Log every inbound request and the status it ended with.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    info!(target: "http", %method, %path, "received request");

    let t0 = Instant::now();
    let resp = next.run(req).await;

    info!(
        target: "http",
        %method,
        %path,
        status = resp.status().as_u16(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "request finished"
    );
    resp
}
