//! Request-level middleware.

use axum::{extract::Request, middleware::Next, response::Response};

use crate::services::metrics::{ERRORS_TOTAL, HTTP_REQUESTS_TOTAL};

/// Count every request by route and response status; 5xx responses also
/// land on the error counter for alerting.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    let status = response.status();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&path, status.as_str()])
        .inc();
    if status.is_server_error() {
        ERRORS_TOTAL.with_label_values(&["http_5xx"]).inc();
    }

    response
}
