use axum::{
    Json,
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::{error, info};

use crate::ErrorResponse;

/// Normalizes bodies of responses produced outside the handlers (body limit,
/// timeouts, plain-text 5xx) into the shared `ErrorResponse` shape. Layers
/// that generate those responses must sit inside this one.
pub async fn error_handling_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let path = req.uri().path().to_owned();
    let method = req.method().clone();

    let response = next.run(req).await;

    let latency = start.elapsed();
    info!(
        "Request completed: {} {} - Status: {} - Time: {:?}",
        method,
        path,
        response.status(),
        latency
    );

    let status = response.status();

    if status == StatusCode::PAYLOAD_TOO_LARGE {
        error!("Request body too large: {}", status);

        let error_response = ErrorResponse {
            status: status.to_string(),
            message: "The request body exceeds the maximum allowed size".to_string(),
            code: "PAYLOAD_TOO_LARGE".to_string(),
            details: Some("Please reduce the size of your request and try again".to_string()),
            help: None,
        };

        return (StatusCode::PAYLOAD_TOO_LARGE, Json(error_response)).into_response();
    }

    if status == StatusCode::REQUEST_TIMEOUT {
        error!("Request timed out: {} {}", method, path);

        let error_response = ErrorResponse {
            status: status.to_string(),
            message: "The request took too long to complete".to_string(),
            code: "REQUEST_TIMEOUT".to_string(),
            details: None,
            help: Some("Please try again later".to_string()),
        };

        return (StatusCode::REQUEST_TIMEOUT, Json(error_response)).into_response();
    }

    if status.is_server_error() && !is_json(&response) {
        error!("Server error occurred: {}", status);

        let error_response = ErrorResponse {
            status: status.to_string(),
            message: "An internal server error occurred".to_string(),
            code: "SERVER_ERROR".to_string(),
            details: None,
            help: Some(
                "Please try again later or contact support if the issue persists".to_string(),
            ),
        };

        return (status, Json(error_response)).into_response();
    }

    response
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, routing::get};
    use std::time::Duration;
    use tower::ServiceExt;
    use tower_http::timeout::TimeoutLayer;

    async fn plain_failure() -> (StatusCode, &'static str) {
        (StatusCode::SERVICE_UNAVAILABLE, "upstream gone")
    }

    #[tokio::test]
    async fn test_plain_server_error_is_rewritten() {
        let app = Router::new()
            .route("/boom", get(plain_failure))
            .layer(axum::middleware::from_fn(error_handling_middleware));

        let response = app
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.code, "SERVER_ERROR");
    }

    #[tokio::test]
    async fn test_timeout_is_rewritten() {
        async fn slow() -> &'static str {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "late"
        }

        let app = Router::new()
            .route("/slow", get(slow))
            .layer(TimeoutLayer::new(Duration::from_millis(20)))
            .layer(axum::middleware::from_fn(error_handling_middleware));

        let response = app
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.code, "REQUEST_TIMEOUT");
    }
}
