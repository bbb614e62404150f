//! Health check endpoint
//!
//! Liveness only: answers 200 while the process is serving, without touching
//! the store.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::routes::envelope::json_response;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Handle `GET /health`
pub fn health_check() -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &HealthResponse { status: "ok" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_health_body() {
        let response = health_check();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], br#"{"status":"ok"}"#);
    }
}
