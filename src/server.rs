//! HTTP surface: one endpoint, three methods.
//!
//! | Method    | Response |
//! |-----------|----------|
//! | `GET`     | `200 {"status":"ok","endpoint":"generate"}` |
//! | `OPTIONS` | `204` with permissive CORS headers |
//! | `POST`    | `200 application/pdf` attachment, or a JSON error |
//!
//! The endpoint is mounted at both `/` and `/api/generate`. Every response,
//! including errors and axum's own rejections, carries
//! `Access-Control-Allow-Origin: *`.

use crate::error::GenerateError;
use crate::generate::Generator;
use crate::request::GenerationRequest;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Name reported by the health check.
pub const ENDPOINT_NAME: &str = "generate";

/// Route path of the endpoint (also served at `/`).
pub const ENDPOINT_PATH: &str = "/api/generate";

/// Build the router around a shared generator.
pub fn build_router(generator: Arc<Generator>) -> Router {
    Router::new()
        .route("/", get(health_check).post(generate).options(preflight))
        .route(
            ENDPOINT_PATH,
            get(health_check).post(generate).options(preflight),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(generator)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn start_server(addr: &str, generator: Arc<Generator>) -> Result<(), std::io::Error> {
    let app = build_router(generator);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await
}

/// `GET`: health check.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok", "endpoint": ENDPOINT_NAME }))
}

/// `OPTIONS`: CORS preflight.
pub async fn preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, GET, OPTIONS"),
        ],
    )
}

/// `POST`: run a generation request and return the PDF.
///
/// The body is parsed by hand rather than with the `Json` extractor so that a
/// missing `Content-Type` or malformed JSON gets the same 400 JSON error
/// shape as every other failure.
pub async fn generate(State(generator): State<Arc<Generator>>, body: Bytes) -> Response {
    let result = match GenerationRequest::from_json(&body) {
        Ok(request) => generator.generate(&request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(doc) => {
            info!(
                "Serving {} ({} pages, {} bytes)",
                doc.filename,
                doc.page_count(),
                doc.bytes.len()
            );
            let disposition = format!("attachment; filename=\"{}\"", doc.filename);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                doc.bytes,
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// HTTP status for a fatal error.
pub fn status_for(err: &GenerateError) -> StatusCode {
    match err {
        GenerateError::Validation(_) => StatusCode::BAD_REQUEST,
        GenerateError::Upstream { .. } | GenerateError::NoPagesProduced { .. } => {
            StatusCode::BAD_GATEWAY
        }
        GenerateError::Configuration(_)
        | GenerateError::InvalidConfig(_)
        | GenerateError::InvalidImageSize { .. }
        | GenerateError::EmptyPageSet
        | GenerateError::PdfEncoding(_)
        | GenerateError::PdfWrite(_)
        | GenerateError::OutputWriteFailed { .. }
        | GenerateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for GenerateError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            error!("Request failed ({}): {}", status, self);
        } else {
            warn!("Request failed ({}): {}", status, self);
        }

        let body = match self.detail() {
            Some(detail) => json!({ "error": self.to_string(), "detail": detail }),
            None => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
