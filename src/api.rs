// src/api.rs

//! HTTP front end: `POST /api/scan` returns the report as JSON and
//! `GET /api/scan/pdf?url=` returns it rendered as a PDF.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::core::error::{RenderError, ScanError};
use crate::core::scanner::Scanner;
use crate::report::pdf::{PDF_CONTENT_TYPE, PDF_FILENAME, render_pdf};

pub fn create_router(scanner: Arc<Scanner>) -> Router {
    Router::new()
        .route("/api/scan", post(scan_handler))
        .route("/api/scan/pdf", get(scan_pdf_handler))
        .with_state(scanner)
}

/// Binds `addr` and serves the API until the process stops.
pub async fn serve(scanner: Arc<Scanner>, addr: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "API server listening.");
    axum::serve(listener, create_router(scanner)).await
}

#[derive(Debug, Deserialize)]
struct ScanRequest {
    url: String,
}

async fn scan_handler(
    State(scanner): State<Arc<Scanner>>,
    request: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = request.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    info!(target = %request.url, "Scan requested.");
    let report = scanner.scan(&request.url).await?;
    Ok(Json(report).into_response())
}

async fn scan_pdf_handler(
    State(scanner): State<Arc<Scanner>>,
    query: Result<Query<ScanRequest>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(request) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    info!(target = %request.url, "PDF report requested.");
    let report = scanner.scan(&request.url).await?;
    let bytes = render_pdf(&report)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, PDF_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, format!("inline; filename={PDF_FILENAME}")),
        ],
        bytes,
    )
        .into_response())
}

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    Scan(ScanError),
    Render(RenderError),
}

impl From<ScanError> for ApiError {
    fn from(e: ScanError) -> Self {
        ApiError::Scan(e)
    }
}

impl From<RenderError> for ApiError {
    fn from(e: RenderError) -> Self {
        ApiError::Render(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "malformed_input", msg),
            ApiError::Scan(e @ ScanError::MalformedInput { .. }) => {
                (StatusCode::BAD_REQUEST, "malformed_input", e.to_string())
            }
            ApiError::Scan(e @ ScanError::BlockedTarget { .. }) => {
                warn!(error = %e, "Rejected blocked target.");
                (StatusCode::FORBIDDEN, "blocked_target", e.to_string())
            }
            ApiError::Render(e) => {
                error!(error = %e, "Report rendering failed.");
                (StatusCode::INTERNAL_SERVER_ERROR, "rendering_failure", e.to_string())
            }
        };

        let body = Json(serde_json::json!({
            "error": message,
            "kind": kind,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_statuses() {
        let blocked = ApiError::Scan(ScanError::blocked(
            "10.0.0.1",
            crate::core::error::BlockReason::ReservedAddress("10.0.0.1".parse().unwrap()),
        ));
        assert_eq!(blocked.into_response().status(), StatusCode::FORBIDDEN);

        let malformed = ApiError::Scan(ScanError::malformed("ftp://x", "unsupported scheme"));
        assert_eq!(malformed.into_response().status(), StatusCode::BAD_REQUEST);

        let render = ApiError::Render(RenderError::Pdf("boom".into()));
        assert_eq!(render.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
