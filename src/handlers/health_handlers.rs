//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks the work dir and the PDF renderer

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;
use tokio::fs;
use uuid::Uuid;

/// `GET /healthz`
///
/// Very small liveness probe — always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that:
/// 1. Performs a best-effort write/read/delete in the work directory.
/// 2. Reports whether pdfium was bound at startup.
///
/// Returns JSON describing each check. HTTP 200 when all checks pass,
/// HTTP 503 when any check fails.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let work_dir = state.converter.work_dir.clone();

    // 1) Disk write/read/delete check
    let tmp_path = work_dir.join(format!(".readyz-{}", Uuid::new_v4()));
    let disk_check = match fs::create_dir_all(&work_dir).await {
        Err(e) => (false, Some(format!("could not create work dir: {}", e))),
        Ok(_) => match fs::write(&tmp_path, b"readyz").await {
            Ok(_) => match fs::read(&tmp_path).await {
                Ok(bytes) if bytes == b"readyz" => match fs::remove_file(&tmp_path).await {
                    Ok(_) => (true, None::<String>),
                    Err(e) => (true, Some(format!("could not remove tmp file: {}", e))),
                },
                Ok(_) => {
                    let _ = fs::remove_file(&tmp_path).await;
                    (false, Some("file content mismatch".to_string()))
                }
                Err(e) => {
                    let _ = fs::remove_file(&tmp_path).await;
                    (false, Some(format!("could not read tmp file: {}", e)))
                }
            },
            Err(e) => (false, Some(format!("could not write tmp file: {}", e))),
        },
    };

    // 2) Renderer check
    let renderer_check = match state.converter.rasterizer.readiness() {
        Ok(()) => (true, None),
        Err(reason) => (false, Some(reason)),
    };

    let overall_ok = disk_check.0 && renderer_check.0;

    let mut checks = HashMap::new();
    checks.insert(
        "disk",
        CheckStatus {
            ok: disk_check.0,
            error: disk_check.1,
        },
    );
    checks.insert(
        "renderer",
        CheckStatus {
            ok: renderer_check.0,
            error: renderer_check.1,
        },
    );

    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
