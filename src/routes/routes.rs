//! Defines routes for the converter site.
//!
//! ## Structure
//! - **Pages**
//!   - `GET  /`            — home page (`?tab=pdf2png|png2pdf`)
//!   - `GET  /terms`       — terms & privacy
//!   - `GET  /sitemap.xml` — XML sitemap
//!
//! - **Conversion**
//!   - `POST /convert`     — multipart upload, returns a ZIP or a PDF
//!
//! - **Probes**
//!   - `GET  /healthz`, `GET /readyz`

use crate::{
    handlers::{
        convert_handlers::convert,
        health_handlers::{healthz, readyz},
        page_handlers::{home, sitemap, terms},
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

/// Build and return the router for all routes.
///
/// `max_upload_bytes` bounds the whole multipart body of `/convert`.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // pages
        .route("/", get(home))
        .route("/terms", get(terms))
        .route("/sitemap.xml", get(sitemap))
        // conversion
        .route(
            "/convert",
            post(convert).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

/// CORS policy from configured origins; `*` (or nothing valid) allows any.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin `{}`", o);
                None
            }
        })
        .collect();

    if parsed.is_empty() {
        base.allow_origin(Any)
    } else {
        base.allow_origin(AllowOrigin::list(parsed))
    }
}

/// Full application: routes, state and middleware.
pub fn app(state: AppState, max_upload_bytes: usize, cors_origins: &[String]) -> Router {
    routes(max_upload_bytes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
}
