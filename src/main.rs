use anyhow::Result;
use std::{fs, io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;
mod state;
mod views;


use services::{
    conversion_service::ConversionService,
    rasterizer::{PageRasterizer, PdfiumRasterizer, RenderOptions, UnavailableRasterizer},
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // --- Parse config + export job ---
    let (cfg, export) = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting pdf-png-converter with config: {:?}", cfg);

    // --- Bind the PDF renderer ---
    let rasterizer: Arc<dyn PageRasterizer> =
        match PdfiumRasterizer::probe(cfg.pdfium_library.clone()) {
            Ok(r) => Arc::new(r),
            Err(err) => {
                tracing::warn!("PDF → PNG disabled: {}", err);
                Arc::new(UnavailableRasterizer {
                    reason: err.to_string(),
                })
            }
        };

    // --- Initialize core service ---
    let converter = ConversionService::new(
        rasterizer,
        cfg.work_dir.clone(),
        RenderOptions {
            dpi: cfg.dpi,
            max_page_pixels: cfg.max_page_pixels,
        },
    );

    // --- Handle export mode ---
    if let Some(job) = export {
        let pages = converter.export_pages(&job.pdf, &job.output_dir).await?;
        tracing::info!(
            "Exported {} pages from {} to {}",
            pages,
            job.pdf.display(),
            job.output_dir.display()
        );
        return Ok(()); // exit after export
    }

    // --- Ensure work directory exists (server only) ---
    if !cfg.work_dir.exists() {
        fs::create_dir_all(&cfg.work_dir)?;
        tracing::info!("Created work directory at {}", cfg.work_dir.display());
    }

    // --- Build router ---
    let state = state::AppState {
        converter,
        public_url: cfg.public_url.clone(),
    };
    let app = routes::routes::app(state, cfg.max_upload_bytes, &cfg.cors_origins);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
