use anyhow::{Context, Result};
use clap::Parser;
use std::{env, path::PathBuf};

const MIB: usize = 1024 * 1024;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub work_dir: PathBuf,
    pub dpi: u32,
    pub max_page_pixels: u32,
    pub max_upload_bytes: usize,
    pub pdfium_library: Option<PathBuf>,
    pub public_url: Option<String>,
    pub cors_origins: Vec<String>,
}

/// A one-shot conversion requested from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportJob {
    pub pdf: PathBuf,
    pub output_dir: PathBuf,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "PDF ⇄ PNG conversion web utility")]
pub struct Args {
    /// Host to bind to (overrides CONVERTER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides CONVERTER_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory for per-request scratch files (overrides CONVERTER_WORK_DIR)
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Render resolution for PDF pages (overrides CONVERTER_DPI)
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Longest rendered page edge in pixels (overrides CONVERTER_MAX_PAGE_PIXELS)
    #[arg(long)]
    pub max_page_pixels: Option<u32>,

    /// Upload size limit in MiB (overrides CONVERTER_MAX_UPLOAD_MB)
    #[arg(long)]
    pub max_upload_mb: Option<usize>,

    /// Path to the pdfium shared library (overrides CONVERTER_PDFIUM_LIB)
    #[arg(long)]
    pub pdfium_lib: Option<PathBuf>,

    /// Public base URL used in the sitemap (overrides CONVERTER_PUBLIC_URL)
    #[arg(long)]
    pub public_url: Option<String>,

    /// Comma-separated CORS origins, `*` for any (overrides CONVERTER_CORS_ORIGINS)
    #[arg(long)]
    pub cors_origins: Option<String>,

    /// Render a local PDF to PNG files and exit
    #[arg(long, value_name = "PDF")]
    pub export: Option<PathBuf>,

    /// Destination folder for --export (defaults to `<pdf stem>_png`)
    #[arg(long, requires = "export")]
    pub output_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and an optional export job.
    pub fn from_env_and_args() -> Result<(Self, Option<ExportJob>)> {
        Self::resolve(Args::parse(), |key| env::var(key).ok())
    }

    /// Merge parsed arguments over values returned by `lookup`, then defaults.
    pub fn resolve<F>(args: Args, lookup: F) -> Result<(Self, Option<ExportJob>)>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_host = lookup("CONVERTER_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let env_port = parse_var(&lookup, "CONVERTER_PORT", 5000u16)?;
        let env_work_dir = lookup("CONVERTER_WORK_DIR").unwrap_or_else(|| "./data/work".into());
        let env_dpi = parse_var(&lookup, "CONVERTER_DPI", 200u32)?;
        let env_max_pixels = parse_var(&lookup, "CONVERTER_MAX_PAGE_PIXELS", 10_000u32)?;
        let env_upload_mb = parse_var(&lookup, "CONVERTER_MAX_UPLOAD_MB", 50usize)?;
        let env_pdfium = lookup("CONVERTER_PDFIUM_LIB").map(PathBuf::from);
        let env_public_url = lookup("CONVERTER_PUBLIC_URL");
        let env_cors = lookup("CONVERTER_CORS_ORIGINS");

        let dpi = args.dpi.unwrap_or(env_dpi);
        if dpi == 0 {
            anyhow::bail!("dpi must be greater than zero");
        }

        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            work_dir: args.work_dir.unwrap_or_else(|| env_work_dir.into()),
            dpi,
            max_page_pixels: args.max_page_pixels.unwrap_or(env_max_pixels),
            max_upload_bytes: args.max_upload_mb.unwrap_or(env_upload_mb) * MIB,
            pdfium_library: args.pdfium_lib.or(env_pdfium),
            public_url: args
                .public_url
                .or(env_public_url)
                .filter(|url| !url.trim().is_empty()),
            cors_origins: split_origins(args.cors_origins.or(env_cors).as_deref()),
        };

        let export = args.export.map(|pdf| {
            let output_dir = args
                .output_dir
                .unwrap_or_else(|| default_export_dir(&pdf));
            ExportJob { pdf, output_dir }
        });

        Ok((cfg, export))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        None => Ok(default),
    }
}

fn split_origins(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or("*")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `report.pdf` exports into `report_png` next to it.
fn default_export_dir(pdf: &std::path::Path) -> PathBuf {
    let stem = pdf
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".into());
    pdf.with_file_name(format!("{}_png", stem))
}
