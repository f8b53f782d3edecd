//! PDF rasterisation behind a small trait.
//!
//! The conversion service only needs "give me every page as an image, in
//! order"; pdfium provides it in production, tests plug in a fake.

use crate::services::conversion_service::ConvertError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Points per inch in PDF user space.
const PDF_POINTS_PER_INCH: f32 = 72.0;

/// How pages should be rendered.
#[derive(Clone, Copy, Debug)]
pub struct RenderOptions {
    pub dpi: u32,
    /// Cap on either edge of a rendered page, in pixels.
    pub max_page_pixels: u32,
}

impl RenderOptions {
    fn scale(&self) -> f32 {
        self.dpi as f32 / PDF_POINTS_PER_INCH
    }
}

/// Receives each rendered page: 1-based page number and the image.
pub type PageSink<'a> = dyn FnMut(usize, DynamicImage) -> Result<(), ConvertError> + 'a;

/// Renders PDF pages. Implementations are blocking; callers run them on
/// the blocking pool.
pub trait PageRasterizer: Send + Sync {
    /// Render every page of `pdf_path` in order into `sink`.
    /// Returns the number of pages rendered.
    fn rasterize(
        &self,
        pdf_path: &Path,
        options: &RenderOptions,
        sink: &mut PageSink<'_>,
    ) -> Result<usize, ConvertError>;

    /// `Ok` when rendering can work, otherwise the reason it cannot.
    fn readiness(&self) -> Result<(), String>;
}

/// pdfium-backed rasterizer.
///
/// Binding happens per render on the calling (blocking) thread; the probe
/// in [`PdfiumRasterizer::probe`] only proves the library can be loaded.
/// A value of this type exists only after a successful probe, so readiness
/// reports that result instead of binding again.
#[derive(Clone, Debug)]
pub struct PdfiumRasterizer {
    library: Option<PathBuf>,
}

impl PdfiumRasterizer {
    /// Check that pdfium can be bound from `library` (a file or the folder
    /// holding it), else from the working directory, else the system.
    pub fn probe(library: Option<PathBuf>) -> Result<Self, ConvertError> {
        let rasterizer = Self { library };
        let pdfium = rasterizer.bind()?;
        drop(pdfium);
        info!(
            "pdfium bound from {}",
            rasterizer
                .library
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "default search path".into())
        );
        Ok(rasterizer)
    }

    fn bind(&self) -> Result<Pdfium, ConvertError> {
        let bindings = match &self.library {
            Some(path) if path.is_dir() => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(path))
            }
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| ConvertError::RendererUnavailable(format!("{:?}", e)))?;
        Ok(Pdfium::new(bindings))
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(
        &self,
        pdf_path: &Path,
        options: &RenderOptions,
        sink: &mut PageSink<'_>,
    ) -> Result<usize, ConvertError> {
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| {
                let detail = format!("{:?}", e);
                if detail.to_ascii_lowercase().contains("password") {
                    ConvertError::PasswordProtected
                } else {
                    ConvertError::InvalidPdf(detail)
                }
            })?;

        let max = options.max_page_pixels.min(i32::MAX as u32) as i32;
        let config = PdfRenderConfig::new()
            .scale_page_by_factor(options.scale())
            .set_maximum_width(max)
            .set_maximum_height(max);

        let pages = document.pages();
        debug!("PDF loaded: {} pages", pages.len());

        let mut rendered = 0;
        for (index, page) in pages.iter().enumerate() {
            let number = index + 1;
            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| ConvertError::Rasterization {
                    page: number,
                    detail: format!("{:?}", e),
                })?;
            let image = bitmap.as_image();
            debug!(
                "rendered page {} → {}x{} px",
                number,
                image.width(),
                image.height()
            );
            sink(number, image)?;
            rendered += 1;
        }

        Ok(rendered)
    }

    fn readiness(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Stand-in used when pdfium could not be bound at startup. PDF → PNG
/// requests fail with 503; image → PDF keeps working.
#[derive(Clone, Debug)]
pub struct UnavailableRasterizer {
    pub reason: String,
}

impl PageRasterizer for UnavailableRasterizer {
    fn rasterize(
        &self,
        _pdf_path: &Path,
        _options: &RenderOptions,
        _sink: &mut PageSink<'_>,
    ) -> Result<usize, ConvertError> {
        Err(ConvertError::RendererUnavailable(self.reason.clone()))
    }

    fn readiness(&self) -> Result<(), String> {
        Err(self.reason.clone())
    }
}
