//! src/services/conversion_service.rs
//!
//! ConversionService — the two conversions offered by the site, plus the
//! command-line export. Each HTTP conversion runs inside its own
//! `Workspace`: uploads are written to disk, the library call produces the
//! output next to them, and the workspace is removed as soon as the output
//! has been opened for streaming.

use crate::{
    models::{
        converted::{ConvertedFile, Download},
        upload::UploadedFile,
    },
    services::{
        archive,
        filenames::file_stem,
        pdf_writer::{self, PdfWriteError},
        rasterizer::{PageRasterizer, RenderOptions},
        workspace::Workspace,
    },
};
use chrono::Local;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};
use thiserror::Error;
use tokio::{fs, task};
use tracing::{info, warn};

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("uploaded file is not a PDF")]
    NotAPdf,
    #[error("could not read PDF: {0}")]
    InvalidPdf(String),
    #[error("PDF is password protected")]
    PasswordProtected,
    #[error("PDF has no pages")]
    EmptyPdf,
    #[error("failed to render page {page}: {detail}")]
    Rasterization { page: usize, detail: String },
    #[error("`{filename}` is not a PNG or JPEG image")]
    UnsupportedImage { filename: String },
    #[error("could not read image `{filename}`: {detail}")]
    InvalidImage { filename: String, detail: String },
    #[error("no images to merge")]
    NoImages,
    #[error("PDF rendering is unavailable: {0}")]
    RendererUnavailable(String),
    #[error("conversion task failed: {0}")]
    Task(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    PdfWrite(PdfWriteError),
}

impl From<PdfWriteError> for ConvertError {
    fn from(err: PdfWriteError) -> Self {
        match err {
            PdfWriteError::NoImages => ConvertError::NoImages,
            other => ConvertError::PdfWrite(other),
        }
    }
}

pub type ConvertResult<T> = Result<T, ConvertError>;

/// ConversionService wires uploads to the conversion libraries:
/// - PDF → one PNG per page → ZIP (pdfium, image, zip)
/// - PNG/JPEG images → one merged PDF (image, lopdf)
///
/// Cloning is cheap; the rasterizer is shared.
#[derive(Clone)]
pub struct ConversionService {
    /// Page renderer used for PDF → PNG.
    pub rasterizer: Arc<dyn PageRasterizer>,

    /// Root beneath which per-request workspaces are created.
    pub work_dir: PathBuf,

    /// Render settings applied to every page.
    pub render: RenderOptions,
}

impl ConversionService {
    pub fn new(
        rasterizer: Arc<dyn PageRasterizer>,
        work_dir: impl Into<PathBuf>,
        render: RenderOptions,
    ) -> Self {
        Self {
            rasterizer,
            work_dir: work_dir.into(),
            render,
        }
    }

    /// Render every page of an uploaded PDF to `<stem>_<n>.png` and bundle
    /// them as `<stem>.zip`.
    pub async fn pdf_to_png_zip(&self, upload: UploadedFile) -> ConvertResult<Download> {
        if !upload.data.starts_with(PDF_MAGIC) {
            return Err(ConvertError::NotAPdf);
        }

        let started = Instant::now();
        let workspace = Workspace::create(&self.work_dir)?;
        let pdf_path = workspace.upload_path(&upload.filename);
        fs::write(&pdf_path, &upload.data).await?;

        let stem = file_stem(&upload.filename);
        let out_dir = workspace.output_dir();
        let rasterizer = self.rasterizer.clone();
        let options = self.render;

        let converted = task::spawn_blocking(move || {
            render_zip_blocking(rasterizer.as_ref(), &pdf_path, &out_dir, &stem, &options)
        })
        .await
        .map_err(|e| ConvertError::Task(e.to_string()))??;

        info!(
            "converted {} ({} bytes) to {} in {:?}",
            upload.filename,
            upload.len(),
            converted.download_name,
            started.elapsed()
        );
        open_download(workspace, converted).await
    }

    /// Merge uploaded PNG/JPEG images, in upload order, into
    /// `merged_<timestamp>.pdf`.
    pub async fn images_to_pdf(&self, uploads: Vec<UploadedFile>) -> ConvertResult<Download> {
        if uploads.is_empty() {
            return Err(ConvertError::NoImages);
        }

        let started = Instant::now();
        let workspace = Workspace::create(&self.work_dir)?;

        // Index prefix keeps same-named uploads apart.
        let mut sources = Vec::with_capacity(uploads.len());
        for (index, upload) in uploads.iter().enumerate() {
            let path = workspace.upload_path(&format!("{:03}_{}", index + 1, upload.filename));
            fs::write(&path, &upload.data).await?;
            sources.push((upload.filename.clone(), path));
        }

        let pdf_name = format!("merged_{}.pdf", Local::now().format("%Y%m%d_%H%M%S"));
        let pdf_path = workspace.output_dir().join(&pdf_name);
        let target = pdf_path.clone();

        let pages = task::spawn_blocking(move || merge_images_blocking(&sources, &target))
            .await
            .map_err(|e| ConvertError::Task(e.to_string()))??;

        info!(
            "merged {} images into {} in {:?}",
            pages,
            pdf_name,
            started.elapsed()
        );
        let converted = ConvertedFile {
            download_name: pdf_name,
            content_type: "application/pdf",
            path: pdf_path,
        };
        open_download(workspace, converted).await
    }

    /// Render a local PDF into `out_dir/page_<n>.png`. Returns the page count.
    pub async fn export_pages(&self, pdf_path: &Path, out_dir: &Path) -> ConvertResult<usize> {
        if !fs::try_exists(pdf_path).await? {
            return Err(ConvertError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", pdf_path.display()),
            )));
        }
        fs::create_dir_all(out_dir).await?;

        let rasterizer = self.rasterizer.clone();
        let options = self.render;
        let pdf = pdf_path.to_path_buf();
        let dir = out_dir.to_path_buf();

        let pages = task::spawn_blocking(move || {
            rasterizer.rasterize(&pdf, &options, &mut |number, image| {
                let path = dir.join(format!("page_{}.png", number));
                image.save_with_format(&path, ImageFormat::Png)?;
                info!("page {} saved as {}", number, path.display());
                Ok(())
            })
        })
        .await
        .map_err(|e| ConvertError::Task(e.to_string()))??;

        if pages == 0 {
            return Err(ConvertError::EmptyPdf);
        }
        Ok(pages)
    }
}

fn render_zip_blocking(
    rasterizer: &dyn PageRasterizer,
    pdf_path: &Path,
    out_dir: &Path,
    stem: &str,
    options: &RenderOptions,
) -> ConvertResult<ConvertedFile> {
    let mut entries = Vec::new();
    let pages = rasterizer.rasterize(pdf_path, options, &mut |number, image| {
        let name = format!("{}_{}.png", stem, number);
        let path = out_dir.join(&name);
        image.save_with_format(&path, ImageFormat::Png)?;
        entries.push((name, path));
        Ok(())
    })?;

    if pages == 0 {
        return Err(ConvertError::EmptyPdf);
    }

    let zip_name = format!("{}.zip", stem);
    let zip_path = out_dir.join(&zip_name);
    archive::zip_files(&entries, &zip_path)?;

    Ok(ConvertedFile {
        download_name: zip_name,
        content_type: "application/zip",
        path: zip_path,
    })
}

fn merge_images_blocking(sources: &[(String, PathBuf)], target: &Path) -> ConvertResult<usize> {
    let images = sources
        .iter()
        .map(|(filename, path)| decode_image(filename, path))
        .collect::<ConvertResult<Vec<DynamicImage>>>()?;

    let bytes = pdf_writer::images_to_pdf(&images)?;
    std::fs::write(target, bytes)?;
    Ok(images.len())
}

/// Decode a PNG or JPEG, detecting the format from content rather than
/// from the client's filename.
fn decode_image(filename: &str, path: &Path) -> ConvertResult<DynamicImage> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    match reader.format() {
        Some(ImageFormat::Png | ImageFormat::Jpeg) => {}
        _ => {
            return Err(ConvertError::UnsupportedImage {
                filename: filename.to_string(),
            });
        }
    }
    reader.decode().map_err(|e| ConvertError::InvalidImage {
        filename: filename.to_string(),
        detail: e.to_string(),
    })
}

/// Open the produced file, then drop the workspace around it.
async fn open_download(workspace: Workspace, converted: ConvertedFile) -> ConvertResult<Download> {
    let file = fs::File::open(&converted.path).await?;
    let size_bytes = file.metadata().await?.len();

    let dir = workspace.path().to_path_buf();
    if let Err(err) = workspace.close() {
        warn!("failed to remove workspace {}: {}", dir.display(), err);
    }

    Ok(Download {
        download_name: converted.download_name,
        content_type: converted.content_type,
        size_bytes,
        file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::rasterizer::{UnavailableRasterizer, testing::SolidPages};
    use bytes::Bytes;
    use image::{Rgb, RgbImage};
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Read};
    use tokio::io::AsyncReadExt;

    fn service(rasterizer: impl PageRasterizer + 'static, root: &Path) -> ConversionService {
        ConversionService::new(
            Arc::new(rasterizer),
            root,
            RenderOptions {
                dpi: 72,
                max_page_pixels: 2000,
            },
        )
    }

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Bytes {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([1, 2, 3])));
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, format).unwrap();
        Bytes::from(buf.into_inner())
    }

    fn pdf_upload(name: &str) -> UploadedFile {
        UploadedFile::new(name, None, Bytes::from_static(b"%PDF-1.7\n%%EOF\n"))
    }

    fn is_empty_dir(path: &Path) -> bool {
        std::fs::read_dir(path).unwrap().next().is_none()
    }

    async fn read_all(mut download: Download) -> Vec<u8> {
        let mut bytes = Vec::new();
        download.file.read_to_end(&mut bytes).await.unwrap();
        bytes
    }

    #[tokio::test]
    async fn pdf_pages_become_zipped_pngs() {
        let root = tempfile::tempdir().unwrap();
        let svc = service(SolidPages::new(3), root.path());

        let download = svc.pdf_to_png_zip(pdf_upload("report.pdf")).await.unwrap();
        assert_eq!(download.download_name, "report.zip");
        assert_eq!(download.content_type, "application/zip");
        let size = download.size_bytes;

        let bytes = read_all(download).await;
        assert_eq!(bytes.len() as u64, size);

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["report_1.png", "report_2.png", "report_3.png"]);

        let mut png = Vec::new();
        archive
            .by_name("report_2.png")
            .unwrap()
            .read_to_end(&mut png)
            .unwrap();
        let page = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        assert_eq!((page.width(), page.height()), (8, 6));

        assert!(is_empty_dir(root.path()), "workspace must be removed");
    }

    #[tokio::test]
    async fn non_pdf_upload_is_rejected_before_touching_disk() {
        let root = tempfile::tempdir().unwrap();
        let svc = service(SolidPages::new(1), root.path());
        let upload = UploadedFile::new("fake.pdf", None, Bytes::from_static(b"GIF89a"));

        let err = svc.pdf_to_png_zip(upload).await.unwrap_err();
        assert!(matches!(err, ConvertError::NotAPdf));
        assert!(is_empty_dir(root.path()));
    }

    #[tokio::test]
    async fn pdf_without_pages_fails_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let svc = service(SolidPages::new(0), root.path());

        let err = svc.pdf_to_png_zip(pdf_upload("empty.pdf")).await.unwrap_err();
        assert!(matches!(err, ConvertError::EmptyPdf));
        assert!(is_empty_dir(root.path()));
    }

    #[tokio::test]
    async fn unavailable_renderer_surfaces_reason() {
        let root = tempfile::tempdir().unwrap();
        let svc = service(
            UnavailableRasterizer {
                reason: "no pdfium".into(),
            },
            root.path(),
        );

        let err = svc.pdf_to_png_zip(pdf_upload("a.pdf")).await.unwrap_err();
        assert!(matches!(err, ConvertError::RendererUnavailable(reason) if reason == "no pdfium"));
        assert!(is_empty_dir(root.path()));
    }

    #[tokio::test]
    async fn images_merge_into_one_pdf_in_upload_order() {
        let root = tempfile::tempdir().unwrap();
        let svc = service(SolidPages::new(0), root.path());
        let uploads = vec![
            UploadedFile::new("a.png", None, encoded(30, 10, ImageFormat::Png)),
            UploadedFile::new("b.jpg", None, encoded(12, 24, ImageFormat::Jpeg)),
            // Same name as the first upload; must not overwrite it.
            UploadedFile::new("a.png", None, encoded(5, 7, ImageFormat::Png)),
        ];

        let download = svc.images_to_pdf(uploads).await.unwrap();
        assert!(download.download_name.starts_with("merged_"));
        assert!(download.download_name.ends_with(".pdf"));
        assert_eq!(download.content_type, "application/pdf");

        let bytes = read_all(download).await;
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let widths: Vec<i64> = doc
            .get_pages()
            .values()
            .map(|id| {
                let media = doc.get_dictionary(*id).unwrap().get(b"MediaBox").unwrap();
                media.as_array().unwrap()[2].as_i64().unwrap()
            })
            .collect();
        assert_eq!(widths, vec![30, 12, 5]);
        assert!(is_empty_dir(root.path()));
    }

    #[tokio::test]
    async fn non_image_upload_is_unsupported() {
        let root = tempfile::tempdir().unwrap();
        let svc = service(SolidPages::new(0), root.path());
        let uploads = vec![
            UploadedFile::new("a.png", None, encoded(4, 4, ImageFormat::Png)),
            UploadedFile::new("notes.txt", None, Bytes::from_static(b"just some text")),
        ];

        let err = svc.images_to_pdf(uploads).await.unwrap_err();
        assert!(
            matches!(err, ConvertError::UnsupportedImage { ref filename } if filename == "notes.txt")
        );
        assert!(is_empty_dir(root.path()));
    }

    #[tokio::test]
    async fn truncated_png_is_invalid() {
        let root = tempfile::tempdir().unwrap();
        let svc = service(SolidPages::new(0), root.path());
        let mut broken = encoded(16, 16, ImageFormat::Png).to_vec();
        broken.truncate(20);

        let err = svc
            .images_to_pdf(vec![UploadedFile::new("broken.png", None, broken.into())])
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidImage { .. }));
    }

    #[tokio::test]
    async fn no_images_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let svc = service(SolidPages::new(0), root.path());
        let err = svc.images_to_pdf(Vec::new()).await.unwrap_err();
        assert!(matches!(err, ConvertError::NoImages));
    }

    #[tokio::test]
    async fn export_writes_numbered_pages() {
        let root = tempfile::tempdir().unwrap();
        let pdf = root.path().join("book.pdf");
        std::fs::write(&pdf, b"%PDF-1.7").unwrap();
        let out = root.path().join("book_png");
        let svc = service(SolidPages::new(2), root.path());

        let pages = svc.export_pages(&pdf, &out).await.unwrap();
        assert_eq!(pages, 2);
        assert!(out.join("page_1.png").is_file());
        assert!(out.join("page_2.png").is_file());
        assert!(!out.join("page_3.png").exists());
    }

    #[tokio::test]
    async fn export_leaves_work_dir_untouched() {
        let root = tempfile::tempdir().unwrap();
        let pdf = root.path().join("book.pdf");
        std::fs::write(&pdf, b"%PDF-1.7").unwrap();
        let work = root.path().join("work");
        let svc = service(SolidPages::new(1), &work);

        svc.export_pages(&pdf, &root.path().join("book_png"))
            .await
            .unwrap();
        assert!(!work.exists());
    }

    #[tokio::test]
    async fn export_of_missing_file_fails() {
        let root = tempfile::tempdir().unwrap();
        let svc = service(SolidPages::new(2), root.path());
        let err = svc
            .export_pages(&root.path().join("nope.pdf"), &root.path().join("out"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::Io(ref e) if e.kind() == io::ErrorKind::NotFound));
    }
}
