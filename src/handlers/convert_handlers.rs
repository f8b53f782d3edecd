//! `POST /convert` — the single multipart endpoint behind both tabs.
//!
//! Form fields:
//! - `tab`   — `pdf2png` or `png2pdf`
//! - `file`  — the PDF (pdf2png)
//! - `files` — one or more PNG/JPEG images, repeated (png2pdf)
//!
//! The converted file is streamed back as an attachment.

use crate::{
    errors::AppError,
    models::{converted::Download, tab::Tab, upload::UploadedFile},
    services::filenames::secure_filename,
    state::AppState,
};
use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use bytes::Bytes;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

const MISSING_PDF: &str = "Please upload a PDF file.";
const MISSING_IMAGES: &str = "Please upload at least one PNG/JPG file.";
const UNKNOWN_TAB: &str = "Unknown conversion type.";

/// Everything the form carried, before dispatch.
#[derive(Debug, Default)]
struct ConvertForm {
    tab: Option<String>,
    file: Option<UploadedFile>,
    files: Vec<UploadedFile>,
}

pub async fn convert(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut form = ConvertForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "tab" => form.tab = Some(field.text().await?),
            "file" | "files" => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                let fallback = if name == "file" { "document.pdf" } else { "image" };
                let Some(upload) = to_upload(filename.as_deref(), content_type, data, fallback)
                else {
                    continue;
                };
                if name == "file" {
                    form.file = Some(upload);
                } else {
                    form.files.push(upload);
                }
            }
            other => debug!("ignoring form field `{}`", other),
        }
    }

    let tab = form
        .tab
        .as_deref()
        .and_then(|t| t.parse::<Tab>().ok())
        .ok_or_else(|| AppError::bad_request(UNKNOWN_TAB))?;

    let download = match tab {
        Tab::Pdf2Png => {
            let upload = form
                .file
                .ok_or_else(|| AppError::bad_request(MISSING_PDF).on_tab(tab))?;
            info!("pdf2png: {} ({} bytes)", upload.filename, upload.len());
            state.converter.pdf_to_png_zip(upload).await
        }
        Tab::Png2Pdf => {
            if form.files.is_empty() {
                return Err(AppError::bad_request(MISSING_IMAGES).on_tab(tab));
            }
            info!("png2pdf: {} images", form.files.len());
            state.converter.images_to_pdf(form.files).await
        }
    }
    .map_err(|err| AppError::from(err).on_tab(tab))?;

    Ok(attachment(download))
}

/// Turn a multipart file part into an upload. Parts without content are
/// what browsers send for an empty file input; they count as absent.
fn to_upload(
    filename: Option<&str>,
    content_type: Option<String>,
    data: Bytes,
    fallback: &str,
) -> Option<UploadedFile> {
    if data.is_empty() {
        return None;
    }
    let name = filename
        .and_then(secure_filename)
        .unwrap_or_else(|| fallback.to_string());
    Some(UploadedFile::new(name, content_type, data))
}

fn attachment(download: Download) -> Response {
    let Download {
        download_name,
        content_type,
        size_bytes,
        file,
    } = download;

    let mut response = Response::new(Body::from_stream(ReaderStream::new(file)));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size_bytes));
    // `download_name` is built from sanitized filenames only.
    if let Ok(value) =
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", download_name))
    {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}
