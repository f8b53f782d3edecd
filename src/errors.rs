use crate::{models::tab::Tab, services::conversion_service::ConvertError, views};
use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::fmt;

/// A user-facing error: rendered as the home page, on `tab`, with the
/// message shown above the forms.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub tab: Tab,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            tab: Tab::default(),
        }
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Show the error on `tab` instead of the default one.
    pub fn on_tab(mut self, tab: Tab) -> Self {
        self.tab = tab;
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let page = views::index_page(self.tab, Some(&self.message));
        (self.status, Html(page)).into_response()
    }
}

impl From<ConvertError> for AppError {
    fn from(err: ConvertError) -> Self {
        match &err {
            ConvertError::NotAPdf
            | ConvertError::InvalidPdf(_)
            | ConvertError::PasswordProtected
            | ConvertError::UnsupportedImage { .. }
            | ConvertError::InvalidImage { .. }
            | ConvertError::NoImages => AppError::bad_request(capitalize(&err.to_string())),
            ConvertError::EmptyPdf => {
                AppError::new(StatusCode::UNPROCESSABLE_ENTITY, capitalize(&err.to_string()))
            }
            ConvertError::RendererUnavailable(reason) => {
                tracing::warn!("rejecting PDF conversion: renderer unavailable ({})", reason);
                AppError::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "PDF conversion is temporarily unavailable.",
                )
            }
            _ => {
                tracing::error!("conversion failed: {}", err);
                AppError::internal("Conversion failed. Please try again.")
            }
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::new(err.status(), format!("Invalid upload: {}", err.body_text()))
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}
