//! Represents a file received in a multipart upload.

use bytes::Bytes;

/// One uploaded file part.
///
/// `filename` is already sanitized; the raw client-supplied name never
/// reaches the filesystem.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    /// Sanitized filename, safe to join onto a workspace path.
    pub filename: String,

    /// Content type announced by the client, if any. Informational only;
    /// formats are detected from the bytes.
    pub content_type: Option<String>,

    /// File payload.
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content_type: Option<String>, data: Bytes) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
}
