//! Represents a conversion result ready to be sent to the client.

use std::path::PathBuf;
use tokio::fs::File;

/// A file produced inside a request workspace.
#[derive(Clone, Debug)]
pub struct ConvertedFile {
    /// Name offered to the browser in `Content-Disposition`.
    pub download_name: String,

    /// MIME type of the payload.
    pub content_type: &'static str,

    /// Location of the payload inside the workspace.
    pub path: PathBuf,
}

/// An opened conversion result whose workspace has already been removed.
///
/// The open handle keeps the bytes readable while the body streams out.
#[derive(Debug)]
pub struct Download {
    pub download_name: String,
    pub content_type: &'static str,
    pub size_bytes: u64,
    pub file: File,
}
