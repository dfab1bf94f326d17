//! Uploaded files.
//!
//! Parsing `multipart/form-data` bodies is the web layer's job; by the time
//! a submission reaches formal each file part is an [`UploadedFile`].

use serde::{Deserialize, Serialize};

/// A file received as part of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// The original filename as provided by the client.
    pub name: String,
    /// The MIME content type of the file.
    pub content_type: String,
    /// The size of the file content in bytes.
    pub size: usize,
    /// The raw file content.
    pub content: Vec<u8>,
}

impl UploadedFile {
    /// Creates an `UploadedFile`, deriving `size` from the content.
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size: content.len(),
            content,
        }
    }

    /// Returns `true` for the empty part a browser sends when no file was chosen.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.content.is_empty()
    }
}
