//! Ingestion Data Types
//!
//! Small carrier types passed between the HTTP adapter and the state
//! machine.

/// The `Content-Disposition` facts of one multipart part: the form field
/// name and, for file parts, the upload filename.
#[derive(Debug, Clone)]
pub struct PartDisposition {
    pub name: String,
    pub filename: Option<String>,
}

impl PartDisposition {
    pub fn new(name: impl Into<String>, filename: Option<String>) -> Self {
        Self {
            name: name.into(),
            filename,
        }
    }
}
