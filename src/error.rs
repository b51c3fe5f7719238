//! Ingestion Error Taxonomy
//!
//! One enum for everything that can abort an upload, so the HTTP layer can
//! map error kinds to status codes in a single place. Per-cell parse errors
//! are not represented here: they are absorbed by the importer (the cell is
//! nulled and counted) and never abort the upload.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// A file part arrived for a form field other than `data`.
    #[error("Unrecognised field")]
    UnrecognisedField,

    /// The upload filename contains characters unusable as a journal name.
    #[error("invalid journal name: {0}")]
    BadJournalName(String),

    /// The inferred schema cannot be appended to the existing journal.
    #[error("schema incompatible with journal '{journal}': {detail}")]
    SchemaIncompatible { journal: String, detail: String },

    /// Disk failure while creating, appending to, or committing a journal.
    #[error("journal I/O: {0}")]
    Importer(#[from] std::io::Error),

    /// The client went away mid-upload; resources released, no response.
    #[error("client disconnected")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, IngestError>;
