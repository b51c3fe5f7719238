use crate::journal::JournalImporter;
use crate::parser::TextParser;

/// Where the upload stands in the multipart lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestPhase {
    /// No part in progress.
    Idle,
    /// Part opened; the next data chunk doubles as the sampling prefix.
    AwaitFirstChunk,
    /// Dialect chosen and schema committed; chunks flow to the importer.
    Streaming,
    /// Dialect undetectable; remaining part bytes are discarded.
    Skipping,
    /// Terminal within the request (protocol-level rejection).
    Aborted,
}

/// Per-upload state holder. Owns the parser and importer scoped to the
/// current part; no logic beyond construction and release.
pub struct IngestState {
    pub phase: IngestPhase,
    /// True once the sampling pass over the first chunk has completed.
    pub analysed: bool,
    /// False discards all further data bytes of the current part.
    pub dialect_valid: bool,
    pub parser: Option<TextParser>,
    pub importer: Option<JournalImporter>,
}

impl IngestState {
    pub fn new() -> Self {
        Self {
            phase: IngestPhase::Idle,
            analysed: false,
            dialect_valid: false,
            parser: None,
            importer: None,
        }
    }

    /// Drop the part-scoped resources without committing.
    pub fn release(&mut self) {
        self.parser = None;
        self.importer = None;
    }
}

impl Default for IngestState {
    fn default() -> Self {
        Self::new()
    }
}
