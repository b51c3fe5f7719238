use std::sync::Arc;

use super::state::{IngestPhase, IngestState};
use super::types::PartDisposition;
use crate::error::{IngestError, Result};
use crate::format;
use crate::journal::JournalFactory;
use crate::parser::TextParser;
use crate::schema::with_cached_extractor;

/// Rows sampled from the first chunk for type inference.
pub const SAMPLE_SIZE: usize = 100;

/// Body of the terminal success response.
pub const RESPONSE_BODY: &str = "OK, imported\r\n";

/// The multipart state machine: one instance per request.
///
/// Lifecycle events arrive as plain method calls; each runs to completion
/// without suspending, and the byte windows passed to `on_data` are only
/// touched for the duration of the call.
pub struct IngestHandler {
    factory: Arc<JournalFactory>,
    state: IngestState,
}

impl IngestHandler {
    pub fn new(factory: Arc<JournalFactory>) -> Self {
        Self {
            factory,
            state: IngestState::new(),
        }
    }

    pub fn phase(&self) -> IngestPhase {
        self.state.phase
    }

    /// A new part opened. File parts must belong to the `data` field;
    /// non-file parts are ignored outright.
    pub fn on_part_begin(&mut self, part: &PartDisposition) -> Result<()> {
        let Some(filename) = &part.filename else {
            return Ok(());
        };
        if part.name != "data" {
            self.state.phase = IngestPhase::Aborted;
            return Err(IngestError::UnrecognisedField);
        }
        let importer = match self.factory.importer(filename) {
            Ok(importer) => importer,
            Err(err) => {
                self.state.phase = IngestPhase::Aborted;
                return Err(err);
            }
        };
        tracing::info!("import into journal '{}' started", filename);
        self.state.analysed = false;
        self.state.dialect_valid = false;
        self.state.importer = Some(importer);
        self.state.phase = IngestPhase::AwaitFirstChunk;
        Ok(())
    }

    /// One chunk of part payload. The first chunk of the data part is
    /// analysed (dialect + bounded sampling pass), rewound and replayed;
    /// every further chunk streams straight into the importer.
    pub fn on_data(&mut self, window: &[u8]) -> Result<()> {
        match self.state.phase {
            IngestPhase::AwaitFirstChunk => {
                self.analyse_format(window);
                if self.state.dialect_valid {
                    if let Err(err) = self.analyse_columns(window) {
                        self.state.phase = IngestPhase::Aborted;
                        self.state.release();
                        return Err(err);
                    }
                    self.stream(window);
                    self.state.phase = IngestPhase::Streaming;
                } else {
                    self.state.phase = IngestPhase::Skipping;
                }
            }
            IngestPhase::Streaming => self.stream(window),
            IngestPhase::Idle | IngestPhase::Skipping | IngestPhase::Aborted => {}
        }
        Ok(())
    }

    /// The current part ended: flush the trailing line, release the parser
    /// and commit the importer.
    pub fn on_part_end(&mut self) -> Result<()> {
        match self.state.phase {
            IngestPhase::Streaming => {
                if let (Some(parser), Some(importer)) =
                    (self.state.parser.as_mut(), self.state.importer.as_mut())
                {
                    parser.parse_last(importer);
                }
                self.state.parser = None;
                if let Some(importer) = self.state.importer.take() {
                    let name = importer.name().to_string();
                    match importer.close() {
                        Ok(stats) => tracing::info!(
                            "journal '{}': {} rows imported, {} cell errors",
                            name,
                            stats.rows,
                            stats.cell_errors
                        ),
                        Err(err) => {
                            self.state.phase = IngestPhase::Aborted;
                            return Err(err);
                        }
                    }
                }
                self.state.phase = IngestPhase::Idle;
            }
            IngestPhase::AwaitFirstChunk | IngestPhase::Skipping => {
                // Nothing to commit: either no bytes arrived or the format
                // was undetectable and the bytes were discarded.
                self.state.release();
                self.state.phase = IngestPhase::Idle;
            }
            IngestPhase::Idle | IngestPhase::Aborted => {}
        }
        Ok(())
    }

    /// Terminal event after the final part: the upload was syntactically
    /// valid, so the success body goes out even if every part was skipped.
    pub fn on_complete(&mut self) -> &'static str {
        RESPONSE_BODY
    }

    /// Exceptional teardown (client disconnect, stream error): release the
    /// part-scoped resources without committing and without a response.
    pub fn on_teardown(&mut self, reason: &str) {
        if self.state.importer.is_some() || self.state.parser.is_some() {
            tracing::warn!("upload torn down mid-part: {}", reason);
        }
        self.state.release();
        self.state.phase = IngestPhase::Aborted;
    }

    /// Run the dialect detector over the first chunk and install (or
    /// recycle) the matching parser.
    fn analyse_format(&mut self, window: &[u8]) {
        let detection = format::detect(window);
        match detection.dialect {
            Some(dialect) if detection.is_valid() => {
                match &mut self.state.parser {
                    Some(parser) => parser.clear(),
                    None => self.state.parser = Some(TextParser::new(dialect)),
                }
                self.state.dialect_valid = true;
                tracing::debug!("dialect {:?}, stddev {:.3}", dialect, detection.std_dev);
            }
            _ => {
                self.state.dialect_valid = false;
                tracing::warn!(
                    "undetectable text format (stddev {:.3}); part bytes will be discarded",
                    detection.std_dev
                );
            }
        }
    }

    /// Bounded sampling pass over the first chunk: infer the schema with
    /// this worker's cached extractor, commit it to the importer, enable
    /// header handling and rewind the parser so the same window can be
    /// replayed into the importer.
    fn analyse_columns(&mut self, window: &[u8]) -> Result<()> {
        let state = &mut self.state;
        let (Some(parser), Some(importer)) = (state.parser.as_mut(), state.importer.as_mut())
        else {
            return Ok(());
        };
        with_cached_extractor(|extractor| -> Result<()> {
            extractor.reset();
            parser.parse(window, SAMPLE_SIZE, extractor);
            extractor.on_line_count(parser.line_count());
            importer.on_metadata(extractor.metadata())?;
            parser.set_header(extractor.has_header());
            Ok(())
        })?;
        parser.restart();
        state.analysed = true;
        Ok(())
    }

    fn stream(&mut self, window: &[u8]) {
        if let (Some(parser), Some(importer)) =
            (self.state.parser.as_mut(), self.state.importer.as_mut())
        {
            parser.parse(window, usize::MAX, importer);
        }
    }
}
