use std::io;
use std::path::PathBuf;

use super::store::Journal;
use super::types::Value;
use crate::error::Result;
use crate::parser::RowListener;
use crate::schema::{ColumnSchema, ColumnType, parse_date_millis};

/// Counters reported when an upload closes cleanly.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportStats {
    pub rows: u64,
    pub cell_errors: u64,
}

/// Listener that persists parsed rows into one named journal.
///
/// `on_metadata` must be called once, before any field event; it opens or
/// creates the journal. Field events then parse each cell per its column
/// type (malformed cells are nulled and counted) and `on_line_end` appends
/// the completed row. Appends become durable on `close`. I/O failures
/// during streaming are latched and surfaced by `close`; row events after
/// a failure are dropped.
pub struct JournalImporter {
    root: PathBuf,
    name: String,
    journal: Option<Journal>,
    row: Vec<Value>,
    stats: ImportStats,
    pending_io: Option<io::Error>,
}

impl JournalImporter {
    pub(crate) fn new(root: PathBuf, name: &str) -> Self {
        Self {
            root,
            name: name.to_string(),
            journal: None,
            row: Vec::new(),
            stats: ImportStats::default(),
            pending_io: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Open or create the journal with the inferred schema. Called exactly
    /// once per upload, after sampling.
    pub fn on_metadata(&mut self, schema: &ColumnSchema) -> Result<()> {
        self.journal = Some(Journal::open_or_create(&self.root, &self.name, schema)?);
        Ok(())
    }

    /// Flush buffered rows and commit. Durability is only guaranteed here;
    /// dropping the importer without closing leaves appended cells
    /// uncommitted.
    pub fn close(mut self) -> Result<ImportStats> {
        if let Some(err) = self.pending_io.take() {
            return Err(err.into());
        }
        if let Some(journal) = &mut self.journal {
            journal.commit()?;
        }
        Ok(self.stats)
    }
}

/// Parse one raw cell per its declared column type. `None` means the cell
/// is malformed for that type; empty cells are valid nulls.
fn parse_cell(column_type: ColumnType, raw: &[u8]) -> Option<Value> {
    let text = std::str::from_utf8(raw).ok()?;
    let text = text.trim();
    if text.is_empty() {
        return Some(Value::Null);
    }
    match column_type {
        ColumnType::Boolean => {
            if text.eq_ignore_ascii_case("true") {
                Some(Value::Boolean(true))
            } else if text.eq_ignore_ascii_case("false") {
                Some(Value::Boolean(false))
            } else {
                None
            }
        }
        ColumnType::Long => text.parse::<i64>().ok().map(Value::Long),
        ColumnType::Double => text.parse::<f64>().ok().map(Value::Double),
        ColumnType::Date => parse_date_millis(text).map(Value::Date),
        ColumnType::String => Some(Value::Str(text.to_string())),
    }
}

impl RowListener for JournalImporter {
    fn on_header(&mut self, _names: &[Vec<u8>]) {
        // Column names were fixed by on_metadata; the replayed header row
        // carries no data.
    }

    fn on_field(&mut self, _line: usize, column: usize, value: &[u8]) {
        if self.pending_io.is_some() {
            return;
        }
        let Some(journal) = &self.journal else {
            return;
        };
        let Some(info) = journal.schema().columns.get(column) else {
            // Row wider than the journal: surplus cell dropped.
            self.stats.cell_errors += 1;
            return;
        };
        match parse_cell(info.column_type, value) {
            Some(parsed) => self.row.push(parsed),
            None => {
                self.stats.cell_errors += 1;
                self.row.push(Value::Null);
            }
        }
    }

    fn on_line_end(&mut self, _line: usize) {
        if self.pending_io.is_some() {
            return;
        }
        let Some(journal) = &mut self.journal else {
            return;
        };
        let result = journal.append_row(&self.row);
        self.row.clear();
        match result {
            Ok(()) => self.stats.rows += 1,
            Err(err) => {
                tracing::error!("append to journal '{}' failed: {}", self.name, err);
                self.pending_io = Some(err);
            }
        }
    }
}
