use std::cell::RefCell;

use super::types::{ColumnInfo, ColumnSchema, ColumnType};
use crate::parser::RowListener;

const TYPE_COUNT: usize = ColumnType::ALL.len();

/// Sampling listener that infers a column schema and decides whether the
/// first row is a header.
///
/// Feed it up to `SAMPLE_SIZE` rows via `on_field`, then call
/// `on_line_count` with the number of completed lines to commit the header
/// decision and the schema. Reusable across uploads through `reset`.
pub struct MetadataExtractor {
    /// First row as observed: candidate header name plus probed cell type
    /// (`None` for empty cells).
    first_row: Vec<(String, Option<ColumnType>)>,
    /// Per-column tallies of cell types over rows after the first.
    tallies: Vec<[u64; TYPE_COUNT]>,
    line_count: usize,
    has_header: bool,
    committed: ColumnSchema,
}

impl MetadataExtractor {
    pub fn new() -> Self {
        Self {
            first_row: Vec::new(),
            tallies: Vec::new(),
            line_count: 0,
            has_header: false,
            committed: ColumnSchema::default(),
        }
    }

    /// Clear tallies and the recorded first row, retaining buffers.
    pub fn reset(&mut self) {
        self.first_row.clear();
        self.tallies.clear();
        self.line_count = 0;
        self.has_header = false;
        self.committed.columns.clear();
    }

    /// Finalize the sample: commit the header decision and the schema.
    /// Called once, after the bounded sampling parse.
    pub fn on_line_count(&mut self, line_count: usize) {
        self.line_count = line_count;
        self.has_header = self.decide_header();
        self.committed = self.build_schema();
    }

    pub fn has_header(&self) -> bool {
        self.has_header
    }

    pub fn metadata(&self) -> &ColumnSchema {
        &self.committed
    }

    fn column_count(&self) -> usize {
        self.first_row.len().max(self.tallies.len())
    }

    /// Most frequent type observed in the rows after the first; ties go to
    /// the lower lattice type.
    fn modal_type(&self, column: usize) -> Option<ColumnType> {
        let tally = self.tallies.get(column)?;
        let mut best: Option<(ColumnType, u64)> = None;
        for (idx, &count) in tally.iter().enumerate() {
            if count > 0 && best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((ColumnType::ALL[idx], count));
            }
        }
        best.map(|(column_type, _)| column_type)
    }

    /// Least upper bound of the types observed after the first row.
    fn data_lub(&self, column: usize) -> Option<ColumnType> {
        let tally = self.tallies.get(column)?;
        let mut lub = None;
        for (idx, &count) in tally.iter().enumerate() {
            if count > 0 {
                lub = Some(ColumnType::ALL[idx]);
            }
        }
        lub
    }

    /// Header when the first row's types are systematically distinct from
    /// and more string-like than the modal types of the remaining rows, or
    /// when an all-STRING first row precedes any non-STRING cell.
    fn decide_header(&self) -> bool {
        if self.first_row.is_empty() || self.tallies.iter().all(|t| t.iter().all(|&c| c == 0)) {
            return false;
        }

        let mut any_divergent = false;
        let mut all_divergent_stringier = true;
        for (column, (_, first_type)) in self.first_row.iter().enumerate() {
            let (Some(first_type), Some(modal)) = (*first_type, self.modal_type(column)) else {
                continue;
            };
            if first_type != modal {
                any_divergent = true;
                if first_type < modal {
                    all_divergent_stringier = false;
                }
            }
        }
        if any_divergent && all_divergent_stringier {
            return true;
        }

        let first_all_string = self
            .first_row
            .iter()
            .all(|(_, t)| matches!(t, Some(ColumnType::String) | None));
        let any_later_typed = (0..self.tallies.len()).any(|column| {
            self.tallies[column][..TYPE_COUNT - 1]
                .iter()
                .any(|&count| count > 0)
        });
        first_all_string && any_later_typed
    }

    fn build_schema(&self) -> ColumnSchema {
        let mut columns = Vec::with_capacity(self.column_count());
        for position in 0..self.column_count() {
            let data_type = self.data_lub(position);
            let first = self.first_row.get(position);
            let (column_type, name) = if self.has_header {
                let name = first.map(|(name, _)| name.clone()).unwrap_or_default();
                (data_type.unwrap_or(ColumnType::String), Some(name))
            } else {
                let first_type = first.and_then(|(_, t)| *t);
                let column_type = match (first_type, data_type) {
                    (Some(a), Some(b)) => a.lub(b),
                    (Some(a), None) => a,
                    (None, Some(b)) => b,
                    (None, None) => ColumnType::String,
                };
                (column_type, None)
            };
            columns.push(ColumnInfo {
                position,
                column_type,
                name,
            });
        }
        ColumnSchema::new(columns)
    }
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RowListener for MetadataExtractor {
    fn on_header(&mut self, names: &[Vec<u8>]) {
        // Sampling runs with header mode off, so this is normally unused;
        // recorded anyway for listeners wired up differently.
        self.first_row = names
            .iter()
            .map(|name| {
                let text = String::from_utf8_lossy(name).trim().to_string();
                let probed = ColumnType::probe(name);
                (text, probed)
            })
            .collect();
    }

    fn on_field(&mut self, line: usize, column: usize, value: &[u8]) {
        let probed = ColumnType::probe(value);
        if line == 0 {
            let name = String::from_utf8_lossy(value).trim().to_string();
            if column >= self.first_row.len() {
                self.first_row.resize(column + 1, (String::new(), None));
            }
            self.first_row[column] = (name, probed);
            return;
        }
        if column >= self.tallies.len() {
            self.tallies.resize(column + 1, [0; TYPE_COUNT]);
        }
        if let Some(column_type) = probed {
            self.tallies[column][column_type as usize] += 1;
        }
    }

    fn on_line_end(&mut self, _line: usize) {}
}

thread_local! {
    /// Per-worker extractor slot, reused across uploads to amortize the
    /// tally allocations. Callers must `reset` on each upload's first use.
    static EXTRACTOR_SLOT: RefCell<MetadataExtractor> = RefCell::new(MetadataExtractor::new());
}

/// Run `f` with this worker thread's cached extractor. The borrow is
/// confined to the closure, which never suspends.
pub fn with_cached_extractor<R>(f: impl FnOnce(&mut MetadataExtractor) -> R) -> R {
    EXTRACTOR_SLOT.with(|slot| f(&mut slot.borrow_mut()))
}
