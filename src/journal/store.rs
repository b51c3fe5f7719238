use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};
use crate::journal::types::Value;
use crate::schema::{ColumnSchema, ColumnType};

const META_FILE: &str = "_meta.json";

/// On-disk metadata sidecar. `row_count` is the committed count: rows
/// appended after the last commit are invisible to readers.
#[derive(Debug, Serialize, Deserialize)]
struct JournalMeta {
    name: String,
    row_count: u64,
    schema: ColumnSchema,
}

/// An append-oriented columnar table: one file per column plus the
/// metadata sidecar, all under `<root>/<name>/`.
pub struct Journal {
    name: String,
    dir: PathBuf,
    schema: ColumnSchema,
    writers: Vec<BufWriter<File>>,
    row_count: u64,
}

impl Journal {
    /// Open the named journal, creating it with `incoming` as its schema if
    /// absent. An existing journal keeps its own schema; `incoming` must be
    /// assignment-compatible with it column-by-column.
    pub fn open_or_create(root: &Path, name: &str, incoming: &ColumnSchema) -> Result<Journal> {
        let dir = root.join(name);
        let meta_path = dir.join(META_FILE);

        let (schema, row_count) = if meta_path.exists() {
            let meta = read_meta(&meta_path)?;
            check_compatible(name, &meta.schema, incoming)?;
            (meta.schema, meta.row_count)
        } else {
            fs::create_dir_all(&dir)?;
            let meta = JournalMeta {
                name: name.to_string(),
                row_count: 0,
                schema: incoming.clone(),
            };
            write_meta(&meta_path, &meta)?;
            (meta.schema, 0)
        };

        let mut writers = Vec::with_capacity(schema.column_count());
        for column in &schema.columns {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(column_file(column.position)))?;
            writers.push(BufWriter::new(file));
        }

        Ok(Journal {
            name: name.to_string(),
            dir,
            schema,
            writers,
            row_count,
        })
    }

    /// Open an existing journal for reading its committed contents.
    pub fn open(root: &Path, name: &str) -> Result<Journal> {
        let dir = root.join(name);
        let meta = read_meta(&dir.join(META_FILE))?;
        Ok(Journal {
            name: meta.name,
            dir,
            schema: meta.schema,
            writers: Vec::new(),
            row_count: meta.row_count,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    /// Committed rows plus rows appended through this handle.
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Append one row, in schema column order. Missing trailing cells are
    /// written as nulls.
    pub fn append_row(&mut self, row: &[Value]) -> io::Result<()> {
        for (idx, column) in self.schema.columns.iter().enumerate() {
            let value = row.get(idx).unwrap_or(&Value::Null);
            write_cell(&mut self.writers[idx], column.column_type, value)?;
        }
        self.row_count += 1;
        Ok(())
    }

    /// Flush column buffers and persist the new committed row count.
    pub fn commit(&mut self) -> io::Result<()> {
        for writer in &mut self.writers {
            writer.flush()?;
        }
        let meta = JournalMeta {
            name: self.name.clone(),
            row_count: self.row_count,
            schema: self.schema.clone(),
        };
        write_meta(&self.dir.join(META_FILE), &meta)
            .map_err(|e| io::Error::other(e.to_string()))?;
        Ok(())
    }

    /// Decode the committed cells of one column.
    pub fn read_column(&self, position: usize) -> io::Result<Vec<Value>> {
        let column = self
            .schema
            .columns
            .get(position)
            .ok_or_else(|| io::Error::other(format!("no column at position {}", position)))?;
        let mut bytes = Vec::new();
        File::open(self.dir.join(column_file(position)))?.read_to_end(&mut bytes)?;

        let mut values = Vec::with_capacity(self.row_count as usize);
        let mut cursor = 0usize;
        while values.len() < self.row_count as usize {
            let (value, next) = read_cell(&bytes, cursor, column.column_type)?;
            values.push(value);
            cursor = next;
        }
        Ok(values)
    }
}

fn column_file(position: usize) -> String {
    format!("{}.col", position)
}

fn read_meta(path: &Path) -> Result<JournalMeta> {
    let mut text = String::new();
    File::open(path)?.read_to_string(&mut text)?;
    let meta = serde_json::from_str(&text)
        .map_err(|e| IngestError::Importer(io::Error::new(io::ErrorKind::InvalidData, e)))?;
    Ok(meta)
}

fn write_meta(path: &Path, meta: &JournalMeta) -> Result<()> {
    let text = serde_json::to_string_pretty(meta)
        .map_err(|e| IngestError::Importer(io::Error::other(e)))?;
    let mut file = File::create(path)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

/// A cell of `incoming` type can be appended to an `existing` column when
/// the types match, the column is STRING (everything prints), or a LONG
/// feeds a DOUBLE column.
fn assignable(existing: ColumnType, incoming: ColumnType) -> bool {
    existing == incoming
        || existing == ColumnType::String
        || (existing == ColumnType::Double && incoming == ColumnType::Long)
}

fn check_compatible(name: &str, existing: &ColumnSchema, incoming: &ColumnSchema) -> Result<()> {
    if existing.column_count() != incoming.column_count() {
        return Err(IngestError::SchemaIncompatible {
            journal: name.to_string(),
            detail: format!(
                "column count {} != {}",
                incoming.column_count(),
                existing.column_count()
            ),
        });
    }
    for (have, want) in existing.columns.iter().zip(&incoming.columns) {
        if !assignable(have.column_type, want.column_type) {
            return Err(IngestError::SchemaIncompatible {
                journal: name.to_string(),
                detail: format!(
                    "column {} is {:?}, upload has {:?}",
                    have.position, have.column_type, want.column_type
                ),
            });
        }
    }
    Ok(())
}

// Cell wire format: one presence byte, then a type-dependent payload.
// Strings are u32-length-prefixed; LONG/DATE/DOUBLE are 8 bytes LE.

fn write_cell(out: &mut impl Write, column_type: ColumnType, value: &Value) -> io::Result<()> {
    if value.is_null() {
        return out.write_all(&[0]);
    }
    out.write_all(&[1])?;
    match (column_type, value) {
        (ColumnType::Boolean, Value::Boolean(b)) => out.write_all(&[*b as u8]),
        (ColumnType::Long, Value::Long(n)) | (ColumnType::Date, Value::Date(n)) => {
            out.write_all(&n.to_le_bytes())
        }
        (ColumnType::Double, Value::Double(d)) => out.write_all(&d.to_le_bytes()),
        (ColumnType::String, Value::Str(s)) => {
            out.write_all(&(s.len() as u32).to_le_bytes())?;
            out.write_all(s.as_bytes())
        }
        _ => Err(io::Error::other(format!(
            "value {:?} does not fit column type {:?}",
            value, column_type
        ))),
    }
}

fn read_cell(bytes: &[u8], at: usize, column_type: ColumnType) -> io::Result<(Value, usize)> {
    let truncated = || io::Error::new(io::ErrorKind::UnexpectedEof, "truncated column file");
    let presence = *bytes.get(at).ok_or_else(truncated)?;
    let at = at + 1;
    if presence == 0 {
        return Ok((Value::Null, at));
    }
    match column_type {
        ColumnType::Boolean => {
            let b = *bytes.get(at).ok_or_else(truncated)?;
            Ok((Value::Boolean(b != 0), at + 1))
        }
        ColumnType::Long | ColumnType::Date => {
            let raw = bytes.get(at..at + 8).ok_or_else(truncated)?;
            let n = i64::from_le_bytes(raw.try_into().expect("8-byte slice"));
            let value = if column_type == ColumnType::Long {
                Value::Long(n)
            } else {
                Value::Date(n)
            };
            Ok((value, at + 8))
        }
        ColumnType::Double => {
            let raw = bytes.get(at..at + 8).ok_or_else(truncated)?;
            let d = f64::from_le_bytes(raw.try_into().expect("8-byte slice"));
            Ok((Value::Double(d), at + 8))
        }
        ColumnType::String => {
            let raw = bytes.get(at..at + 4).ok_or_else(truncated)?;
            let len = u32::from_le_bytes(raw.try_into().expect("4-byte slice")) as usize;
            let at = at + 4;
            let raw = bytes.get(at..at + len).ok_or_else(truncated)?;
            Ok((
                Value::Str(String::from_utf8_lossy(raw).into_owned()),
                at + len,
            ))
        }
    }
}

/// Creates importers rooted at the server's data directory and vets upload
/// filenames before they become journal names.
#[derive(Debug, Clone)]
pub struct JournalFactory {
    root: PathBuf,
}

impl JournalFactory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build an importer for the named journal. The name must be a plain
    /// identifier-like filename; path separators and other non-identifier
    /// characters are rejected so an upload cannot steer the storage path.
    pub fn importer(&self, name: &str) -> Result<super::importer::JournalImporter> {
        let valid = Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.\-]*$").unwrap();
        if !valid.is_match(name) {
            return Err(IngestError::BadJournalName(name.to_string()));
        }
        Ok(super::importer::JournalImporter::new(
            self.root.clone(),
            name,
        ))
    }
}
