use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Storable cell types, declared in lattice order: a variant can always be
/// widened to a later one (everything prints as a string).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ColumnType {
    Boolean,
    Long,
    Double,
    Date,
    String,
}

impl ColumnType {
    pub const ALL: [ColumnType; 5] = [
        ColumnType::Boolean,
        ColumnType::Long,
        ColumnType::Double,
        ColumnType::Date,
        ColumnType::String,
    ];

    /// Least upper bound on the type lattice.
    pub fn lub(self, other: ColumnType) -> ColumnType {
        self.max(other)
    }

    /// Classify a raw cell. `None` for empty cells, which are type-neutral:
    /// they become nulls on import and must not demote a column's type.
    pub fn probe(cell: &[u8]) -> Option<ColumnType> {
        let Ok(text) = std::str::from_utf8(cell) else {
            return Some(ColumnType::String);
        };
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("false") {
            return Some(ColumnType::Boolean);
        }
        if text.parse::<i64>().is_ok() {
            return Some(ColumnType::Long);
        }
        if text.parse::<f64>().is_ok() {
            return Some(ColumnType::Double);
        }
        if parse_date_millis(text).is_some() {
            return Some(ColumnType::Date);
        }
        Some(ColumnType::String)
    }
}

/// Parse a DATE cell (`YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS[.fff]`) into
/// epoch milliseconds; bare dates are midnight UTC.
pub fn parse_date_millis(text: &str) -> Option<i64> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(datetime.and_utc().timestamp_millis());
    }
    None
}

/// One column of an inferred schema. `name` is present only when a header
/// row was detected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub position: usize,
    pub column_type: ColumnType,
    pub name: Option<String>,
}

impl ColumnInfo {
    /// Display/storage label: the header name when present and non-empty,
    /// otherwise a positional `c{n}` fallback.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("c{}", self.position),
        }
    }
}

/// Ordered column descriptors for one journal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub columns: Vec<ColumnInfo>,
}

impl ColumnSchema {
    pub fn new(columns: Vec<ColumnInfo>) -> Self {
        Self { columns }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}
