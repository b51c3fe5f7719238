//! Column Schema Inference
//!
//! Types for the inferred column schema and the sampling listener that
//! builds one from a bounded prefix of the upload.
//!
//! ## Core Concepts
//! - **Type lattice**: cell types are ordered BOOLEAN ≺ LONG ≺ DOUBLE ≺
//!   DATE ≺ STRING; a column's inferred type is the least upper bound of
//!   every cell type observed in the sample.
//! - **Header heuristic**: the first row is treated as a header when its
//!   cell types are systematically more string-like than the modal types
//!   of the remaining sampled rows.
//! - **Worker cache**: each worker thread keeps one reusable
//!   `MetadataExtractor` in a thread-local slot, reset on every upload's
//!   first use.

pub mod extractor;
pub mod types;

pub use extractor::{MetadataExtractor, with_cached_extractor};
pub use types::{ColumnInfo, ColumnSchema, ColumnType, parse_date_millis};
