//! Journal Storage Module
//!
//! The append-oriented, column-oriented on-disk table ("journal") and the
//! listener that streams parsed upload rows into one.
//!
//! ## Layout
//! A journal named `n` lives at `<data-dir>/n/`: one append-only file per
//! column plus a `_meta.json` sidecar carrying the schema and the committed
//! row count. The sidecar is rewritten on every successful close, so rows
//! appended by an upload become visible only when the upload closes
//! cleanly; an abnormal teardown leaves partially appended cells behind
//! without advancing the committed count (no rollback).

pub mod importer;
pub mod store;
pub mod types;

pub use importer::JournalImporter;
pub use store::{Journal, JournalFactory};
pub use types::Value;
