//! journaldb — Streaming Tabular Import for a Columnar Journal Store
//!
//! This library crate defines the modules behind the HTTP import endpoint
//! of an append-oriented, column-oriented store. It serves as the
//! foundation for the server binary (`main.rs`).
//!
//! ## Architecture Modules
//! The pipeline is composed of five loosely coupled subsystems:
//!
//! - **`format`**: Dialect detection. Inspects the first byte window of an
//!   upload and picks CSV, TAB or PIPE from per-line delimiter statistics.
//! - **`parser`**: The resumable delimited-text tokenizer. Consumes raw
//!   network byte windows (which may split a field, a quote or a line at
//!   any position) and emits field events to a listener.
//! - **`schema`**: Column type inference. Samples a bounded prefix of the
//!   upload, infers per-column types on a fixed precedence lattice and
//!   decides whether the first row is a header.
//! - **`journal`**: The on-disk columnar journal and the importing
//!   listener that appends parsed rows to it.
//! - **`ingest`**: The multipart state machine tying it all together, plus
//!   the axum endpoint that feeds it lifecycle events.

pub mod error;
pub mod format;
pub mod ingest;
pub mod journal;
pub mod parser;
pub mod schema;
