//! Streaming Ingestion Module
//!
//! The two-phase streaming state machine that turns multipart lifecycle
//! events into journal appends, plus the HTTP endpoint that feeds it.
//!
//! ## Flow
//! On the first data chunk of the `data` part the handler detects the
//! text dialect, runs a bounded sampling pass for type inference over the
//! same bytes, rewinds the parser, and replays that chunk (and streams all
//! later chunks) into the journal importer. The sampling prefix is exactly
//! what the first chunk delivers: the handler never accumulates bytes
//! waiting for more rows, so the first commit stays low-latency.

pub mod handler;
pub mod handlers;
pub mod state;
pub mod types;

pub use handler::{IngestHandler, RESPONSE_BODY, SAMPLE_SIZE};
pub use state::{IngestPhase, IngestState};
pub use types::PartDisposition;

#[cfg(test)]
mod tests;
