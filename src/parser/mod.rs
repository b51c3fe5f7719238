//! Streaming Delimited-Text Parser
//!
//! A stateful, resumable tokenizer over raw network byte windows. Each
//! `parse` call consumes one window and emits field and line events to a
//! `RowListener`; a field, a quoted region or a CR LF pair may be split at
//! any byte position between two calls and the parser carries the open
//! state across.
//!
//! ## Key operations
//! - **Bounded parse**: `parse(window, max_lines, listener)` stops after a
//!   line budget, used for the type-inference sampling pass.
//! - **Restart**: resets position counters and the carry buffer without
//!   discarding the dialect, so the sampled window can be replayed into a
//!   different listener.
//! - **Flush**: `parse_last` closes a trailing unterminated field/line as
//!   if a terminator had arrived at end of input.

pub mod listener;
pub mod text;

pub use listener::{ParseWarning, RowListener};
pub use text::TextParser;
