//! Delimited-Text Format Detection
//!
//! Inspects the first byte window of an upload and guesses the file's
//! dialect (CSV, TAB or PIPE) from per-line delimiter statistics. The
//! detection result carries the standard deviation of the winning
//! delimiter's per-line count; callers treat the result as valid only when
//! the deviation is below 0.5, i.e. the delimiter appears almost the same
//! number of times on every sampled line.

pub mod detector;

pub use detector::{Dialect, FormatDetection, detect};

#[cfg(test)]
mod tests;
