/// Non-fatal condition reported to the listener during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseWarning {
    /// End of input reached inside an open `"` region; the field is closed
    /// at EOF and delivered anyway.
    UnterminatedQuote,
}

/// Receiver of tokenizer events.
///
/// Field values are borrowed from the current byte window (or from the
/// parser's internal carry buffer when a field was split across windows)
/// and must not be retained past the call.
pub trait RowListener {
    /// First completed line of the part, when header mode is enabled.
    /// Replaces the `on_field`/`on_line_end` events for that line.
    fn on_header(&mut self, _names: &[Vec<u8>]) {}

    fn on_field(&mut self, line: usize, column: usize, value: &[u8]);

    fn on_line_end(&mut self, line: usize);

    fn on_warning(&mut self, _line: usize, _warning: ParseWarning) {}
}
