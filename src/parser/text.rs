use super::listener::{ParseWarning, RowListener};
use crate::format::Dialect;

/// Where the scanner stands inside the current field. Persisted across
/// windows so a split at any byte position resumes correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldState {
    /// Between fields; no byte of the next field seen yet.
    BeforeField,
    /// Inside a field that did not start with a quote.
    Unquoted,
    /// Inside a `"` region; delimiters and newlines are literal.
    Quoted,
    /// A `"` was seen inside a quoted region at a window boundary; the next
    /// byte decides between an escaped quote and the end of the region.
    QuoteQuote,
    /// Quoted region closed; waiting for the delimiter or line end.
    AfterQuoted,
}

/// Resumable tokenizer for one delimited-text dialect.
///
/// The Csv, Tab and Pipe variants are the same engine parameterized by the
/// dialect's delimiter byte. Fields that fit inside one window are emitted
/// as zero-copy subslices; only fields split across windows (or containing
/// escaped quotes) go through the internal carry buffer.
pub struct TextParser {
    dialect: Dialect,
    delimiter: u8,
    state: FieldState,
    /// Bytes of the current field not yet delivered.
    carry: Vec<u8>,
    header_enabled: bool,
    header_done: bool,
    header_fields: Vec<Vec<u8>>,
    line_index: usize,
    col_index: usize,
    line_count: usize,
}

impl TextParser {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            delimiter: dialect.delimiter(),
            state: FieldState::BeforeField,
            carry: Vec::new(),
            header_enabled: false,
            header_done: false,
            header_fields: Vec::new(),
            line_index: 0,
            col_index: 0,
            line_count: 0,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Completed lines since the last `restart`/`clear`.
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// When enabled, the first completed line is delivered to
    /// `RowListener::on_header` instead of the field/line events.
    pub fn set_header(&mut self, enabled: bool) {
        self.header_enabled = enabled;
    }

    /// Reset position counters and the carry buffer without discarding the
    /// dialect, so already-seen bytes can be replayed into a new listener.
    pub fn restart(&mut self) {
        self.state = FieldState::BeforeField;
        self.carry.clear();
        self.header_done = false;
        self.header_fields.clear();
        self.line_index = 0;
        self.col_index = 0;
        self.line_count = 0;
    }

    /// Back to freshly-constructed state (header mode off).
    pub fn clear(&mut self) {
        self.restart();
        self.header_enabled = false;
    }

    /// Consume one byte window, emitting events to `listener`. Stops after
    /// `max_lines` completed lines (counted since the last restart) or at
    /// the end of the window, whichever comes first. A trailing incomplete
    /// field is buffered so the next call resumes seamlessly.
    pub fn parse(&mut self, window: &[u8], max_lines: usize, listener: &mut dyn RowListener) {
        let len = window.len();
        let mut i = 0usize;
        // Start of the current field segment within this window.
        let mut seg_start = 0usize;
        // End of the quoted content within this window, when the closing
        // quote has been seen. `Some(0)` with `seg_start == 0` denotes an
        // empty segment: the content is already in the carry buffer.
        let mut quoted_end: Option<usize> = match self.state {
            FieldState::AfterQuoted => Some(0),
            _ => None,
        };

        while i < len {
            if self.line_count >= max_lines {
                // Line budget exhausted; the rest of the window is left
                // unconsumed. Callers either restart or never resume.
                return;
            }
            let byte = window[i];

            match self.state {
                FieldState::BeforeField => {
                    if byte == b'"' {
                        self.state = FieldState::Quoted;
                        i += 1;
                        seg_start = i;
                    } else if byte == self.delimiter {
                        self.emit_field(listener, &window[i..i]);
                        i += 1;
                    } else if byte == b'\n' {
                        if self.col_index == 0 {
                            // Blank line: no row.
                            i += 1;
                        } else {
                            self.emit_field(listener, &window[i..i]);
                            self.end_line(listener);
                            i += 1;
                        }
                    } else if byte == b'\r' {
                        if i + 1 < len && window[i + 1] == b'\n' {
                            if self.col_index == 0 {
                                i += 2;
                            } else {
                                self.emit_field(listener, &window[i..i]);
                                self.end_line(listener);
                                i += 2;
                            }
                        } else {
                            // Bare CR outside quotes is ignored.
                            i += 1;
                        }
                    } else {
                        self.state = FieldState::Unquoted;
                        seg_start = i;
                        i += 1;
                    }
                }

                FieldState::Unquoted => {
                    if byte == self.delimiter {
                        self.emit_field(listener, &window[seg_start..i]);
                        self.state = FieldState::BeforeField;
                        i += 1;
                    } else if byte == b'\n' {
                        self.emit_field(listener, &window[seg_start..i]);
                        self.end_line(listener);
                        i += 1;
                    } else if byte == b'\r' {
                        if i + 1 < len && window[i + 1] == b'\n' {
                            self.emit_field(listener, &window[seg_start..i]);
                            self.end_line(listener);
                            i += 2;
                        } else {
                            // Drop the CR; the field may continue after it
                            // (or a LF may open the next window).
                            self.carry.extend_from_slice(&window[seg_start..i]);
                            i += 1;
                            seg_start = i;
                        }
                    } else {
                        i += 1;
                    }
                }

                FieldState::Quoted => {
                    if byte == b'"' {
                        if i + 1 < len {
                            if window[i + 1] == b'"' {
                                // Escaped quote: keep one literal `"`.
                                self.carry.extend_from_slice(&window[seg_start..=i]);
                                i += 2;
                                seg_start = i;
                            } else {
                                self.state = FieldState::AfterQuoted;
                                quoted_end = Some(i);
                                i += 1;
                            }
                        } else {
                            // Quote at the window boundary: escape or close
                            // is decided by the first byte of the next
                            // window (or by parse_last).
                            self.carry.extend_from_slice(&window[seg_start..i]);
                            self.state = FieldState::QuoteQuote;
                            i += 1;
                            seg_start = i;
                        }
                    } else {
                        i += 1;
                    }
                }

                FieldState::QuoteQuote => {
                    if byte == b'"' {
                        self.carry.push(b'"');
                        self.state = FieldState::Quoted;
                        i += 1;
                        seg_start = i;
                    } else {
                        // The boundary quote closed the region; reprocess
                        // this byte as the post-quote terminator.
                        self.state = FieldState::AfterQuoted;
                        seg_start = i;
                        quoted_end = Some(i);
                    }
                }

                FieldState::AfterQuoted => {
                    let end = quoted_end.unwrap_or(seg_start);
                    if byte == self.delimiter {
                        self.emit_field(listener, &window[seg_start..end]);
                        self.state = FieldState::BeforeField;
                        quoted_end = None;
                        i += 1;
                    } else if byte == b'\n' {
                        self.emit_field(listener, &window[seg_start..end]);
                        self.end_line(listener);
                        quoted_end = None;
                        i += 1;
                    } else if byte == b'\r' && i + 1 < len && window[i + 1] == b'\n' {
                        self.emit_field(listener, &window[seg_start..end]);
                        self.end_line(listener);
                        quoted_end = None;
                        i += 2;
                    } else {
                        // Stray bytes between the closing quote and the
                        // terminator are ignored.
                        i += 1;
                    }
                }
            }
        }

        // Window exhausted mid-field: move the open segment into the carry
        // buffer so the borrow of `window` can end.
        match self.state {
            FieldState::Unquoted | FieldState::Quoted => {
                self.carry.extend_from_slice(&window[seg_start..]);
            }
            FieldState::AfterQuoted => {
                if let Some(end) = quoted_end {
                    self.carry.extend_from_slice(&window[seg_start..end]);
                }
            }
            FieldState::BeforeField | FieldState::QuoteQuote => {}
        }
    }

    /// Flush any buffered trailing field and line as if a terminator had
    /// arrived. An open `"` region is reported as a warning and closed.
    pub fn parse_last(&mut self, listener: &mut dyn RowListener) {
        match self.state {
            FieldState::BeforeField => {
                if self.col_index > 0 {
                    self.emit_field(listener, &[]);
                    self.end_line(listener);
                }
            }
            FieldState::Unquoted | FieldState::AfterQuoted => {
                self.emit_field(listener, &[]);
                self.end_line(listener);
            }
            FieldState::QuoteQuote => {
                // The trailing quote was the closing one.
                self.emit_field(listener, &[]);
                self.end_line(listener);
            }
            FieldState::Quoted => {
                listener.on_warning(self.line_index, ParseWarning::UnterminatedQuote);
                self.emit_field(listener, &[]);
                self.end_line(listener);
            }
        }
        self.state = FieldState::BeforeField;
    }

    /// Deliver one completed field: carry buffer plus the final window
    /// segment. Routed into the pending header line when header mode is on.
    fn emit_field(&mut self, listener: &mut dyn RowListener, segment: &[u8]) {
        let header_pending = self.header_enabled && !self.header_done;
        if self.carry.is_empty() {
            if header_pending {
                self.header_fields.push(segment.to_vec());
            } else {
                listener.on_field(self.line_index, self.col_index, segment);
            }
        } else {
            self.carry.extend_from_slice(segment);
            if header_pending {
                self.header_fields.push(self.carry.clone());
            } else {
                listener.on_field(self.line_index, self.col_index, &self.carry);
            }
            self.carry.clear();
        }
        self.col_index += 1;
    }

    fn end_line(&mut self, listener: &mut dyn RowListener) {
        if self.header_enabled && !self.header_done {
            self.header_done = true;
            listener.on_header(&self.header_fields);
            self.header_fields.clear();
        } else {
            listener.on_line_end(self.line_index);
        }
        self.line_index += 1;
        self.col_index = 0;
        self.line_count += 1;
        self.state = FieldState::BeforeField;
    }
}
