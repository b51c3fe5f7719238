/// Delimiter convention of a delimited-text file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Csv,
    Tab,
    Pipe,
}

impl Dialect {
    pub fn delimiter(self) -> u8 {
        match self {
            Dialect::Csv => b',',
            Dialect::Tab => b'\t',
            Dialect::Pipe => b'|',
        }
    }
}

/// Outcome of inspecting an initial byte window.
///
/// `dialect` is `None` when no candidate delimiter fits ("UNKNOWN").
#[derive(Debug, Clone, Copy)]
pub struct FormatDetection {
    pub dialect: Option<Dialect>,
    pub std_dev: f64,
}

impl FormatDetection {
    pub fn is_valid(&self) -> bool {
        self.dialect.is_some() && self.std_dev < 0.5
    }
}

// Candidates in tie-break order.
const CANDIDATES: [Dialect; 3] = [Dialect::Csv, Dialect::Tab, Dialect::Pipe];

/// Inspect `window` as the initial prefix of a text file and pick the
/// best-guess dialect.
///
/// For each candidate delimiter the window is split into newline-terminated
/// lines (a trailing partial line is ignored) and the delimiter occurrences
/// per line are counted, skipping regions inside balanced `"` pairs. The
/// candidate with the lowest standard deviation among those averaging at
/// least one delimiter per line wins; ties go to the earlier candidate in
/// CSV, TAB, PIPE order. Stateless: every call starts from scratch.
pub fn detect(window: &[u8]) -> FormatDetection {
    let mut best: Option<(Dialect, f64)> = None;

    for candidate in CANDIDATES {
        let Some((mean, std_dev)) = delimiter_stats(window, candidate.delimiter()) else {
            continue;
        };
        if mean < 1.0 {
            continue;
        }
        match best {
            Some((_, best_dev)) if std_dev >= best_dev => {}
            _ => best = Some((candidate, std_dev)),
        }
    }

    match best {
        Some((dialect, std_dev)) => FormatDetection {
            dialect: Some(dialect),
            std_dev,
        },
        None => FormatDetection {
            dialect: None,
            std_dev: f64::INFINITY,
        },
    }
}

/// Per-line occurrence statistics for one delimiter, or `None` when the
/// window holds fewer than two complete lines.
fn delimiter_stats(window: &[u8], delimiter: u8) -> Option<(f64, f64)> {
    let mut counts: Vec<u32> = Vec::new();
    let mut current = 0u32;
    let mut in_quotes = false;

    for &byte in window {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if in_quotes {
            continue;
        } else if byte == b'\n' {
            counts.push(current);
            current = 0;
        } else if byte == delimiter {
            current += 1;
        }
    }

    if counts.len() < 2 {
        return None;
    }

    let n = counts.len() as f64;
    let mean = counts.iter().map(|&c| c as f64).sum::<f64>() / n;
    let variance = counts
        .iter()
        .map(|&c| {
            let d = c as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;

    Some((mean, variance.sqrt()))
}
