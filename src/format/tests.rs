//! Format Detector Tests
//!
//! Covers dialect selection, the stddev validity gate, quoted-region
//! skipping and the UNKNOWN failure modes.

#[cfg(test)]
mod tests {
    use crate::format::{Dialect, detect};

    #[test]
    fn test_detects_csv() {
        let result = detect(b"name,age,active\nalice,30,true\nbob,25,false\n");
        assert_eq!(result.dialect, Some(Dialect::Csv));
        assert!(result.is_valid());
        assert_eq!(result.std_dev, 0.0);
    }

    #[test]
    fn test_detects_tab() {
        let result = detect(b"1\t2.5\t2020-01-01\n3\t4.5\t2020-01-02\n");
        assert_eq!(result.dialect, Some(Dialect::Tab));
        assert!(result.is_valid());
    }

    #[test]
    fn test_detects_pipe() {
        let result = detect(b"a|b|c\nd|e|f\ng|h|i\n");
        assert_eq!(result.dialect, Some(Dialect::Pipe));
        assert!(result.is_valid());
    }

    #[test]
    fn test_single_line_is_unknown() {
        // Only one newline-terminated line: not enough to measure spread.
        let result = detect(b"a,b,c\n");
        assert_eq!(result.dialect, None);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_no_delimiters_is_unknown() {
        let result = detect(b"alpha\nbeta\ngamma\n");
        assert_eq!(result.dialect, None);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_trailing_partial_line_ignored() {
        // The partial third line has a wildly different comma count but
        // must not influence the statistics.
        let result = detect(b"a,b\nc,d\ne,,,,,,,,");
        assert_eq!(result.dialect, Some(Dialect::Csv));
        assert_eq!(result.std_dev, 0.0);
    }

    #[test]
    fn test_quoted_delimiters_not_counted() {
        // Without quote skipping the first line would count 3 commas and
        // the deviation would exceed the validity threshold.
        let result = detect(b"\"x,y,z\",1\n\"a\",2\n\"b\",3\n");
        assert_eq!(result.dialect, Some(Dialect::Csv));
        assert!(result.is_valid());
        assert_eq!(result.std_dev, 0.0);
    }

    #[test]
    fn test_uneven_counts_fail_validity() {
        // Commas on every line (mean >= 1) but with a large spread.
        let result = detect(b"a,b\nc,d,e,f,g,h\ni,j\nk,l,m,n,o,p\n");
        assert_eq!(result.dialect, Some(Dialect::Csv));
        assert!(result.std_dev >= 0.5);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_tie_breaks_in_candidate_order() {
        // One comma and one pipe per line: identical statistics, CSV wins.
        let result = detect(b"a,b|c\nd,e|f\n");
        assert_eq!(result.dialect, Some(Dialect::Csv));
    }

    #[test]
    fn test_binary_noise_is_invalid() {
        // Deterministic pseudo-random bytes, no delimited structure. Bytes
        // that would read as line terminators are remapped so the window
        // never contains two complete lines.
        let mut window = Vec::new();
        let mut seed = 0x2545f491u32;
        for _ in 0..4096 {
            seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
            let byte = (seed >> 24) as u8;
            window.push(if byte == b'\n' { 0xff } else { byte });
        }
        assert_eq!(detect(&window).dialect, None);
    }
}
