//! MCNP target-version model and line wrapping for card emission.
//!
//! Line width depends on the MCNP release being targeted: 80 columns
//! through 6.1, 128 columns from 6.2 on. Continuation lines are marked
//! by five leading blanks, never by `&`.

use std::fmt;

use crate::error::KermaError;
use crate::result::Result;

/// Number of leading spaces that mark a continuation line.
pub const CONTINUATION_INDENT: usize = 5;

/// An MCNP release, ordered so feature gates can compare against cutoffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct McnpVersion {
    pub major: u16,
    pub minor: u16,
    pub revision: u16,
}

impl McnpVersion {
    pub const fn new(major: u16, minor: u16, revision: u16) -> Self {
        Self {
            major,
            minor,
            revision,
        }
    }

    /// Maximum line width for this release.
    ///
    /// Anything at or past 6.2.0 gets the wide format; the two classic
    /// releases keep 80 columns. Other old releases are rejected rather
    /// than guessed at.
    pub fn max_line_length(self) -> Result<usize> {
        if self >= McnpVersion::new(6, 2, 0) {
            return Ok(128);
        }
        match (self.major, self.minor, self.revision) {
            (5, 1, 60) | (6, 1, 0) => Ok(80),
            _ => Err(KermaError::unsupported(format!("MCNP version {self}"))),
        }
    }

    /// Wrap whitespace-separated words into deck lines.
    ///
    /// The first line is flush left when `is_first_line` is set, indented
    /// as a continuation otherwise; every following line carries the
    /// continuation indent. A single word longer than the line width is
    /// emitted on its own overlong line instead of being split.
    pub fn wrap_string(self, text: &str, is_first_line: bool) -> Result<Vec<String>> {
        let width = self.max_line_length()?;
        let first_indent = if is_first_line { 0 } else { CONTINUATION_INDENT };

        let mut lines = Vec::new();
        let mut line = String::new();
        let mut indent = first_indent;
        for word in text.split_whitespace() {
            if line.is_empty() {
                line = format!("{:indent$}{word}", "");
            } else if line.len() + 1 + word.len() <= width {
                line.push(' ');
                line.push_str(word);
            } else {
                lines.push(std::mem::take(&mut line));
                indent = CONTINUATION_INDENT;
                line = format!("{:indent$}{word}", "");
            }
        }
        if !line.is_empty() {
            lines.push(line);
        }
        Ok(lines)
    }

    /// Wrap a word list into deck lines, one space between words.
    pub fn wrap_words(self, words: &[String], is_first_line: bool) -> Result<Vec<String>> {
        self.wrap_string(&words.join(" "), is_first_line)
    }
}

impl Default for McnpVersion {
    fn default() -> Self {
        McnpVersion::new(6, 2, 0)
    }
}

impl fmt::Display for McnpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn line_length_by_release() {
        assert_eq!(McnpVersion::new(5, 1, 60).max_line_length().unwrap(), 80);
        assert_eq!(McnpVersion::new(6, 1, 0).max_line_length().unwrap(), 80);
        assert_eq!(McnpVersion::new(6, 2, 0).max_line_length().unwrap(), 128);
        assert_eq!(McnpVersion::new(7, 4, 0).max_line_length().unwrap(), 128);
    }

    #[test]
    fn unknown_old_release_is_unsupported() {
        let err = McnpVersion::new(5, 1, 38).max_line_length().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
    }

    #[test]
    fn wraps_at_width_with_continuation_indent() {
        let version = McnpVersion::new(6, 1, 0);
        let words: Vec<String> = (0..30).map(|i| format!("{:.1}", i as f64)).collect();
        let lines = version.wrap_words(&words, true).unwrap();
        assert!(lines.len() > 1);
        assert!(!lines[0].starts_with(' '));
        for line in &lines {
            assert!(line.len() <= 80);
        }
        for line in &lines[1..] {
            assert!(line.starts_with("     "));
            assert!(!line[CONTINUATION_INDENT..].starts_with(' '));
        }
    }

    #[test]
    fn continuation_start_is_indented() {
        let version = McnpVersion::default();
        let lines = version.wrap_string("imp:n 1 1 0", false).unwrap();
        assert_eq!(lines, vec!["     imp:n 1 1 0".to_string()]);
    }

    #[test]
    fn version_ordering_and_display() {
        assert!(McnpVersion::new(6, 2, 0) > McnpVersion::new(6, 1, 0));
        assert!(McnpVersion::new(6, 2, 3) >= McnpVersion::new(6, 2, 0));
        assert_eq!(McnpVersion::new(6, 2, 0).to_string(), "6.2.0");
    }
}
