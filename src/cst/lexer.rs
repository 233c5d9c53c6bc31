//! Card-level lexer that preserves all trivia (blanks, comments)
//!
//! Every byte of the card lands in exactly one token, so concatenating
//! token texts reproduces the card unchanged. That is the property the
//! whole tree is built on.

use std::ops::Range;

/// Simple span representing a range in the card text
pub type CstSpan = Range<usize>;

/// Token kinds for MCNP card text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A run of non-blank, non-structural characters: numbers,
    /// mnemonics, shortcut forms, keywords
    Word,
    /// Horizontal blanks (spaces and tabs)
    Whitespace,
    /// Line break (`\n`, `\r\n`, or a stray `\r`)
    Newline,
    /// `$` comment running to end of line
    DollarComment,
    /// Full-line `c` comment: a `c` in the first five columns followed
    /// by a blank or the end of the line
    LineComment,
    /// `(` opening a geometry group
    LeftParen,
    /// `)` closing a geometry group
    RightParen,
    /// Bare `:`, the union operator
    Colon,
    /// `#`, the complement operator (also the vertical-format marker)
    Pound,
    /// `:` glued to particle letters, e.g. `:n,p` in `imp:n,p`
    Designator,
    /// `=` between a parameter key and its value
    Equals,
    Eof,
}

impl TokenKind {
    /// Blanks and comments: preserved for round-tripping, invisible to
    /// the grammar.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::Newline
                | TokenKind::DollarComment
                | TokenKind::LineComment
        )
    }
}

/// A token with its kind and span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CstToken {
    pub kind: TokenKind,
    pub text: String,
    pub span: CstSpan,
}

impl CstToken {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: CstSpan) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}

/// Lex one logical card, preserving every byte.
///
/// The lexer is total: any input produces a token stream whose texts
/// concatenate back to the input. Block-specific meaning (union versus
/// particle designator, complement versus vertical format) is decided
/// here only where the character itself is unambiguous; everything else
/// is the parser's job.
pub fn lex_card(input: &str) -> Vec<CstToken> {
    let mut tokens = Vec::new();
    let len = input.len();
    let mut i = 0usize;
    let mut line_start = true;

    while i < len {
        let Some((current, size)) = next_char(input, i) else {
            break;
        };
        let start = i;

        // A comment line owns everything from the `c` to the line end.
        // Blanks in front of it (at most four, or the `c` would sit past
        // column five) stay ordinary whitespace tokens.
        if line_start && let Some(blanks) = comment_line_blanks(&input[i..]) {
            if blanks > 0 {
                let end = i + blanks;
                tokens.push(CstToken::new(
                    TokenKind::Whitespace,
                    &input[i..end],
                    span(i, end),
                ));
                i = end;
            }
            let end = line_end(input, i);
            tokens.push(CstToken::new(
                TokenKind::LineComment,
                &input[i..end],
                span(i, end),
            ));
            i = end;
            line_start = false;
            continue;
        }

        match current {
            '\n' => {
                tokens.push(CstToken::new(TokenKind::Newline, "\n", span(start, i + size)));
                i += size;
                line_start = true;
            }
            '\r' => {
                let mut end = i + size;
                if let Some(('\n', nl_size)) = next_char(input, end) {
                    end += nl_size;
                }
                tokens.push(CstToken::new(
                    TokenKind::Newline,
                    &input[start..end],
                    span(start, end),
                ));
                i = end;
                line_start = true;
            }
            ' ' | '\t' => {
                let mut end = i + size;
                while end < len {
                    match next_char(input, end) {
                        Some((' ' | '\t', step)) => end += step,
                        _ => break,
                    }
                }
                tokens.push(CstToken::new(
                    TokenKind::Whitespace,
                    &input[start..end],
                    span(start, end),
                ));
                i = end;
                line_start = false;
            }
            '$' => {
                let end = line_end(input, i);
                tokens.push(CstToken::new(
                    TokenKind::DollarComment,
                    &input[start..end],
                    span(start, end),
                ));
                i = end;
                line_start = false;
            }
            '(' => {
                tokens.push(CstToken::new(TokenKind::LeftParen, "(", span(start, i + size)));
                i += size;
                line_start = false;
            }
            ')' => {
                tokens.push(CstToken::new(
                    TokenKind::RightParen,
                    ")",
                    span(start, i + size),
                ));
                i += size;
                line_start = false;
            }
            '#' => {
                tokens.push(CstToken::new(TokenKind::Pound, "#", span(start, i + size)));
                i += size;
                line_start = false;
            }
            '=' => {
                tokens.push(CstToken::new(TokenKind::Equals, "=", span(start, i + size)));
                i += size;
                line_start = false;
            }
            ':' => {
                // `:n,p` glued to a word is a particle designator; a bare
                // colon is the union operator. Surface numbers never start
                // with a letter, so the lookahead is unambiguous.
                let mut end = i + size;
                while end < len {
                    match next_char(input, end) {
                        Some((c, step)) if c.is_ascii_alphabetic() || c == ',' => end += step,
                        _ => break,
                    }
                }
                if end > i + size {
                    tokens.push(CstToken::new(
                        TokenKind::Designator,
                        &input[start..end],
                        span(start, end),
                    ));
                    i = end;
                } else {
                    tokens.push(CstToken::new(TokenKind::Colon, ":", span(start, i + size)));
                    i += size;
                }
                line_start = false;
            }
            _ => {
                let mut end = i + size;
                while end < len {
                    match next_char(input, end) {
                        Some((c, step)) if !is_word_break(c) => end += step,
                        _ => break,
                    }
                }
                tokens.push(CstToken::new(
                    TokenKind::Word,
                    &input[start..end],
                    span(start, end),
                ));
                i = end;
                line_start = false;
            }
        }
    }

    tokens.push(CstToken::new(TokenKind::Eof, "", span(len, len)));
    tokens
}

fn is_word_break(ch: char) -> bool {
    matches!(
        ch,
        ' ' | '\t' | '\n' | '\r' | '$' | '(' | ')' | ':' | '#' | '='
    )
}

/// Check whether the rest of the input starts a `c`-style comment line.
///
/// Returns the number of leading blanks in front of the `c` when it
/// does. The `c` must sit within the first five columns and be followed
/// by a blank or the end of the line, so mnemonics like `cz` or `c/z`
/// never match.
fn comment_line_blanks(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < 4 && i < bytes.len() && bytes[i] == b' ' {
        i += 1;
    }
    match bytes.get(i) {
        Some(b'c') | Some(b'C') => {}
        _ => return None,
    }
    match bytes.get(i + 1) {
        None | Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') => Some(i),
        _ => None,
    }
}

fn line_end(input: &str, from: usize) -> usize {
    input[from..]
        .find(['\n', '\r'])
        .map(|rel| from + rel)
        .unwrap_or(input.len())
}

/// Get next character and its UTF-8 size
fn next_char(input: &str, pos: usize) -> Option<(char, usize)> {
    input[pos..].chars().next().map(|c| (c, c.len_utf8()))
}

/// Create a span from start to end
fn span(start: usize, end: usize) -> CstSpan {
    start..end
}
