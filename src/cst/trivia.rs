//! Padding and comment nodes, the trivia layer of the tree
//!
//! Between any two meaningful tokens sits a [`PaddingNode`] holding the
//! exact blanks, line breaks and comments that appeared there, in order.
//! Formatting a padding node replays those fragments verbatim, which is
//! what makes the tree lossless.

use crate::error::KermaError;
use crate::result::Result;

/// Which comment grammar a comment uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `$` comment running to the end of its line
    Dollar,
    /// `c` full-line comment
    CLine,
}

/// One comment construct: a `$` tail or a block of consecutive `c` lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentNode {
    style: CommentStyle,
    lines: Vec<String>,
}

impl CommentNode {
    /// Build a comment from its raw text, detecting the style.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let style = detect_style(&text)?;
        Ok(Self {
            style,
            lines: vec![text],
        })
    }

    pub fn is_dollar(&self) -> bool {
        self.style == CommentStyle::Dollar
    }

    pub fn style(&self) -> CommentStyle {
        self.style
    }

    /// Add another line to a `c`-style block.
    ///
    /// The line must carry the same style as the block; a `$` comment is
    /// a single tail and cannot be extended with `c` lines or vice versa.
    pub fn append(&mut self, line: impl Into<String>) -> Result<()> {
        let line = line.into();
        let style = detect_style(&line)?;
        if style != self.style {
            return Err(KermaError::type_mismatch(
                match self.style {
                    CommentStyle::Dollar => "$-style comment line",
                    CommentStyle::CLine => "c-style comment line",
                },
                line,
            ));
        }
        self.lines.push(line);
        Ok(())
    }

    /// The comment text with markers stripped, lines joined by `\n`.
    pub fn contents(&self) -> String {
        self.lines
            .iter()
            .map(|line| line_contents(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Reproduce the comment text exactly as it appeared.
    pub fn format(&self) -> String {
        self.lines.join("\n")
    }
}

fn detect_style(text: &str) -> Result<CommentStyle> {
    let trimmed = text.trim_start_matches([' ', '\t']);
    let mut chars = trimmed.chars();
    match chars.next() {
        Some('$') => Ok(CommentStyle::Dollar),
        Some('c') | Some('C') => match chars.next() {
            None | Some(' ') | Some('\t') => Ok(CommentStyle::CLine),
            _ => Err(KermaError::malformed(
                "comment",
                format!("not a comment: {text:?}"),
            )),
        },
        _ => Err(KermaError::malformed(
            "comment",
            format!("not a comment: {text:?}"),
        )),
    }
}

fn line_contents(line: &str) -> &str {
    let trimmed = line.trim_start_matches([' ', '\t']);
    let rest = &trimmed[1..];
    rest.strip_prefix(' ').unwrap_or(rest)
}

/// A single fragment of padding
#[derive(Debug, Clone, PartialEq)]
pub enum PaddingFragment {
    /// Blanks, or operator glyphs inside a geometry operator slot
    Text(String),
    /// A line break kept verbatim (`\n` or `\r\n`)
    Newline(String),
    Comment(CommentNode),
}

impl PaddingFragment {
    /// True for a fragment of pure blanks: no line break, no comment,
    /// no operator glyph.
    pub fn is_space(&self) -> bool {
        matches!(self, PaddingFragment::Text(text) if text.trim().is_empty())
    }

    /// The exact text this fragment reproduces.
    pub fn format(&self) -> String {
        match self {
            PaddingFragment::Text(text) | PaddingFragment::Newline(text) => text.clone(),
            PaddingFragment::Comment(comment) => comment.format(),
        }
    }

    fn format_into(&self, out: &mut String) {
        match self {
            PaddingFragment::Text(text) | PaddingFragment::Newline(text) => out.push_str(text),
            PaddingFragment::Comment(comment) => out.push_str(&comment.format()),
        }
    }
}

/// Ordered inter-token trivia: blanks, line breaks and comments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaddingNode {
    fragments: Vec<PaddingFragment>,
}

impl PaddingNode {
    /// Build padding from blank-and-newline text, split so each line
    /// break is its own fragment.
    pub fn new(text: &str) -> Self {
        let mut node = Self::default();
        node.append_text(text);
        node
    }

    /// Padding holding a single comment.
    pub fn comment(text: &str) -> Result<Self> {
        Ok(Self {
            fragments: vec![PaddingFragment::Comment(CommentNode::new(text)?)],
        })
    }

    pub fn from_fragments(fragments: Vec<PaddingFragment>) -> Self {
        Self { fragments }
    }

    /// Append raw text, splitting on line breaks the way [`Self::new`] does.
    pub fn append_text(&mut self, text: &str) {
        let mut rest = text;
        while !rest.is_empty() {
            if let Some(pos) = rest.find(['\n', '\r']) {
                if pos > 0 {
                    self.fragments
                        .push(PaddingFragment::Text(rest[..pos].to_string()));
                }
                let newline_len = if rest[pos..].starts_with("\r\n") { 2 } else { 1 };
                self.fragments.push(PaddingFragment::Newline(
                    rest[pos..pos + newline_len].to_string(),
                ));
                rest = &rest[pos + newline_len..];
            } else {
                self.fragments.push(PaddingFragment::Text(rest.to_string()));
                rest = "";
            }
        }
    }

    pub fn append_comment(&mut self, comment: CommentNode) {
        self.fragments.push(PaddingFragment::Comment(comment));
    }

    pub fn push_fragment(&mut self, fragment: PaddingFragment) {
        self.fragments.push(fragment);
    }

    pub fn fragments(&self) -> &[PaddingFragment] {
        &self.fragments
    }

    pub(crate) fn fragments_mut(&mut self) -> &mut Vec<PaddingFragment> {
        &mut self.fragments
    }

    pub(crate) fn into_fragments(self) -> Vec<PaddingFragment> {
        self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Whether fragment `i` is pure blanks.
    pub fn is_space(&self, i: usize) -> Result<bool> {
        self.fragments
            .get(i)
            .map(PaddingFragment::is_space)
            .ok_or_else(|| KermaError::index_out_of_range(i as isize, self.fragments.len()))
    }

    pub fn has_space(&self) -> bool {
        self.fragments.iter().any(PaddingFragment::is_space)
    }

    /// Reproduce the padding text exactly as it appeared.
    pub fn format(&self) -> String {
        let mut out = String::new();
        for fragment in &self.fragments {
            fragment.format_into(&mut out);
        }
        out
    }

    /// All comments in this padding, in order.
    pub fn comments(&self) -> Vec<&CommentNode> {
        self.fragments
            .iter()
            .filter_map(|f| match f {
                PaddingFragment::Comment(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    /// Comments sitting at the tail of the padding, separated from the
    /// data only by line breaks. These belong to whatever follows the
    /// node and can be re-homed there.
    pub fn get_trailing_comment(&self) -> Option<Vec<&CommentNode>> {
        let start = self.trailing_comment_start()?;
        Some(
            self.fragments[start..]
                .iter()
                .filter_map(|f| match f {
                    PaddingFragment::Comment(c) => Some(c),
                    _ => None,
                })
                .collect(),
        )
    }

    /// Drop the trailing comment run found by [`Self::get_trailing_comment`].
    pub fn delete_trailing_comment(&mut self) {
        if let Some(start) = self.trailing_comment_start() {
            self.fragments.truncate(start);
        }
    }

    /// Splice comment fragments from a preceding card in front of this
    /// padding, keeping a line break between them and what was here.
    pub fn grab_beginning_comment(&mut self, mut fragments: Vec<PaddingFragment>) {
        if fragments.is_empty() {
            return;
        }
        fragments.push(PaddingFragment::Newline("\n".to_string()));
        fragments.append(&mut self.fragments);
        self.fragments = fragments;
    }

    fn trailing_comment_start(&self) -> Option<usize> {
        let mut start = None;
        for (i, fragment) in self.fragments.iter().enumerate().rev() {
            match fragment {
                PaddingFragment::Comment(_) => start = Some(i),
                PaddingFragment::Newline(_) => continue,
                PaddingFragment::Text(_) => break,
            }
        }
        start
    }
}

impl PartialEq<str> for PaddingNode {
    fn eq(&self, other: &str) -> bool {
        self.format() == other
    }
}

impl PartialEq<&str> for PaddingNode {
    fn eq(&self, other: &&str) -> bool {
        self.format() == *other
    }
}
