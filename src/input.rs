//! The input boundary: one logical card, already split out of a deck
//!
//! A deck reader hands this crate pre-classified logical cards: the
//! lines of one card (continuations and interleaved comments included)
//! plus which block of the deck they came from. Everything downstream,
//! from lexing to re-emission, starts here.

use std::fmt;

use crate::cst::lexer::{CstToken, lex_card};

/// Which block of the deck an input came from.
///
/// MCNP decks are positional: first cells, then surfaces, then data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Cell,
    Surface,
    Data,
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockType::Cell => write!(f, "cell"),
            BlockType::Surface => write!(f, "surface"),
            BlockType::Data => write!(f, "data"),
        }
    }
}

/// One logical card: its raw lines and the block it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    input_lines: Vec<String>,
    block_type: BlockType,
}

impl Input {
    pub fn new(input_lines: Vec<String>, block_type: BlockType) -> Self {
        Self {
            input_lines,
            block_type,
        }
    }

    /// The raw lines as read, without line terminators.
    pub fn input_lines(&self) -> &[String] {
        &self.input_lines
    }

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    /// The card text the lines describe, lines joined by `\n`.
    pub fn text(&self) -> String {
        self.input_lines.join("\n")
    }

    /// Lex the card into a trivia-preserving token stream.
    pub fn tokenize(&self) -> Vec<CstToken> {
        lex_card(&self.text())
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INPUT: {} block, {} lines", self.block_type, self.input_lines.len())
    }
}

/// The jump placeholder, a value deliberately left for MCNP to default.
///
/// Distinct from a value that is merely absent: a jump occupies a slot
/// and prints as `J`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Jump;

impl fmt::Display for Jump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "J")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::lexer::TokenKind;

    #[test]
    fn tokenize_joins_continuation_lines() {
        let input = Input::new(
            vec!["1 0 -1".to_string(), "     5".to_string()],
            BlockType::Cell,
        );
        let tokens = input.tokenize();
        let text: String = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(text, "1 0 -1\n     5");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Newline));
    }

    #[test]
    fn jump_prints_as_j() {
        assert_eq!(Jump.to_string(), "J");
        assert_eq!(Jump, Jump);
    }
}
