//! The lossless concrete syntax tree
//!
//! Cards parse into trees whose leaves own every byte of the original
//! text. A [`value::ValueNode`] keeps its token, the sign and number
//! conventions read out of it, and the padding that followed it;
//! comments and line breaks live in [`trivia`] fragments; a shortcut
//! run keeps its collapsed spelling next to its expansion. Formatting
//! concatenates the leaves, which makes the round trip exact:
//!
//! - a tree nobody edited reproduces its card byte for byte;
//! - an edited tree re-renders only the nodes whose values changed,
//!   in the conventions captured from their original tokens.
//!
//! [`parser`] builds the trees, [`nodes`] and [`geometry`] describe
//! their shapes, and [`lexer`] cuts cards into trivia-preserving
//! tokens.

pub mod geometry;
pub mod lexer;
pub mod nodes;
pub mod parser;
pub mod shortcut;
pub mod trivia;
pub mod value;

pub use geometry::{GeometryGroup, GeometryOperation, GeometryOperator, GeometryTree};
pub use lexer::{CstSpan, CstToken, TokenKind, lex_card};
pub use nodes::{
    ClassifierNode, CstNode, ListItem, ListNode, ParameterEntry, ParametersNode, ParticleNode,
    SyntaxNode,
};
pub use parser::{parse_cell, parse_data, parse_surface};
pub use shortcut::{ShortcutKind, ShortcutNode};
pub use trivia::{CommentNode, CommentStyle, PaddingFragment, PaddingNode};
pub use value::{DeckEnum, Value, ValueNode, ValueType};
