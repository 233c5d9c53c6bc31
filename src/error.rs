//! Error types and handling for deck parsing and editing

use thiserror::Error;

/// Main error type for deck parsing and editing operations
#[derive(Debug, Error)]
pub enum KermaError {
    /// Card text that does not follow the grammar it claims to follow
    #[error("Malformed input in {card}: {message}")]
    MalformedInput { card: String, message: String },

    /// A value or operand of the wrong type for the requested operation
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    /// An object reference that does not resolve against the problem
    #[error("{role} {missing} is missing from the problem, but is needed by {parent_kind} {parent_number}")]
    BrokenLink {
        parent_kind: String,
        parent_number: i64,
        role: String,
        missing: i64,
    },

    /// Deck constructs that are recognized but outside what this crate handles
    #[error("Unsupported feature: {feature}")]
    UnsupportedFeature { feature: String },

    /// Lookup of a named entry that is not present
    #[error("No entry named '{name}'")]
    KeyNotFound { name: String },

    /// Positional lookup past the end of a list
    #[error("Index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: isize, len: usize },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedInput,
    TypeMismatch,
    BrokenLink,
    UnsupportedFeature,
    Lookup,
}

impl KermaError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            KermaError::MalformedInput { .. } => ErrorKind::MalformedInput,
            KermaError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            KermaError::BrokenLink { .. } => ErrorKind::BrokenLink,
            KermaError::UnsupportedFeature { .. } => ErrorKind::UnsupportedFeature,
            KermaError::KeyNotFound { .. } => ErrorKind::Lookup,
            KermaError::IndexOutOfRange { .. } => ErrorKind::Lookup,
        }
    }

    /// Create a malformed-input error for a named card or grammar context
    pub fn malformed(card: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            card: card.into(),
            message: message.into(),
        }
    }

    /// Create a type-mismatch error
    pub fn type_mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Create a broken-link error for an unresolvable object reference
    pub fn broken_link(
        parent_kind: impl Into<String>,
        parent_number: i64,
        role: impl Into<String>,
        missing: i64,
    ) -> Self {
        Self::BrokenLink {
            parent_kind: parent_kind.into(),
            parent_number,
            role: role.into(),
            missing,
        }
    }

    /// Create an unsupported-feature error
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::UnsupportedFeature {
            feature: feature.into(),
        }
    }

    /// Create a key-not-found error
    pub fn key_not_found(name: impl Into<String>) -> Self {
        Self::KeyNotFound { name: name.into() }
    }

    /// Create an index-out-of-range error
    pub fn index_out_of_range(index: isize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }
}
