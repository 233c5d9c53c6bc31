//! Result type alias for deck parsing and editing

use crate::error::KermaError;

/// Standard Result type for deck parsing and editing operations
pub type Result<T> = std::result::Result<T, KermaError>;
