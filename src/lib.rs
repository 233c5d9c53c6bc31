//! Kerma
//!
//! A lossless syntax-tree engine for MCNP-style Monte Carlo input
//! decks. Cards parse into trees that keep every byte of the original
//! text (blanks, comments, shortcut spellings, number formats), so an
//! edit re-renders only the values it touched and everything else
//! replays exactly as written.

pub mod cst;
pub mod error;
pub mod input;
pub mod result;
pub mod semantic;
pub mod version;

// Re-export commonly used types
pub use cst::{
    ClassifierNode, CstNode, GeometryOperator, GeometryTree, ListNode, ParametersNode,
    ParticleNode, ShortcutKind, ShortcutNode, SyntaxNode, Value, ValueNode, ValueType, parse_cell,
    parse_data, parse_surface,
};
pub use error::{ErrorKind, KermaError};
pub use input::{BlockType, Input, Jump};
pub use result::Result;
pub use semantic::{
    Cell, Cells, DataCard, DataNameRule, HalfSpace, Lattice, NumberedCollection, Particle,
    ParticleRule, Surface, SurfaceType, Surfaces, UnitHalfSpace,
};
pub use version::{CONTINUATION_INDENT, McnpVersion};

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kerma=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
