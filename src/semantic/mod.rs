//! Semantic views over parsed cards
//!
//! The tree keeps the text; these types keep the meaning. A cell's
//! geometry reads as a [`HalfSpace`] algebra whose dividers resolve to
//! the [`object`] collections they name, surface mnemonics and lattice
//! shapes bind to closed enums, and data-card names are checked
//! against their family's [`DataNameRule`]. Semantic edits flow back
//! into the trees through the objects' `format` methods, touching only
//! the text that no longer matches.

pub mod data;
pub mod half_space;
pub mod object;
pub mod particle;
pub mod types;

pub use data::{DataCard, DataNameRule, ParticleRule};
pub use half_space::{HalfSpace, HalfSpaceOperation, ResolvedDivider, UnitHalfSpace};
pub use object::{Cell, Cells, Numbered, NumberedCollection, Surface, Surfaces};
pub use particle::Particle;
pub use types::{Lattice, SurfaceType};
