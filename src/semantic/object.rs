//! Minimal numbered-object layer over parsed cards
//!
//! [`Cell`] and [`Surface`] wrap one parsed card each and keep the
//! semantic fields other cards link against: the number, a cell's
//! geometry, a surface's mnemonic. A [`NumberedCollection`] hands out
//! shared handles, so geometry references can hold weak pointers to
//! the objects they name and read their numbers live after a renumber.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use crate::cst::nodes::{ParametersNode, SyntaxNode};
use crate::cst::parser;
use crate::cst::value::{Value, ValueNode};
use crate::error::KermaError;
use crate::result::Result;
use crate::semantic::half_space::{HalfSpace, UnitHalfSpace};
use crate::semantic::types::SurfaceType;
use crate::version::McnpVersion;

/// An object addressed by its deck number.
pub trait Numbered {
    fn number(&self) -> i64;
}

/// An insertion-ordered map from number to shared object handle.
///
/// Keys are the numbers at insertion time; renumbering an object does
/// not re-key the map. References resolved through [`Rc`] handles keep
/// reading the live number regardless.
#[derive(Debug)]
pub struct NumberedCollection<T: Numbered> {
    items: IndexMap<i64, Rc<RefCell<T>>>,
}

/// The cell namespace of a problem.
pub type Cells = NumberedCollection<Cell>;

/// The surface namespace of a problem.
pub type Surfaces = NumberedCollection<Surface>;

impl<T: Numbered> NumberedCollection<T> {
    pub fn new() -> Self {
        Self {
            items: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add an object under its current number and hand back the shared
    /// handle. A number already in use is rejected.
    pub fn add(&mut self, item: T) -> Result<Rc<RefCell<T>>> {
        let number = item.number();
        if self.items.contains_key(&number) {
            return Err(KermaError::malformed(
                "numbering",
                format!("number {number} is already in use"),
            ));
        }
        let item = Rc::new(RefCell::new(item));
        self.items.insert(number, Rc::clone(&item));
        Ok(item)
    }

    pub fn get(&self, number: i64) -> Option<Rc<RefCell<T>>> {
        self.items.get(&number).map(Rc::clone)
    }

    /// Remove by number, preserving the order of the remaining items.
    pub fn remove(&mut self, number: i64) -> Option<Rc<RefCell<T>>> {
        self.items.shift_remove(&number)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<RefCell<T>>> {
        self.items.values()
    }
}

impl<T: Numbered> Default for NumberedCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// One cell card: a numbered region of space filled by a material
#[derive(Debug, Clone)]
pub struct Cell {
    number: i64,
    geometry: HalfSpace,
    tree: SyntaxNode,
    mutated: bool,
}

impl Cell {
    /// Parse a cell card into its tree and semantic geometry.
    pub fn parse(text: &str) -> Result<Cell> {
        let mut tree = parser::parse_cell(text)?;
        let number = card_number(&tree, "cell")?;
        let geometry_tree = tree
            .get_mut("geometry")
            .and_then(|node| node.as_geometry_mut())
            .ok_or_else(|| KermaError::malformed("cell", "cell card has no geometry"))?;
        let geometry = HalfSpace::parse(geometry_tree)?;
        debug!(cell = number, "parsed cell card");
        Ok(Cell {
            number,
            geometry,
            tree,
            mutated: false,
        })
    }

    pub fn number(&self) -> i64 {
        self.number
    }

    /// Renumber the cell, writing the new number into the card text.
    ///
    /// Geometry references that resolved against this cell pick the
    /// change up on their next re-render.
    pub fn set_number(&mut self, number: i64) -> Result<()> {
        card_number_node_mut(&mut self.tree, "cell")?.set_int(number)?;
        self.number = number;
        self.mutated = true;
        Ok(())
    }

    /// The material number, or `None` for a void cell.
    pub fn material(&self) -> Option<i64> {
        let material = self.tree.get("material")?.as_syntax()?;
        let number = material.get("number")?.as_value()?.as_int().ok()?;
        if number == 0 { None } else { Some(number) }
    }

    /// The density magnitude, if the cell carries one.
    pub fn density(&self) -> Option<f64> {
        self.density_node()?.as_real().ok()
    }

    /// True for a density in atoms per barn-cm, false for grams per
    /// cubic centimeter, `None` for a void cell.
    pub fn is_atom_density(&self) -> Option<bool> {
        self.density_node()?.is_negative().map(|negative| !negative)
    }

    fn density_node(&self) -> Option<&ValueNode> {
        self.tree.get("material")?.as_syntax()?.get("density")?.as_value()
    }

    pub fn geometry(&self) -> &HalfSpace {
        &self.geometry
    }

    /// Mutable access to the geometry. The card text catches up on the
    /// next [`Cell::format`].
    pub fn geometry_mut(&mut self) -> &mut HalfSpace {
        self.mutated = true;
        &mut self.geometry
    }

    /// Replace the geometry outright.
    pub fn set_geometry(&mut self, geometry: HalfSpace) {
        self.geometry = geometry;
        self.mutated = true;
    }

    /// The region outside this cell, for use in another cell's geometry.
    pub fn complement(&self) -> HalfSpace {
        !HalfSpace::from(UnitHalfSpace::new(self.number, true, true))
    }

    /// Numbers of the surfaces the geometry references.
    pub fn surfaces(&self) -> BTreeSet<i64> {
        self.geometry.leaf_objects().1
    }

    /// Numbers of the cells the geometry complements.
    pub fn complements(&self) -> BTreeSet<i64> {
        self.geometry.leaf_objects().0
    }

    pub fn parameters(&self) -> Option<&ParametersNode> {
        self.tree.get("parameters").and_then(|node| node.as_parameters())
    }

    pub fn parameters_mut(&mut self) -> Option<&mut ParametersNode> {
        self.tree
            .get_mut("parameters")
            .and_then(|node| node.as_parameters_mut())
    }

    /// The card's backing tree, for direct inspection.
    pub fn tree(&self) -> &SyntaxNode {
        &self.tree
    }

    /// True when the object has semantic edits since it was parsed or
    /// last formatted.
    pub fn mutated(&self) -> bool {
        self.mutated
    }

    /// Resolve every divider in the geometry against the problem.
    pub fn update_pointers(&mut self, cells: &Cells, surfaces: &Surfaces) -> Result<()> {
        debug!(cell = self.number, "resolving geometry references");
        self.geometry.update_pointers(cells, surfaces, self.number)
    }

    /// Emit the card for a target release.
    ///
    /// The geometry is re-synchronized first, so renumbered references
    /// and operator edits land in the text. Lines that fit the release
    /// width are reproduced byte for byte; overlong lines are rewrapped.
    pub fn format(&mut self, version: McnpVersion) -> Result<Vec<String>> {
        let geometry_tree = self
            .tree
            .get_mut("geometry")
            .and_then(|node| node.as_geometry_mut())
            .ok_or_else(|| KermaError::malformed("cell", "cell card has no geometry"))?;
        self.geometry.update_values(geometry_tree)?;
        self.mutated = false;
        card_lines(&self.tree, version)
    }
}

impl Numbered for Cell {
    fn number(&self) -> i64 {
        self.number
    }
}

/// One surface card: a numbered quadric or macrobody
#[derive(Debug, Clone)]
pub struct Surface {
    number: i64,
    kind: SurfaceType,
    tree: SyntaxNode,
    mutated: bool,
}

impl Surface {
    /// Parse a surface card, binding its mnemonic to [`SurfaceType`].
    pub fn parse(text: &str) -> Result<Surface> {
        let mut tree = parser::parse_surface(text)?;
        let number = card_number(&tree, "surface")?;
        let node = tree
            .get_mut("type")
            .and_then(|node| node.as_value_mut())
            .ok_or_else(|| KermaError::malformed("surface", "surface card has no mnemonic"))?;
        node.convert_to_enum::<SurfaceType>(false, true)?;
        let kind = node.value_as::<SurfaceType>()?;
        debug!(surface = number, kind = kind.mnemonic(), "parsed surface card");
        Ok(Surface {
            number,
            kind,
            tree,
            mutated: false,
        })
    }

    pub fn number(&self) -> i64 {
        self.number
    }

    /// Renumber the surface, writing the new number into the card text.
    pub fn set_number(&mut self, number: i64) -> Result<()> {
        card_number_node_mut(&mut self.tree, "surface")?.set_int(number)?;
        self.number = number;
        self.mutated = true;
        Ok(())
    }

    pub fn kind(&self) -> SurfaceType {
        self.kind
    }

    /// Change the mnemonic; it re-renders in canonical upper case.
    pub fn set_kind(&mut self, kind: SurfaceType) -> Result<()> {
        let node = self
            .tree
            .get_mut("type")
            .and_then(|node| node.as_value_mut())
            .ok_or_else(|| KermaError::malformed("surface", "surface card has no mnemonic"))?;
        node.set_enum(kind)?;
        self.kind = kind;
        self.mutated = true;
        Ok(())
    }

    /// The numeric constants after the mnemonic, in card order.
    pub fn coefficients(&self) -> Vec<f64> {
        self.tree
            .get("data")
            .and_then(|node| node.as_list())
            .map(|list| {
                list.values()
                    .filter_map(|node| node.value().and_then(Value::as_real))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replace the constants, preserving spacing and any shortcut runs
    /// whose expansion still matches.
    pub fn set_coefficients(&mut self, coefficients: &[f64]) -> Result<()> {
        let list = self
            .tree
            .get_mut("data")
            .and_then(|node| node.as_list_mut())
            .ok_or_else(|| KermaError::malformed("surface", "surface card has no data"))?;
        let values: Vec<Value> = coefficients.iter().map(|c| Value::Real(*c)).collect();
        list.update_with_new_values(&values)?;
        self.mutated = true;
        Ok(())
    }

    /// True for a `*`-prefixed reflecting boundary.
    pub fn is_reflecting(&self) -> bool {
        self.modifier() == Some("*")
    }

    /// True for a `+`-prefixed white boundary.
    pub fn is_white_boundary(&self) -> bool {
        self.modifier() == Some("+")
    }

    fn modifier(&self) -> Option<&str> {
        self.tree
            .get("modifier")
            .and_then(|node| node.as_value())
            .and_then(|node| node.as_text().ok())
    }

    /// The transform this surface is subject to, if any.
    pub fn transform_number(&self) -> Option<i64> {
        let pointer = self.pointer()?;
        (pointer > 0).then_some(pointer)
    }

    /// The surface this one is periodic with, if any.
    pub fn periodic_number(&self) -> Option<i64> {
        let pointer = self.pointer()?;
        (pointer < 0).then_some(-pointer)
    }

    fn pointer(&self) -> Option<i64> {
        self.tree
            .get("pointer")
            .and_then(|node| node.as_value())
            .and_then(|node| node.as_int().ok())
    }

    /// The half-space on the positive side of this surface.
    pub fn positive(&self) -> HalfSpace {
        HalfSpace::from(UnitHalfSpace::new(self.number, true, false))
    }

    /// The half-space on the negative side of this surface.
    pub fn negative(&self) -> HalfSpace {
        HalfSpace::from(UnitHalfSpace::new(self.number, false, false))
    }

    pub fn tree(&self) -> &SyntaxNode {
        &self.tree
    }

    pub fn mutated(&self) -> bool {
        self.mutated
    }

    /// Emit the card for a target release.
    pub fn format(&mut self, version: McnpVersion) -> Result<Vec<String>> {
        self.mutated = false;
        card_lines(&self.tree, version)
    }
}

impl Numbered for Surface {
    fn number(&self) -> i64 {
        self.number
    }
}

fn card_number(tree: &SyntaxNode, card: &'static str) -> Result<i64> {
    tree.get("number")
        .and_then(|node| node.as_value())
        .ok_or_else(|| KermaError::malformed(card, "card tree is missing its number"))?
        .as_int()
}

fn card_number_node_mut<'a>(
    tree: &'a mut SyntaxNode,
    card: &'static str,
) -> Result<&'a mut ValueNode> {
    tree.get_mut("number")
        .and_then(|node| node.as_value_mut())
        .ok_or_else(|| KermaError::malformed(card, "card tree is missing its number"))
}

/// Split a formatted tree into deck lines for a target release.
///
/// Lines within the release width pass through byte for byte; a line
/// past the width is re-wrapped from its words, with continuations
/// indented. Only the overlong line loses its exact spacing.
pub(crate) fn card_lines(tree: &SyntaxNode, version: McnpVersion) -> Result<Vec<String>> {
    let width = version.max_line_length()?;
    let text = tree.format();
    let mut lines = Vec::new();
    for (i, line) in text.split('\n').enumerate() {
        if line.len() <= width {
            lines.push(line.to_string());
        } else {
            lines.extend(version.wrap_string(line, i == 0)?);
        }
    }
    Ok(lines)
}
