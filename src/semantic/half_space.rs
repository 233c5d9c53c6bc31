//! Semantic half-space algebra over geometry trees
//!
//! A cell's geometry is a boolean region: each leaf claims one side of
//! a surface (or the complement of another cell) and operations combine
//! the claims. [`HalfSpace`] mirrors the parsed [`GeometryTree`] but
//! holds meaning instead of text: senses, resolved object references,
//! and operators that recombine with `&`, `|` and `!`. Writing an
//! edited half-space back goes through [`HalfSpace::update_values`],
//! which walks the semantic tree and the text tree in lockstep and only
//! touches text that no longer matches.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::mem;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::cst::geometry::{GeometryOperator, GeometryTree};
use crate::cst::trivia::PaddingNode;
use crate::cst::value::{ValueNode, ValueType};
use crate::error::KermaError;
use crate::result::Result;
use crate::semantic::object::{Cell, Cells, Surface, Surfaces};

/// One node of a boolean region definition
#[derive(Debug, Clone)]
pub enum HalfSpace {
    Unit(UnitHalfSpace),
    Operation(Box<HalfSpaceOperation>),
}

/// A boolean operator applied to one or two half-spaces
#[derive(Debug, Clone)]
pub struct HalfSpaceOperation {
    operator: GeometryOperator,
    left: HalfSpace,
    right: Option<HalfSpace>,
}

/// A leaf region: one side of a divider
///
/// `side` follows the deck's sign convention: true is the positive
/// side of the surface, false the negative. Cell complements carry no
/// sense of their own and always read as positive.
#[derive(Debug, Clone)]
pub struct UnitHalfSpace {
    divider: i64,
    side: bool,
    is_cell: bool,
    resolved: Option<ResolvedDivider>,
}

/// A non-owning reference to the object a divider resolved against
#[derive(Debug, Clone)]
pub enum ResolvedDivider {
    Cell(Weak<RefCell<Cell>>),
    Surface(Weak<RefCell<Surface>>),
}

impl HalfSpace {
    /// Read the semantic tree out of a parsed geometry expression.
    ///
    /// Every leaf is re-read as a sign-separated identifier, so the
    /// magnitude and the side become independently editable. A bare
    /// number directly under a complement is a cell reference; every
    /// other leaf names a surface.
    pub fn parse(tree: &mut GeometryTree) -> Result<HalfSpace> {
        match tree {
            GeometryTree::Leaf(node) => {
                Ok(HalfSpace::Unit(UnitHalfSpace::from_leaf(node, false)?))
            }
            GeometryTree::Group(group) => HalfSpace::parse(group.inner_mut()),
            GeometryTree::Operation(op) => {
                let is_cell = op.operator() == GeometryOperator::Complement;
                let operator = op.operator();
                let left = HalfSpace::parse_operand(op.left_mut(), is_cell)?;
                let right = match op.right_mut() {
                    Some(right) => Some(HalfSpace::parse_operand(right, is_cell)?),
                    None => None,
                };
                Ok(HalfSpace::Operation(Box::new(HalfSpaceOperation {
                    operator,
                    left,
                    right,
                })))
            }
        }
    }

    fn parse_operand(tree: &mut GeometryTree, is_cell: bool) -> Result<HalfSpace> {
        match tree {
            GeometryTree::Leaf(node) => {
                Ok(HalfSpace::Unit(UnitHalfSpace::from_leaf(node, is_cell)?))
            }
            other => HalfSpace::parse(other),
        }
    }

    /// The node's operator; a leaf has none.
    pub fn operator(&self) -> Option<GeometryOperator> {
        match self {
            HalfSpace::Unit(_) => None,
            HalfSpace::Operation(op) => Some(op.operator),
        }
    }

    pub fn as_unit(&self) -> Option<&UnitHalfSpace> {
        match self {
            HalfSpace::Unit(unit) => Some(unit),
            _ => None,
        }
    }

    pub fn as_unit_mut(&mut self) -> Option<&mut UnitHalfSpace> {
        match self {
            HalfSpace::Unit(unit) => Some(unit),
            _ => None,
        }
    }

    pub fn as_operation(&self) -> Option<&HalfSpaceOperation> {
        match self {
            HalfSpace::Operation(op) => Some(op),
            _ => None,
        }
    }

    pub fn as_operation_mut(&mut self) -> Option<&mut HalfSpaceOperation> {
        match self {
            HalfSpace::Operation(op) => Some(op),
            _ => None,
        }
    }

    /// Resolve every divider against the problem's objects.
    ///
    /// `owner` is the number of the cell this geometry belongs to; it
    /// names the referencing end of a broken-link diagnostic.
    pub fn update_pointers(
        &mut self,
        cells: &Cells,
        surfaces: &Surfaces,
        owner: i64,
    ) -> Result<()> {
        match self {
            HalfSpace::Unit(unit) => unit.update_pointers(cells, surfaces, owner),
            HalfSpace::Operation(op) => {
                op.left.update_pointers(cells, surfaces, owner)?;
                if let Some(right) = &mut op.right {
                    right.update_pointers(cells, surfaces, owner)?;
                }
                Ok(())
            }
        }
    }

    /// The referenced cell numbers and surface numbers, as two sets.
    ///
    /// Resolved leaves report the referenced object's current number,
    /// so the sets stay truthful across renumbering.
    pub fn leaf_objects(&self) -> (BTreeSet<i64>, BTreeSet<i64>) {
        let mut cells = BTreeSet::new();
        let mut surfaces = BTreeSet::new();
        self.collect_leaf_objects(&mut cells, &mut surfaces);
        (cells, surfaces)
    }

    fn collect_leaf_objects(&self, cells: &mut BTreeSet<i64>, surfaces: &mut BTreeSet<i64>) {
        match self {
            HalfSpace::Unit(unit) => {
                if unit.is_cell {
                    cells.insert(unit.number());
                } else {
                    surfaces.insert(unit.number());
                }
            }
            HalfSpace::Operation(op) => {
                op.left.collect_leaf_objects(cells, surfaces);
                if let Some(right) = &op.right {
                    right.collect_leaf_objects(cells, surfaces);
                }
            }
        }
    }

    /// Re-synchronize a geometry tree with this half-space.
    ///
    /// Nodes that still line up are edited in place: leaves get the
    /// current divider number and sense written through, operator slots
    /// are rewritten only when the glyph no longer matches. A subtree
    /// whose shape has drifted from the text is replaced outright with
    /// a synthesized rendering, keeping any trailing padding.
    pub fn update_values(&mut self, tree: &mut GeometryTree) -> Result<()> {
        if let GeometryTree::Group(group) = tree {
            return self.update_values(group.inner_mut());
        }
        match (&mut *self, &mut *tree) {
            (HalfSpace::Unit(unit), GeometryTree::Leaf(node)) => unit.update_values(node),
            (HalfSpace::Operation(op), GeometryTree::Operation(tree_op))
                if op.right.is_some() == tree_op.right().is_some() =>
            {
                tree_op.set_operator(op.operator);
                op.left.update_values(tree_op.left_mut())?;
                if let (Some(right), Some(tree_right)) = (op.right.as_mut(), tree_op.right_mut())
                {
                    right.update_values(tree_right)?;
                }
                Ok(())
            }
            (half_space, slot) => {
                trace!("synthesizing geometry text for a reshaped subtree");
                let trailing = slot.take_trailing_padding();
                let mut fresh = half_space.default_tree()?;
                if let Some(padding) = trailing {
                    fresh.set_trailing_padding(padding);
                }
                *slot = fresh;
                Ok(())
            }
        }
    }

    /// Synthesize a geometry tree rendering this half-space from
    /// scratch: single blanks for intersection, ` : ` for union, `#`
    /// for complement, parentheses wherever precedence needs them.
    pub fn default_tree(&self) -> Result<GeometryTree> {
        let op = match self {
            HalfSpace::Unit(unit) => return Ok(GeometryTree::leaf(unit.default_leaf()?)),
            HalfSpace::Operation(op) => op,
        };
        match (op.operator, &op.right) {
            (GeometryOperator::Complement, _) => Ok(GeometryTree::operation(
                GeometryOperator::Complement,
                PaddingNode::new("#"),
                op.left.default_operand(GeometryOperator::Complement)?,
                None,
            )),
            (operator, Some(right)) => {
                let slot = match operator {
                    GeometryOperator::Union => " : ",
                    _ => " ",
                };
                Ok(GeometryTree::operation(
                    operator,
                    PaddingNode::new(slot),
                    op.left.default_operand(operator)?,
                    Some(right.default_operand(operator)?),
                ))
            }
            (_, None) => Err(KermaError::malformed(
                "geometry",
                "binary geometry operator is missing its right operand",
            )),
        }
    }

    fn default_operand(&self, parent: GeometryOperator) -> Result<GeometryTree> {
        let tree = self.default_tree()?;
        let needs_group = match (parent, self.operator()) {
            // a union written bare next to an intersection would rebind
            (GeometryOperator::Intersection, Some(GeometryOperator::Union)) => true,
            // a complement operand that is not a bare number
            (GeometryOperator::Complement, Some(_)) => true,
            _ => false,
        };
        if !needs_group {
            return Ok(tree);
        }
        Ok(GeometryTree::group(
            ValueNode::new("(", ValueType::Text)?,
            tree,
            ValueNode::new(")", ValueType::Text)?,
        ))
    }

    fn combine(self, operator: GeometryOperator, other: HalfSpace) -> HalfSpace {
        HalfSpace::Operation(Box::new(HalfSpaceOperation {
            operator,
            left: self,
            right: Some(other),
        }))
    }

    /// Fold `other` into the receiver under `operator`.
    ///
    /// A receiver whose operands are all leaves grows on the right; a
    /// lone complement becomes one operand of a fresh operation; a
    /// deeper tree recurses into its right subtree. The receiver and
    /// `other` are both consumed.
    fn merged(self, operator: GeometryOperator, other: HalfSpace) -> HalfSpace {
        let mut op = match self {
            HalfSpace::Unit(_) => return self.combine(operator, other),
            HalfSpace::Operation(op) => op,
        };
        let left_leaf = matches!(op.left, HalfSpace::Unit(_));
        let right_leaf = op
            .right
            .as_ref()
            .is_none_or(|right| matches!(right, HalfSpace::Unit(_)));
        match op.right.take() {
            Some(right) if left_leaf && right_leaf => {
                op.right = Some(right.combine(operator, other));
                HalfSpace::Operation(op)
            }
            Some(right) => {
                op.right = Some(right.merged(operator, other));
                HalfSpace::Operation(op)
            }
            None => HalfSpace::Operation(op).combine(operator, other),
        }
    }

    fn detached() -> HalfSpace {
        HalfSpace::Unit(UnitHalfSpace::new(0, true, false))
    }
}

impl From<UnitHalfSpace> for HalfSpace {
    fn from(unit: UnitHalfSpace) -> Self {
        HalfSpace::Unit(unit)
    }
}

impl HalfSpaceOperation {
    pub fn operator(&self) -> GeometryOperator {
        self.operator
    }

    /// Change the operator. The backing text catches up on the next
    /// [`HalfSpace::update_values`].
    pub fn set_operator(&mut self, operator: GeometryOperator) {
        self.operator = operator;
    }

    pub fn left(&self) -> &HalfSpace {
        &self.left
    }

    pub fn left_mut(&mut self) -> &mut HalfSpace {
        &mut self.left
    }

    pub fn right(&self) -> Option<&HalfSpace> {
        self.right.as_ref()
    }

    pub fn right_mut(&mut self) -> Option<&mut HalfSpace> {
        self.right.as_mut()
    }
}

impl UnitHalfSpace {
    /// A leaf built programmatically, not yet resolved.
    pub fn new(divider: i64, side: bool, is_cell: bool) -> Self {
        Self {
            divider,
            side,
            is_cell,
            resolved: None,
        }
    }

    fn from_leaf(node: &mut ValueNode, is_cell: bool) -> Result<Self> {
        node.make_negatable_identifier();
        let divider = node.as_int()?;
        let side = is_cell || !node.is_negative().unwrap_or(false);
        Ok(Self {
            divider,
            side,
            is_cell,
            resolved: None,
        })
    }

    /// The divider number as parsed or assigned.
    pub fn divider(&self) -> i64 {
        self.divider
    }

    /// The divider's current number: the resolved object's if there is
    /// one, the raw divider otherwise.
    pub fn number(&self) -> i64 {
        match &self.resolved {
            Some(ResolvedDivider::Cell(cell)) => cell
                .upgrade()
                .map(|cell| cell.borrow().number())
                .unwrap_or(self.divider),
            Some(ResolvedDivider::Surface(surface)) => surface
                .upgrade()
                .map(|surface| surface.borrow().number())
                .unwrap_or(self.divider),
            None => self.divider,
        }
    }

    pub fn side(&self) -> bool {
        self.side
    }

    pub fn set_side(&mut self, side: bool) {
        self.side = side;
    }

    pub fn is_cell(&self) -> bool {
        self.is_cell
    }

    pub fn resolved(&self) -> Option<&ResolvedDivider> {
        self.resolved.as_ref()
    }

    /// Resolve the divider: cell references against the cell namespace,
    /// everything else against the surface namespace.
    pub fn update_pointers(
        &mut self,
        cells: &Cells,
        surfaces: &Surfaces,
        owner: i64,
    ) -> Result<()> {
        if self.is_cell {
            let target = cells.get(self.divider).ok_or_else(|| {
                KermaError::broken_link("Cell", owner, "Complement", self.divider)
            })?;
            self.resolved = Some(ResolvedDivider::Cell(Rc::downgrade(&target)));
        } else {
            let target = surfaces.get(self.divider).ok_or_else(|| {
                KermaError::broken_link("Cell", owner, "Surface", self.divider)
            })?;
            self.resolved = Some(ResolvedDivider::Surface(Rc::downgrade(&target)));
        }
        Ok(())
    }

    fn update_values(&mut self, node: &mut ValueNode) -> Result<()> {
        self.divider = self.number();
        node.set_int(self.divider)?;
        node.set_is_negative(!self.side);
        Ok(())
    }

    fn default_leaf(&self) -> Result<ValueNode> {
        let mut node = ValueNode::empty(ValueType::Integer);
        node.make_negatable_identifier();
        node.set_int(self.number())?;
        node.set_is_negative(!self.side);
        Ok(node)
    }
}

impl BitAnd for HalfSpace {
    type Output = HalfSpace;

    /// Intersection of two regions. Consumes both operands.
    fn bitand(self, rhs: HalfSpace) -> HalfSpace {
        self.combine(GeometryOperator::Intersection, rhs)
    }
}

impl BitOr for HalfSpace {
    type Output = HalfSpace;

    /// Union of two regions. Consumes both operands.
    fn bitor(self, rhs: HalfSpace) -> HalfSpace {
        self.combine(GeometryOperator::Union, rhs)
    }
}

impl Not for HalfSpace {
    type Output = HalfSpace;

    /// Geometric complement of a region.
    fn not(self) -> HalfSpace {
        HalfSpace::Operation(Box::new(HalfSpaceOperation {
            operator: GeometryOperator::Complement,
            left: self,
            right: None,
        }))
    }
}

impl BitAndAssign for HalfSpace {
    fn bitand_assign(&mut self, rhs: HalfSpace) {
        let receiver = mem::replace(self, HalfSpace::detached());
        *self = receiver.merged(GeometryOperator::Intersection, rhs);
    }
}

impl BitOrAssign for HalfSpace {
    fn bitor_assign(&mut self, rhs: HalfSpace) {
        let receiver = mem::replace(self, HalfSpace::detached());
        *self = receiver.merged(GeometryOperator::Union, rhs);
    }
}
