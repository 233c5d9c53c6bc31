//! Geometry expression trees
//!
//! Cell geometry is a boolean expression over signed surface numbers and
//! `#` cell complements. Intersection has no glyph at all, so every
//! operator here owns a padding slot holding the exact text between (or
//! before) its operands, `:` and `#` included. Rewriting an operator
//! edits that slot in place instead of rebuilding it, which keeps the
//! surrounding whitespace layout intact.

use tracing::trace;

use crate::cst::trivia::{CommentNode, PaddingFragment, PaddingNode};
use crate::cst::value::ValueNode;

/// Boolean operator of a geometry node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryOperator {
    /// Operands separated only by blanks
    Intersection,
    /// `:`
    Union,
    /// `#`, unary
    Complement,
}

/// One node of a parsed geometry expression
#[derive(Debug, Clone)]
pub enum GeometryTree {
    /// A signed surface or cell number
    Leaf(ValueNode),
    /// A parenthesized sub-expression
    Group(GeometryGroup),
    Operation(Box<GeometryOperation>),
}

#[derive(Debug, Clone)]
pub struct GeometryGroup {
    open: ValueNode,
    inner: Box<GeometryTree>,
    close: ValueNode,
}

#[derive(Debug, Clone)]
pub struct GeometryOperation {
    operator: GeometryOperator,
    slot: PaddingNode,
    left: GeometryTree,
    right: Option<GeometryTree>,
}

impl GeometryTree {
    pub fn leaf(node: ValueNode) -> Self {
        GeometryTree::Leaf(node)
    }

    pub fn group(open: ValueNode, inner: GeometryTree, close: ValueNode) -> Self {
        GeometryTree::Group(GeometryGroup {
            open,
            inner: Box::new(inner),
            close,
        })
    }

    /// A binary operation, or a unary complement when `right` is absent.
    pub fn operation(
        operator: GeometryOperator,
        slot: PaddingNode,
        left: GeometryTree,
        right: Option<GeometryTree>,
    ) -> Self {
        GeometryTree::Operation(Box::new(GeometryOperation {
            operator,
            slot,
            left,
            right,
        }))
    }

    pub fn as_leaf(&self) -> Option<&ValueNode> {
        match self {
            GeometryTree::Leaf(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_operation(&self) -> Option<&GeometryOperation> {
        match self {
            GeometryTree::Operation(op) => Some(op),
            _ => None,
        }
    }

    pub fn as_operation_mut(&mut self) -> Option<&mut GeometryOperation> {
        match self {
            GeometryTree::Operation(op) => Some(op),
            _ => None,
        }
    }

    /// Every number leaf, left to right.
    pub fn leaves(&self) -> Vec<&ValueNode> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a ValueNode>) {
        match self {
            GeometryTree::Leaf(node) => out.push(node),
            GeometryTree::Group(group) => group.inner.collect_leaves(out),
            GeometryTree::Operation(op) => {
                op.left.collect_leaves(out);
                if let Some(right) = &op.right {
                    right.collect_leaves(out);
                }
            }
        }
    }

    pub fn format(&self) -> String {
        match self {
            GeometryTree::Leaf(node) => node.format(),
            GeometryTree::Group(group) => {
                let mut out = group.open.format();
                out.push_str(&group.inner.format());
                out.push_str(&group.close.format());
                out
            }
            GeometryTree::Operation(op) => op.format(),
        }
    }

    pub fn comments(&self) -> Vec<&CommentNode> {
        match self {
            GeometryTree::Leaf(node) => node.comments(),
            GeometryTree::Group(group) => {
                let mut out = group.open.comments();
                out.extend(group.inner.comments());
                out.extend(group.close.comments());
                out
            }
            GeometryTree::Operation(op) => match &op.right {
                Some(right) => {
                    let mut out = op.left.comments();
                    out.extend(op.slot.comments());
                    out.extend(right.comments());
                    out
                }
                None => {
                    let mut out = op.slot.comments();
                    out.extend(op.left.comments());
                    out
                }
            },
        }
    }

    /// Trailing comment of the last rendered component.
    pub fn get_trailing_comment(&self) -> Option<Vec<&CommentNode>> {
        match self {
            GeometryTree::Leaf(node) => node.get_trailing_comment(),
            GeometryTree::Group(group) => group.close.get_trailing_comment(),
            GeometryTree::Operation(op) => match &op.right {
                Some(right) => right.get_trailing_comment(),
                None => op.left.get_trailing_comment(),
            },
        }
    }

    pub fn delete_trailing_comment(&mut self) {
        match self {
            GeometryTree::Leaf(node) => node.delete_trailing_comment(),
            GeometryTree::Group(group) => group.close.delete_trailing_comment(),
            GeometryTree::Operation(op) => match &mut op.right {
                Some(right) => right.delete_trailing_comment(),
                None => op.left.delete_trailing_comment(),
            },
        }
    }

    pub(crate) fn take_trailing_padding(&mut self) -> Option<PaddingNode> {
        match self {
            GeometryTree::Leaf(node) => node.take_padding(),
            GeometryTree::Group(group) => group.close.take_padding(),
            GeometryTree::Operation(op) => match &mut op.right {
                Some(right) => right.take_trailing_padding(),
                None => op.left.take_trailing_padding(),
            },
        }
    }

    pub(crate) fn set_trailing_padding(&mut self, padding: PaddingNode) {
        match self {
            GeometryTree::Leaf(node) => node.set_padding(padding),
            GeometryTree::Group(group) => group.close.set_padding(padding),
            GeometryTree::Operation(op) => match &mut op.right {
                Some(right) => right.set_trailing_padding(padding),
                None => op.left.set_trailing_padding(padding),
            },
        }
    }
}

impl GeometryGroup {
    pub fn inner(&self) -> &GeometryTree {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut GeometryTree {
        &mut self.inner
    }
}

impl GeometryOperation {
    pub fn operator(&self) -> GeometryOperator {
        self.operator
    }

    pub fn slot(&self) -> &PaddingNode {
        &self.slot
    }

    pub fn left(&self) -> &GeometryTree {
        &self.left
    }

    pub fn left_mut(&mut self) -> &mut GeometryTree {
        &mut self.left
    }

    pub fn right(&self) -> Option<&GeometryTree> {
        self.right.as_ref()
    }

    pub fn right_mut(&mut self) -> Option<&mut GeometryTree> {
        self.right.as_mut()
    }

    pub fn format(&self) -> String {
        match &self.right {
            Some(right) => {
                let mut out = self.left.format();
                out.push_str(&self.slot.format());
                out.push_str(&right.format());
                out
            }
            None => {
                let mut out = self.slot.format();
                out.push_str(&self.left.format());
                out
            }
        }
    }

    /// Change the operator, rewriting the slot text only when the glyph
    /// it carries no longer matches. The replacement glyph overwrites a
    /// blank near the slot midpoint (`:`) or the blank touching the
    /// operand (`#`), so slot width is preserved.
    pub fn set_operator(&mut self, operator: GeometryOperator) {
        let output = self.slot.format();
        let already = match operator {
            GeometryOperator::Intersection => {
                !output.is_empty() && output.chars().all(char::is_whitespace)
            }
            GeometryOperator::Union => output.contains(':'),
            GeometryOperator::Complement => output.contains('#'),
        };
        self.operator = operator;
        if already {
            return;
        }
        trace!(?operator, slot = %output, "rewriting geometry operator slot");
        scrub_glyphs(&mut self.slot);
        match operator {
            GeometryOperator::Intersection => {
                if self.slot.is_empty() {
                    self.slot.push_fragment(PaddingFragment::Text(" ".to_string()));
                }
            }
            GeometryOperator::Union => place_union_glyph(&mut self.slot),
            GeometryOperator::Complement => place_complement_glyph(&mut self.slot),
        }
    }
}

fn scrub_glyphs(slot: &mut PaddingNode) {
    for fragment in slot.fragments_mut() {
        if let PaddingFragment::Text(text) = fragment
            && text.contains([':', '#'])
        {
            *text = text.replace([':', '#'], " ");
        }
    }
}

fn place_union_glyph(slot: &mut PaddingNode) {
    let midpoint = slot.format().chars().count() / 2;
    let mut offset = 0usize;
    for fragment in slot.fragments_mut() {
        let span = fragment.format().chars().count();
        if let PaddingFragment::Text(text) = fragment
            && offset + span > midpoint
        {
            let local = midpoint.saturating_sub(offset);
            *text = text
                .chars()
                .enumerate()
                .map(|(i, ch)| if i == local { ':' } else { ch })
                .collect();
            return;
        }
        offset += span;
    }
    slot.push_fragment(PaddingFragment::Text(":".to_string()));
}

fn place_complement_glyph(slot: &mut PaddingNode) {
    for fragment in slot.fragments_mut().iter_mut().rev() {
        if let PaddingFragment::Text(text) = fragment {
            let mut chars: Vec<char> = text.chars().collect();
            if let Some(last) = chars.last_mut() {
                *last = '#';
                *text = chars.into_iter().collect();
                return;
            }
        }
    }
    slot.push_fragment(PaddingFragment::Text("#".to_string()));
}
