//! Structural nodes: named productions, value lists and classifiers
//!
//! A parsed card is a [`SyntaxNode`], an insertion-ordered mapping from
//! production names to child nodes. Lists of numbers are [`ListNode`]s
//! whose children are literal values and expanded shortcut runs.
//! Formatting any structural node concatenates its children, so the
//! round-trip guarantee of the leaves carries up the tree.

use indexmap::IndexMap;

use crate::cst::geometry::GeometryTree;
use crate::cst::shortcut::ShortcutNode;
use crate::cst::trivia::{CommentNode, PaddingNode};
use crate::cst::value::{Value, ValueNode, ValueType, values_equal};
use crate::error::KermaError;
use crate::result::Result;
use crate::semantic::particle::Particle;

/// Any node a [`SyntaxNode`] can hold
#[derive(Debug, Clone)]
pub enum CstNode {
    Value(ValueNode),
    Syntax(SyntaxNode),
    List(ListNode),
    Classifier(ClassifierNode),
    Particles(ParticleNode),
    Parameters(ParametersNode),
    Geometry(GeometryTree),
    Padding(PaddingNode),
}

impl CstNode {
    pub fn format(&self) -> String {
        match self {
            CstNode::Value(node) => node.format(),
            CstNode::Syntax(node) => node.format(),
            CstNode::List(node) => node.format(),
            CstNode::Classifier(node) => node.format(),
            CstNode::Particles(node) => node.format(),
            CstNode::Parameters(node) => node.format(),
            CstNode::Geometry(node) => node.format(),
            CstNode::Padding(node) => node.format(),
        }
    }

    pub fn comments(&self) -> Vec<&CommentNode> {
        match self {
            CstNode::Value(node) => node.comments(),
            CstNode::Syntax(node) => node.comments(),
            CstNode::List(node) => node.comments(),
            CstNode::Classifier(node) => node.comments(),
            CstNode::Particles(_) => Vec::new(),
            CstNode::Parameters(node) => node.comments(),
            CstNode::Geometry(node) => node.comments(),
            CstNode::Padding(node) => node.comments(),
        }
    }

    pub fn get_trailing_comment(&self) -> Option<Vec<&CommentNode>> {
        match self {
            CstNode::Value(node) => node.get_trailing_comment(),
            CstNode::Syntax(node) => node.get_trailing_comment(),
            CstNode::List(node) => node.get_trailing_comment(),
            CstNode::Classifier(node) => node.get_trailing_comment(),
            CstNode::Particles(_) => None,
            CstNode::Parameters(node) => node.get_trailing_comment(),
            CstNode::Geometry(node) => node.get_trailing_comment(),
            CstNode::Padding(node) => node.get_trailing_comment(),
        }
    }

    pub fn delete_trailing_comment(&mut self) {
        match self {
            CstNode::Value(node) => node.delete_trailing_comment(),
            CstNode::Syntax(node) => node.delete_trailing_comment(),
            CstNode::List(node) => node.delete_trailing_comment(),
            CstNode::Classifier(node) => node.delete_trailing_comment(),
            CstNode::Particles(_) => {}
            CstNode::Parameters(node) => node.delete_trailing_comment(),
            CstNode::Geometry(node) => node.delete_trailing_comment(),
            CstNode::Padding(node) => node.delete_trailing_comment(),
        }
    }

    pub fn as_value(&self) -> Option<&ValueNode> {
        match self {
            CstNode::Value(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_value_mut(&mut self) -> Option<&mut ValueNode> {
        match self {
            CstNode::Value(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListNode> {
        match self {
            CstNode::List(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut ListNode> {
        match self {
            CstNode::List(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_syntax(&self) -> Option<&SyntaxNode> {
        match self {
            CstNode::Syntax(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_syntax_mut(&mut self) -> Option<&mut SyntaxNode> {
        match self {
            CstNode::Syntax(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_classifier(&self) -> Option<&ClassifierNode> {
        match self {
            CstNode::Classifier(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_classifier_mut(&mut self) -> Option<&mut ClassifierNode> {
        match self {
            CstNode::Classifier(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_parameters(&self) -> Option<&ParametersNode> {
        match self {
            CstNode::Parameters(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_parameters_mut(&mut self) -> Option<&mut ParametersNode> {
        match self {
            CstNode::Parameters(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_geometry(&self) -> Option<&GeometryTree> {
        match self {
            CstNode::Geometry(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_geometry_mut(&mut self) -> Option<&mut GeometryTree> {
        match self {
            CstNode::Geometry(node) => Some(node),
            _ => None,
        }
    }
}

impl From<ValueNode> for CstNode {
    fn from(node: ValueNode) -> Self {
        CstNode::Value(node)
    }
}

impl From<SyntaxNode> for CstNode {
    fn from(node: SyntaxNode) -> Self {
        CstNode::Syntax(node)
    }
}

impl From<ListNode> for CstNode {
    fn from(node: ListNode) -> Self {
        CstNode::List(node)
    }
}

impl From<ClassifierNode> for CstNode {
    fn from(node: ClassifierNode) -> Self {
        CstNode::Classifier(node)
    }
}

impl From<ParticleNode> for CstNode {
    fn from(node: ParticleNode) -> Self {
        CstNode::Particles(node)
    }
}

impl From<ParametersNode> for CstNode {
    fn from(node: ParametersNode) -> Self {
        CstNode::Parameters(node)
    }
}

impl From<GeometryTree> for CstNode {
    fn from(node: GeometryTree) -> Self {
        CstNode::Geometry(node)
    }
}

impl From<PaddingNode> for CstNode {
    fn from(node: PaddingNode) -> Self {
        CstNode::Padding(node)
    }
}

/// A named production: an ordered name-to-child mapping
#[derive(Debug, Clone, Default)]
pub struct SyntaxNode {
    name: String,
    nodes: IndexMap<String, CstNode>,
}

impl SyntaxNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn insert(&mut self, key: impl Into<String>, node: impl Into<CstNode>) {
        self.nodes.insert(key.into(), node.into());
    }

    pub fn get(&self, key: &str) -> Option<&CstNode> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut CstNode> {
        self.nodes.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CstNode)> {
        self.nodes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The scalar value of the named child.
    ///
    /// Fails with a key error when the name is absent or the child is
    /// not a scalar node. A value-less slot reads back as `None`.
    pub fn get_value(&self, key: &str) -> Result<Option<&Value>> {
        match self.nodes.get(key) {
            Some(CstNode::Value(node)) => Ok(node.value()),
            _ => Err(KermaError::key_not_found(key)),
        }
    }

    pub fn format(&self) -> String {
        let mut out = String::new();
        for node in self.nodes.values() {
            out.push_str(&node.format());
        }
        out
    }

    pub fn comments(&self) -> Vec<&CommentNode> {
        self.nodes.values().flat_map(CstNode::comments).collect()
    }

    /// The trailing comment of the last-inserted child, if any.
    pub fn get_trailing_comment(&self) -> Option<Vec<&CommentNode>> {
        let (_, node) = self.nodes.get_index(self.nodes.len().checked_sub(1)?)?;
        node.get_trailing_comment()
    }

    pub fn delete_trailing_comment(&mut self) {
        let Some(last) = self.nodes.len().checked_sub(1) else {
            return;
        };
        if let Some((_, node)) = self.nodes.get_index_mut(last) {
            node.delete_trailing_comment();
        }
    }
}

/// One child of a [`ListNode`]
#[derive(Debug, Clone)]
pub enum ListItem {
    Value(ValueNode),
    Shortcut(ShortcutNode),
}

impl ListItem {
    pub fn format(&self) -> String {
        match self {
            ListItem::Value(node) => node.format(),
            ListItem::Shortcut(node) => node.format(),
        }
    }

    fn value_count(&self) -> usize {
        match self {
            ListItem::Value(_) => 1,
            ListItem::Shortcut(node) => node.len(),
        }
    }
}

/// An ordered run of values, keeping shortcut runs structural
///
/// Indexing, iteration and equality all see the *expanded* values, so a
/// list holding `1 2R` behaves like three elements.
#[derive(Debug, Clone, Default)]
pub struct ListNode {
    name: String,
    items: Vec<ListItem>,
}

impl ListNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn push(&mut self, node: ValueNode) {
        self.items.push(ListItem::Value(node));
    }

    pub fn push_shortcut(&mut self, node: ShortcutNode) {
        self.items.push(ListItem::Shortcut(node));
    }

    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    /// Number of expanded values.
    pub fn len(&self) -> usize {
        self.items.iter().map(ListItem::value_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expanded values in order, reaching inside shortcut runs.
    pub fn values(&self) -> impl Iterator<Item = &ValueNode> {
        self.items.iter().flat_map(|item| match item {
            ListItem::Value(node) => std::slice::from_ref(node).iter(),
            ListItem::Shortcut(node) => node.values().iter(),
        })
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut ValueNode> {
        self.items.iter_mut().flat_map(|item| match item {
            ListItem::Value(node) => std::slice::from_mut(node).iter_mut(),
            ListItem::Shortcut(node) => node.values_mut().iter_mut(),
        })
    }

    /// Positional access over expanded values; negative indexes count
    /// from the end.
    pub fn get(&self, index: isize) -> Result<&ValueNode> {
        let position = self.resolve_index(index)?;
        self.values()
            .nth(position)
            .ok_or_else(|| KermaError::index_out_of_range(index, self.len()))
    }

    pub fn get_mut(&mut self, index: isize) -> Result<&mut ValueNode> {
        let position = self.resolve_index(index)?;
        let len = self.len();
        self.values_mut()
            .nth(position)
            .ok_or_else(|| KermaError::index_out_of_range(index, len))
    }

    fn resolve_index(&self, index: isize) -> Result<usize> {
        let len = self.len();
        let resolved = if index < 0 {
            len.checked_sub(index.unsigned_abs())
        } else {
            Some(index as usize)
        };
        resolved
            .filter(|i| *i < len)
            .ok_or_else(|| KermaError::index_out_of_range(index, len))
    }

    /// Map a caller-edited value sequence back onto the structure.
    ///
    /// A shortcut run whose values all reappear unchanged in place
    /// stays collapsed; any other shortcut explodes to literals. Extra
    /// values append as plain literals; a shorter sequence truncates.
    pub fn update_with_new_values(&mut self, new: &[Value]) -> Result<()> {
        let old = std::mem::take(&mut self.items);
        let mut cursor = 0usize;
        for item in old {
            if cursor >= new.len() {
                break;
            }
            match item {
                ListItem::Value(mut node) => {
                    node.set_value(new[cursor].clone())?;
                    cursor += 1;
                    self.items.push(ListItem::Value(node));
                }
                ListItem::Shortcut(shortcut) => {
                    let span = shortcut.len();
                    let window = &new[cursor..new.len().min(cursor + span)];
                    let survives = window.len() == span
                        && shortcut
                            .values()
                            .iter()
                            .zip(window)
                            .all(|(node, value)| values_equal(node.value(), Some(value)));
                    if survives {
                        cursor += span;
                        self.items.push(ListItem::Shortcut(shortcut));
                    } else {
                        for mut node in shortcut.into_literals() {
                            if cursor >= new.len() {
                                break;
                            }
                            node.set_value(new[cursor].clone())?;
                            cursor += 1;
                            self.items.push(ListItem::Value(node));
                        }
                    }
                }
            }
        }
        while cursor < new.len() {
            self.items.push(ListItem::Value(literal_from(&new[cursor])?));
            cursor += 1;
        }
        Ok(())
    }

    pub fn format(&self) -> String {
        let mut out = String::new();
        for item in &self.items {
            let rendered = item.format();
            if !out.is_empty() && !rendered.is_empty() && !out.ends_with(char::is_whitespace) {
                out.push(' ');
            }
            out.push_str(&rendered);
        }
        out
    }

    pub fn comments(&self) -> Vec<&CommentNode> {
        self.items
            .iter()
            .flat_map(|item| match item {
                ListItem::Value(node) => node.comments(),
                ListItem::Shortcut(node) => node.comments(),
            })
            .collect()
    }

    pub fn get_trailing_comment(&self) -> Option<Vec<&CommentNode>> {
        match self.items.last()? {
            ListItem::Value(node) => node.get_trailing_comment(),
            ListItem::Shortcut(node) => node.get_trailing_comment(),
        }
    }

    pub fn delete_trailing_comment(&mut self) {
        match self.items.last_mut() {
            Some(ListItem::Value(node)) => node.delete_trailing_comment(),
            Some(ListItem::Shortcut(node)) => node.delete_trailing_comment(),
            None => {}
        }
    }
}

impl PartialEq for ListNode {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.values().zip(other.values()).all(|(a, b)| a == b)
    }
}

impl PartialEq<[ValueNode]> for ListNode {
    fn eq(&self, other: &[ValueNode]) -> bool {
        self.len() == other.len() && self.values().zip(other).all(|(a, b)| a == b)
    }
}

fn literal_from(value: &Value) -> Result<ValueNode> {
    let value_type = match value {
        Value::Integer(_) => ValueType::Integer,
        Value::Real(_) => ValueType::Real,
        Value::Text(_) => ValueType::Text,
    };
    let mut node = ValueNode::empty(value_type);
    node.set_value(value.clone())?;
    Ok(node)
}

/// The particle set of a classifier suffix such as `:n,p`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticleNode {
    token: Option<String>,
    particles: Vec<Particle>,
    changed: bool,
}

impl ParticleNode {
    /// Parse a designator suffix, with or without the leading colon.
    pub fn parse(text: &str) -> Result<Self> {
        let suffix = text.strip_prefix(':').unwrap_or(text);
        let mut particles = Vec::new();
        for piece in suffix.split(',') {
            let mut chars = piece.chars();
            let particle = match (chars.next(), chars.next()) {
                (Some(letter), None) => Particle::from_letter(letter)?,
                _ => {
                    return Err(KermaError::type_mismatch("particle designator", piece));
                }
            };
            if let Err(position) = particles.binary_search(&particle) {
                particles.insert(position, particle);
            }
        }
        Ok(Self {
            token: Some(suffix.to_string()),
            particles,
            changed: false,
        })
    }

    pub fn from_particles(particles: impl IntoIterator<Item = Particle>) -> Self {
        let mut node = Self {
            token: None,
            particles: Vec::new(),
            changed: true,
        };
        for particle in particles {
            node.add(particle);
        }
        node
    }

    /// The particles in canonical order.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn contains(&self, particle: Particle) -> bool {
        self.particles.binary_search(&particle).is_ok()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn add(&mut self, particle: Particle) {
        if let Err(position) = self.particles.binary_search(&particle) {
            self.particles.insert(position, particle);
            self.changed = true;
        }
    }

    pub fn remove(&mut self, particle: Particle) -> Result<()> {
        match self.particles.binary_search(&particle) {
            Ok(position) => {
                self.particles.remove(position);
                self.changed = true;
                Ok(())
            }
            Err(_) => Err(KermaError::key_not_found(particle.to_string())),
        }
    }

    /// Render the suffix: the original letters while untouched, the
    /// canonical sorted set once edited. Always colon-led.
    pub fn format(&self) -> String {
        match (&self.token, self.changed) {
            (Some(token), false) => format!(":{token}"),
            _ => {
                let letters: Vec<String> =
                    self.particles.iter().map(Particle::to_string).collect();
                format!(":{}", letters.join(","))
            }
        }
    }
}

/// The structured parse of a data-input name such as `*tr5` or `f4`
#[derive(Debug, Clone)]
pub struct ClassifierNode {
    modifier: Option<char>,
    prefix: String,
    number: Option<ValueNode>,
    particles: Option<ParticleNode>,
    padding: Option<PaddingNode>,
}

impl ClassifierNode {
    /// Parse the name part of a data input: an optional `*`/`+`
    /// modifier, a letter prefix, an optional number. The particle
    /// suffix arrives as its own token and is attached separately.
    pub fn parse(word: &str) -> Result<Self> {
        if !word.is_ascii() {
            return Err(KermaError::malformed(
                "classifier",
                format!("data name {word:?} is not ascii"),
            ));
        }
        let bytes = word.as_bytes();
        let mut pos = 0usize;
        let modifier = match bytes.first() {
            Some(b'*') => {
                pos = 1;
                Some('*')
            }
            Some(b'+') => {
                pos = 1;
                Some('+')
            }
            _ => None,
        };
        let prefix_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }
        if pos == prefix_start {
            return Err(KermaError::malformed(
                "classifier",
                format!("data name {word:?} has no prefix"),
            ));
        }
        let prefix = word[prefix_start..pos].to_string();
        let number_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        let number = if pos > number_start {
            Some(ValueNode::new(&word[number_start..pos], ValueType::Integer)?)
        } else {
            None
        };
        if pos != bytes.len() {
            return Err(KermaError::malformed(
                "classifier",
                format!("data name {word:?} has trailing characters"),
            ));
        }
        Ok(Self {
            modifier,
            prefix,
            number,
            particles: None,
            padding: None,
        })
    }

    pub fn modifier(&self) -> Option<char> {
        self.modifier
    }

    /// The prefix letters as written.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn number(&self) -> Option<&ValueNode> {
        self.number.as_ref()
    }

    pub fn number_mut(&mut self) -> Option<&mut ValueNode> {
        self.number.as_mut()
    }

    pub fn particles(&self) -> Option<&ParticleNode> {
        self.particles.as_ref()
    }

    pub fn particles_mut(&mut self) -> Option<&mut ParticleNode> {
        self.particles.as_mut()
    }

    pub fn set_particles(&mut self, particles: ParticleNode) {
        self.particles = Some(particles);
    }

    pub fn padding(&self) -> Option<&PaddingNode> {
        self.padding.as_ref()
    }

    pub fn set_padding(&mut self, padding: PaddingNode) {
        self.padding = Some(padding);
    }

    /// The name without padding, as it keys parameter lookups.
    pub fn format_name(&self) -> String {
        let mut out = String::new();
        if let Some(modifier) = self.modifier {
            out.push(modifier);
        }
        out.push_str(&self.prefix);
        if let Some(number) = &self.number {
            out.push_str(&number.format());
        }
        if let Some(particles) = &self.particles {
            out.push_str(&particles.format());
        }
        out
    }

    pub fn format(&self) -> String {
        let mut out = self.format_name();
        if let Some(padding) = &self.padding {
            out.push_str(&padding.format());
        }
        out
    }

    pub fn comments(&self) -> Vec<&CommentNode> {
        self.padding
            .as_ref()
            .map(|p| p.comments())
            .unwrap_or_default()
    }

    pub fn get_trailing_comment(&self) -> Option<Vec<&CommentNode>> {
        self.padding.as_ref().and_then(|p| p.get_trailing_comment())
    }

    pub fn delete_trailing_comment(&mut self) {
        if let Some(padding) = &mut self.padding {
            padding.delete_trailing_comment();
        }
    }
}

/// One `name=values` parameter on a cell or data card
#[derive(Debug, Clone)]
pub struct ParameterEntry {
    classifier: ClassifierNode,
    separator: ValueNode,
    data: ListNode,
}

impl ParameterEntry {
    pub fn new(classifier: ClassifierNode, separator: ValueNode, data: ListNode) -> Self {
        Self {
            classifier,
            separator,
            data,
        }
    }

    pub fn classifier(&self) -> &ClassifierNode {
        &self.classifier
    }

    pub fn classifier_mut(&mut self) -> &mut ClassifierNode {
        &mut self.classifier
    }

    pub fn data(&self) -> &ListNode {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ListNode {
        &mut self.data
    }

    pub fn format(&self) -> String {
        let mut out = self.classifier.format();
        out.push_str(&self.separator.format());
        out.push_str(&self.data.format());
        out
    }

    pub fn comments(&self) -> Vec<&CommentNode> {
        let mut out = self.classifier.comments();
        out.extend(self.separator.comments());
        out.extend(self.data.comments());
        out
    }
}

/// The trailing `KEY=value` run of a card, keyed by upper-cased name
#[derive(Debug, Clone, Default)]
pub struct ParametersNode {
    entries: IndexMap<String, ParameterEntry>,
}

impl ParametersNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: ParameterEntry) {
        let key = entry.classifier.format_name().to_uppercase();
        self.entries.insert(key, entry);
    }

    pub fn get(&self, key: &str) -> Option<&ParameterEntry> {
        self.entries.get(&key.to_uppercase())
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ParameterEntry> {
        self.entries.get_mut(&key.to_uppercase())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn format(&self) -> String {
        let mut out = String::new();
        for entry in self.entries.values() {
            let rendered = entry.format();
            if !out.is_empty() && !rendered.is_empty() && !out.ends_with(char::is_whitespace) {
                out.push(' ');
            }
            out.push_str(&rendered);
        }
        out
    }

    pub fn comments(&self) -> Vec<&CommentNode> {
        self.entries
            .values()
            .flat_map(ParameterEntry::comments)
            .collect()
    }

    pub fn get_trailing_comment(&self) -> Option<Vec<&CommentNode>> {
        let (_, entry) = self.entries.get_index(self.entries.len().checked_sub(1)?)?;
        entry.data.get_trailing_comment()
    }

    pub fn delete_trailing_comment(&mut self) {
        let Some(last) = self.entries.len().checked_sub(1) else {
            return;
        };
        if let Some((_, entry)) = self.entries.get_index_mut(last) {
            entry.data.delete_trailing_comment();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::shortcut::ShortcutNode;
    use crate::error::ErrorKind;

    fn real(token: &str) -> ValueNode {
        ValueNode::new(token, ValueType::Real).unwrap()
    }

    fn padded_real(token: &str, padding: &str) -> ValueNode {
        ValueNode::with_padding(token, ValueType::Real, PaddingNode::new(padding)).unwrap()
    }

    #[test]
    fn syntax_node_concatenates_children_in_order() {
        let mut node = SyntaxNode::new("cell");
        node.insert("start_pad", PaddingNode::new("  "));
        node.insert(
            "number",
            ValueNode::with_padding("1", ValueType::Integer, PaddingNode::new(" ")).unwrap(),
        );
        node.insert("material", ValueNode::new("0", ValueType::Integer).unwrap());
        assert_eq!(node.format(), "  1 0");
        assert_eq!(node.name(), "cell");
        assert!(node.contains("number"));
        assert_eq!(node.len(), 3);
    }

    #[test]
    fn get_value_reads_scalars_only() {
        let mut node = SyntaxNode::new("card");
        node.insert("number", ValueNode::new("5", ValueType::Integer).unwrap());
        node.insert("pad", PaddingNode::new(" "));
        assert_eq!(node.get_value("number").unwrap(), Some(&Value::Integer(5)));
        let err = node.get_value("missing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
        let err = node.get_value("pad").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
    }

    #[test]
    fn syntax_trailing_comment_walks_the_last_child() {
        let mut node = SyntaxNode::new("card");
        node.insert("first", padded_real("1.0", " "));
        let mut last = real("2.0");
        last.set_padding(PaddingNode::comment("$ hi").unwrap());
        node.insert("last", last);

        let comments = node.get_trailing_comment().unwrap();
        assert_eq!(comments.len(), 1);
        node.delete_trailing_comment();
        assert!(node.get_trailing_comment().is_none());
        assert_eq!(node.format(), "1.0 2.0");
    }

    #[test]
    fn list_joins_unpadded_items_with_single_spaces() {
        let mut list = ListNode::new("numbers");
        for _ in 0..20 {
            list.push(real("1.0"));
        }
        assert_eq!(list.format(), format!("{}1.0", "1.0 ".repeat(19)));

        let mut list = ListNode::new("numbers");
        list.push(padded_real("1.0", "  "));
        list.push(real("2.0"));
        assert_eq!(list.format(), "1.0  2.0");
    }

    #[test]
    fn list_indexing_spans_shortcut_members() {
        let one = ValueNode::new("1", ValueType::Integer).unwrap();
        let shortcut =
            ShortcutNode::expand("2r", None, Some(&one), ValueType::Integer).unwrap();
        let mut list = ListNode::new("numbers");
        list.push(one);
        list.push_shortcut(shortcut);

        assert_eq!(list.len(), 3);
        assert_eq!(list.get(0).unwrap().as_int().unwrap(), 1);
        assert_eq!(list.get(2).unwrap().as_int().unwrap(), 1);
        assert_eq!(list.get(-1).unwrap().as_int().unwrap(), 1);
        assert_eq!(list.get(3).unwrap_err().kind(), ErrorKind::Lookup);
        assert_eq!(list.get(-4).unwrap_err().kind(), ErrorKind::Lookup);
    }

    #[test]
    fn list_equality_sees_expanded_values() {
        let one = ValueNode::new("1", ValueType::Integer).unwrap();
        let shortcut =
            ShortcutNode::expand("2r", None, Some(&one), ValueType::Integer).unwrap();
        let mut compressed = ListNode::new("numbers");
        compressed.push(one);
        compressed.push_shortcut(shortcut);

        let mut spelled_out = ListNode::new("numbers");
        for _ in 0..3 {
            spelled_out.push(ValueNode::new("1", ValueType::Integer).unwrap());
        }
        assert_eq!(compressed, spelled_out);

        let ones: Vec<ValueNode> = (0..3)
            .map(|_| ValueNode::new("1", ValueType::Integer).unwrap())
            .collect();
        assert!(compressed == ones[..]);

        spelled_out.get_mut(2).unwrap().set_int(2).unwrap();
        assert_ne!(compressed, spelled_out);
    }

    #[test]
    fn lists_keep_jumps_distinct_from_empty_slots() {
        let mut with_jump = ListNode::new("numbers");
        with_jump.push(ValueNode::jump(ValueType::Real));
        let mut with_empty = ListNode::new("numbers");
        with_empty.push(ValueNode::empty(ValueType::Real));
        assert_ne!(with_jump, with_empty);
    }

    #[test]
    fn update_keeps_matching_shortcuts_collapsed() {
        let one = padded_real("1", " ");
        let shortcut =
            ShortcutNode::expand("2r", None, Some(&one), ValueType::Real).unwrap();
        let mut list = ListNode::new("numbers");
        list.push(one);
        list.push_shortcut(shortcut);
        assert_eq!(list.format(), "1 2r");

        list.update_with_new_values(&[
            Value::Real(1.0),
            Value::Real(1.0),
            Value::Real(1.0),
        ])
        .unwrap();
        assert_eq!(list.format(), "1 2r");
    }

    #[test]
    fn update_explodes_changed_shortcuts() {
        let one = padded_real("1", " ");
        let shortcut =
            ShortcutNode::expand("2r", None, Some(&one), ValueType::Real).unwrap();
        let mut list = ListNode::new("numbers");
        list.push(one);
        list.push_shortcut(shortcut);

        list.update_with_new_values(&[
            Value::Real(1.0),
            Value::Real(1.0),
            Value::Real(2.0),
        ])
        .unwrap();
        assert_eq!(list.format(), "1 1.0 2.0");
    }

    #[test]
    fn update_appends_and_truncates() {
        let one = padded_real("1", " ");
        let shortcut =
            ShortcutNode::expand("2r", None, Some(&one), ValueType::Real).unwrap();
        let mut list = ListNode::new("numbers");
        list.push(one.clone());
        list.push_shortcut(shortcut.clone());

        list.update_with_new_values(&[
            Value::Real(1.0),
            Value::Real(1.0),
            Value::Real(1.0),
            Value::Real(5.0),
        ])
        .unwrap();
        assert_eq!(list.format(), "1 2r 5.0");

        let mut list = ListNode::new("numbers");
        list.push(one);
        list.push_shortcut(shortcut);
        list.update_with_new_values(&[Value::Real(1.0), Value::Real(1.0)])
            .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.format(), "1 1.0");
    }

    #[test]
    fn list_trailing_comment_lives_on_the_last_element() {
        let mut list = ListNode::new("numbers");
        for _ in 0..9 {
            list.push(padded_real("1.0", " "));
        }
        let mut last = real("1.0");
        last.set_padding(PaddingNode::comment("$ hi").unwrap());
        list.push(last);
        let before = list.format();

        assert_eq!(list.get_trailing_comment().unwrap().len(), 1);
        list.delete_trailing_comment();
        assert!(list.get_trailing_comment().is_none());
        assert_eq!(list.format(), before.strip_suffix("$ hi").unwrap());

        let mut empty = ListNode::new("numbers");
        assert!(empty.get_trailing_comment().is_none());
        empty.delete_trailing_comment();
    }

    #[test]
    fn particle_nodes_preserve_case_until_edited() {
        let parts = ParticleNode::parse(":n,p,e").unwrap();
        assert_eq!(
            parts.particles(),
            [Particle::Neutron, Particle::Photon, Particle::Electron]
        );
        assert_eq!(parts.format(), ":n,p,e");

        let parts = ParticleNode::parse("N,P,E").unwrap();
        assert_eq!(parts.format(), ":N,P,E");

        let err = ParticleNode::parse(":n,w").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn particle_edits_emit_canonical_order() {
        let mut parts = ParticleNode::parse("N,P,E").unwrap();
        parts.add(Particle::Triton);
        assert!(parts.contains(Particle::Triton));
        assert_eq!(parts.format(), ":n,p,e,t");

        parts.remove(Particle::Neutron).unwrap();
        assert_eq!(parts.format(), ":p,e,t");
        let err = parts.remove(Particle::Neutron).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);

        // re-adding an already present particle is not an edit
        let mut parts = ParticleNode::parse("N,P").unwrap();
        parts.add(Particle::Neutron);
        assert_eq!(parts.format(), ":N,P");
    }

    #[test]
    fn classifier_parses_its_fields() {
        let classifier = ClassifierNode::parse("kcode").unwrap();
        assert_eq!(classifier.prefix(), "kcode");
        assert!(classifier.number().is_none());
        assert!(classifier.modifier().is_none());

        let classifier = ClassifierNode::parse("f4").unwrap();
        assert_eq!(classifier.prefix(), "f");
        assert_eq!(classifier.number().unwrap().as_int().unwrap(), 4);

        let classifier = ClassifierNode::parse("*tr5").unwrap();
        assert_eq!(classifier.modifier(), Some('*'));
        assert_eq!(classifier.prefix(), "tr");
        assert_eq!(classifier.format(), "*tr5");

        for bad in ["f4m", "m-300", "300", "*", ""] {
            assert!(ClassifierNode::parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn classifier_renumber_keeps_zero_padding() {
        let mut classifier = ClassifierNode::parse("f0004").unwrap();
        classifier.number_mut().unwrap().set_int(12).unwrap();
        assert_eq!(classifier.format(), "f0012");
    }

    #[test]
    fn parameters_key_by_uppercased_name() {
        let mut vol = ClassifierNode::parse("vol").unwrap();
        vol.set_padding(PaddingNode::new(" "));
        let mut eq = ValueNode::new("=", ValueType::Text).unwrap();
        eq.set_padding(PaddingNode::new(" "));
        let mut data = ListNode::new("data");
        data.push(padded_real("1.5", " "));
        let mut parameters = ParametersNode::new();
        parameters.insert(ParameterEntry::new(vol, eq, data));

        let mut imp = ClassifierNode::parse("imp").unwrap();
        imp.set_particles(ParticleNode::parse(":n").unwrap());
        let eq = ValueNode::new("=", ValueType::Text).unwrap();
        let mut data = ListNode::new("data");
        data.push(ValueNode::new("2", ValueType::Integer).unwrap());
        parameters.insert(ParameterEntry::new(imp, eq, data));

        assert_eq!(parameters.format(), "vol = 1.5 imp:n=2");
        assert!(parameters.contains("VOL"));
        assert!(parameters.contains("vol"));
        assert!(parameters.contains("imp:n"));
        assert_eq!(parameters.len(), 2);

        let entry = parameters.get_mut("vol").unwrap();
        entry.data_mut().get_mut(0).unwrap().set_real(2.5).unwrap();
        assert_eq!(parameters.format(), "vol = 2.5 imp:n=2");
    }
}
