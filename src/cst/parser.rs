//! Recursive-descent parsers for the three card families
//!
//! Each parser turns one logical card (continuation lines included) into
//! a [`SyntaxNode`] whose children hold every byte of the input. The
//! grammar decisions live here; the token shapes come from
//! [`lex_card`](crate::cst::lexer::lex_card).

use tracing::{debug, trace};

use crate::cst::geometry::{GeometryOperator, GeometryTree};
use crate::cst::lexer::{CstToken, TokenKind, lex_card};
use crate::cst::nodes::{
    ClassifierNode, ListNode, ParameterEntry, ParametersNode, ParticleNode, SyntaxNode,
};
use crate::cst::shortcut::{ShortcutKind, ShortcutNode};
use crate::cst::trivia::{CommentNode, PaddingFragment, PaddingNode};
use crate::cst::value::{ValueNode, ValueType};
use crate::error::KermaError;
use crate::result::Result;

/// Parse one cell card.
pub fn parse_cell(text: &str) -> Result<SyntaxNode> {
    Parser::new(text, "cell card").parse_cell_card()
}

/// Parse one surface card.
pub fn parse_surface(text: &str) -> Result<SyntaxNode> {
    Parser::new(text, "surface card").parse_surface_card()
}

/// Parse one data card.
pub fn parse_data(text: &str) -> Result<SyntaxNode> {
    Parser::new(text, "data card").parse_data_card()
}

struct Parser {
    tokens: Vec<CstToken>,
    pos: usize,
    context: &'static str,
}

impl Parser {
    fn new(text: &str, context: &'static str) -> Self {
        Self {
            tokens: lex_card(text),
            pos: 0,
            context,
        }
    }

    fn peek(&self) -> &CstToken {
        &self.tokens[self.pos]
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn at_eof(&self) -> bool {
        self.at(TokenKind::Eof)
    }

    fn bump(&mut self) -> CstToken {
        let token = self.tokens[self.pos].clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn describe_here(&self) -> String {
        match self.peek().kind {
            TokenKind::Eof => "end of card".to_string(),
            _ => format!("{:?}", self.peek().text),
        }
    }

    /// Collect the trivia run at the cursor into one padding node.
    fn take_padding(&mut self) -> Result<Option<PaddingNode>> {
        let mut padding = PaddingNode::default();
        loop {
            match self.peek().kind {
                TokenKind::Whitespace | TokenKind::Newline => {
                    let text = self.bump().text;
                    padding.append_text(&text);
                }
                TokenKind::DollarComment | TokenKind::LineComment => {
                    let text = self.bump().text;
                    padding.append_comment(CommentNode::new(text)?);
                }
                _ => break,
            }
        }
        Ok((!padding.is_empty()).then_some(padding))
    }

    fn parse_value(&mut self, value_type: ValueType, what: &str) -> Result<ValueNode> {
        if !self.at(TokenKind::Word) {
            return Err(KermaError::malformed(
                self.context,
                format!("expected {what}, found {}", self.describe_here()),
            ));
        }
        let word = self.bump().text;
        let mut node = ValueNode::new(&word, value_type)?;
        if let Some(padding) = self.take_padding()? {
            node.set_padding(padding);
        }
        Ok(node)
    }

    fn expect_eof(&self) -> Result<()> {
        if self.at_eof() {
            Ok(())
        } else {
            Err(KermaError::malformed(
                self.context,
                format!("unexpected trailing text {}", self.describe_here()),
            ))
        }
    }

    fn parse_cell_card(&mut self) -> Result<SyntaxNode> {
        debug!(context = self.context, "parsing card");
        let mut tree = SyntaxNode::new("cell");
        if let Some(padding) = self.take_padding()? {
            tree.insert("start_pad", padding);
        }
        let number = self.parse_value(ValueType::Integer, "cell number")?;
        if self.at(TokenKind::Word) && self.peek().text.eq_ignore_ascii_case("like") {
            return Err(KermaError::unsupported("LIKE n BUT cell form"));
        }
        let material_number = self.parse_value(ValueType::Integer, "material number")?;
        let void = material_number.as_int()? == 0;
        let mut material = SyntaxNode::new("material");
        material.insert("number", material_number);
        if !void {
            let mut density = self.parse_value(ValueType::Real, "cell density")?;
            density.make_negatable_real();
            material.insert("density", density);
        }
        tree.insert("number", number);
        tree.insert("material", material);
        tree.insert("geometry", self.parse_union_expr()?);
        if !self.at_eof() {
            tree.insert("parameters", self.parse_parameters()?);
        }
        self.expect_eof()?;
        debug!(context = self.context, "parsed card");
        Ok(tree)
    }

    fn parse_surface_card(&mut self) -> Result<SyntaxNode> {
        debug!(context = self.context, "parsing card");
        let mut tree = SyntaxNode::new("surface");
        if let Some(padding) = self.take_padding()? {
            tree.insert("start_pad", padding);
        }
        if !self.at(TokenKind::Word) {
            return Err(KermaError::malformed(
                self.context,
                format!("expected surface number, found {}", self.describe_here()),
            ));
        }
        let word = self.bump().text;
        let (modifier, number_text) = split_surface_modifier(&word);
        if let Some(glyph) = modifier {
            tree.insert("modifier", ValueNode::new(glyph, ValueType::Text)?);
        }
        let mut number = ValueNode::new(number_text, ValueType::Integer)?;
        if let Some(padding) = self.take_padding()? {
            number.set_padding(padding);
        }
        tree.insert("number", number);
        // an integer between the number and the mnemonic points at a
        // transform (positive) or a periodic surface (negative)
        if self.at(TokenKind::Word) && integer_shaped(&self.peek().text) {
            tree.insert(
                "pointer",
                self.parse_value(ValueType::Integer, "surface pointer")?,
            );
        }
        tree.insert("type", self.parse_value(ValueType::Text, "surface mnemonic")?);
        tree.insert("data", self.parse_list("data", ValueType::Real, false)?);
        self.expect_eof()?;
        debug!(context = self.context, "parsed card");
        Ok(tree)
    }

    fn parse_data_card(&mut self) -> Result<SyntaxNode> {
        debug!(context = self.context, "parsing card");
        let mut tree = SyntaxNode::new("data");
        if let Some(padding) = self.take_padding()? {
            tree.insert("start_pad", padding);
        }
        if self.at(TokenKind::Pound) {
            return Err(KermaError::unsupported("vertical format data card"));
        }
        if !self.at(TokenKind::Word) {
            return Err(KermaError::malformed(
                self.context,
                format!("expected data card name, found {}", self.describe_here()),
            ));
        }
        let word = self.bump().text;
        let mut classifier = ClassifierNode::parse(&word)?;
        if self.at(TokenKind::Designator) {
            let designator = self.bump().text;
            classifier.set_particles(ParticleNode::parse(&designator)?);
        }
        if let Some(padding) = self.take_padding()? {
            classifier.set_padding(padding);
        }
        tree.insert("classifier", classifier);
        tree.insert("data", self.parse_list("data", ValueType::Real, true)?);
        if !self.at_eof() && self.parameter_key_ahead() {
            tree.insert("parameters", self.parse_parameters()?);
        }
        self.expect_eof()?;
        debug!(context = self.context, "parsed card");
        Ok(tree)
    }

    /// A run of values and shortcut tokens.
    ///
    /// `tolerate_text` keeps words that are not numbers as text values,
    /// which data cards need (`mode n p`, nuclide identifiers) and
    /// surface cards must reject.
    fn parse_list(
        &mut self,
        name: &str,
        value_type: ValueType,
        tolerate_text: bool,
    ) -> Result<ListNode> {
        let mut list = ListNode::new(name);
        let mut prev: Option<ValueNode> = None;
        while self.at(TokenKind::Word) && !self.parameter_key_ahead() {
            self.parse_list_step(&mut list, &mut prev, value_type, tolerate_text)?;
        }
        Ok(list)
    }

    fn parse_list_step(
        &mut self,
        list: &mut ListNode,
        prev: &mut Option<ValueNode>,
        value_type: ValueType,
        tolerate_text: bool,
    ) -> Result<()> {
        let word = self.bump().text;
        let padding = self.take_padding()?;
        match ShortcutKind::classify(&word) {
            Some(ShortcutKind::Interpolate | ShortcutKind::LogInterpolate) => {
                if !self.at(TokenKind::Word) {
                    return Err(KermaError::malformed(
                        self.context,
                        format!("interpolation shortcut {word} has no end value"),
                    ));
                }
                let end_word = self.bump().text;
                let end_padding = self.take_padding()?;
                let shortcut = ShortcutNode::expand_interpolation(
                    &word,
                    padding,
                    &end_word,
                    end_padding,
                    prev.as_ref(),
                    value_type,
                )?;
                trace!(token = %word, expanded = shortcut.len(), "expanded shortcut run");
                *prev = shortcut.values().last().cloned();
                list.push_shortcut(shortcut);
            }
            Some(_) => {
                let shortcut = ShortcutNode::expand(&word, padding, prev.as_ref(), value_type)?;
                trace!(token = %word, expanded = shortcut.len(), "expanded shortcut run");
                *prev = shortcut.values().last().cloned();
                list.push_shortcut(shortcut);
            }
            None => {
                let mut node = match ValueNode::new(&word, value_type) {
                    Ok(node) => node,
                    Err(_) if tolerate_text && value_type == ValueType::Real => {
                        ValueNode::new(&word, ValueType::Text)?
                    }
                    Err(err) => return Err(err),
                };
                if let Some(padding) = padding {
                    node.set_padding(padding);
                }
                *prev = Some(node.clone());
                list.push(node);
            }
        }
        Ok(())
    }

    /// `Word [Designator] trivia* '='` means a parameter run begins.
    fn parameter_key_ahead(&self) -> bool {
        let mut i = self.pos;
        if self.tokens[i].kind != TokenKind::Word {
            return false;
        }
        i += 1;
        if self.tokens[i].kind == TokenKind::Designator {
            i += 1;
        }
        while self.tokens[i].kind.is_trivia() {
            i += 1;
        }
        self.tokens[i].kind == TokenKind::Equals
    }

    fn parse_parameters(&mut self) -> Result<ParametersNode> {
        let mut parameters = ParametersNode::new();
        while !self.at_eof() {
            let entry = self.parse_parameter_entry()?;
            parameters.insert(entry);
        }
        Ok(parameters)
    }

    fn parse_parameter_entry(&mut self) -> Result<ParameterEntry> {
        if !self.at(TokenKind::Word) {
            return Err(KermaError::malformed(
                self.context,
                format!("expected parameter name, found {}", self.describe_here()),
            ));
        }
        let word = self.bump().text;
        let mut classifier = ClassifierNode::parse(&word)?;
        if self.at(TokenKind::Designator) {
            let designator = self.bump().text;
            classifier.set_particles(ParticleNode::parse(&designator)?);
        }
        if let Some(padding) = self.take_padding()? {
            classifier.set_padding(padding);
        }
        if !self.at(TokenKind::Equals) {
            return Err(KermaError::malformed(
                self.context,
                format!("parameter {word} has no value"),
            ));
        }
        self.bump();
        let mut separator = ValueNode::new("=", ValueType::Text)?;
        if let Some(padding) = self.take_padding()? {
            separator.set_padding(padding);
        }
        let data = self.parse_list("data", ValueType::Real, true)?;
        if data.is_empty() {
            return Err(KermaError::malformed(
                self.context,
                format!("parameter {word} has no value"),
            ));
        }
        Ok(ParameterEntry::new(classifier, separator, data))
    }

    fn parse_union_expr(&mut self) -> Result<GeometryTree> {
        let mut left = self.parse_intersection_term()?;
        while self.at(TokenKind::Colon) {
            self.bump();
            let mut slot = left.take_trailing_padding().unwrap_or_default();
            slot.push_fragment(PaddingFragment::Text(":".to_string()));
            if let Some(after) = self.take_padding()? {
                slot.fragments_mut().extend(after.into_fragments());
            }
            let right = self.parse_intersection_term()?;
            left = GeometryTree::operation(GeometryOperator::Union, slot, left, Some(right));
        }
        Ok(left)
    }

    fn parse_intersection_term(&mut self) -> Result<GeometryTree> {
        let mut left = self.parse_geometry_factor()?;
        while self.at_geometry_factor() {
            let slot = left.take_trailing_padding().unwrap_or_default();
            let right = self.parse_geometry_factor()?;
            left = GeometryTree::operation(GeometryOperator::Intersection, slot, left, Some(right));
        }
        Ok(left)
    }

    fn at_geometry_factor(&self) -> bool {
        match self.peek().kind {
            TokenKind::LeftParen | TokenKind::Pound => true,
            TokenKind::Word => integer_shaped(&self.peek().text),
            _ => false,
        }
    }

    fn parse_geometry_factor(&mut self) -> Result<GeometryTree> {
        match self.peek().kind {
            TokenKind::Pound => {
                self.bump();
                let mut slot = PaddingNode::default();
                slot.push_fragment(PaddingFragment::Text("#".to_string()));
                if let Some(after) = self.take_padding()? {
                    slot.fragments_mut().extend(after.into_fragments());
                }
                let operand = self.parse_geometry_factor()?;
                Ok(GeometryTree::operation(
                    GeometryOperator::Complement,
                    slot,
                    operand,
                    None,
                ))
            }
            TokenKind::LeftParen => {
                self.bump();
                let mut open = ValueNode::new("(", ValueType::Text)?;
                if let Some(padding) = self.take_padding()? {
                    open.set_padding(padding);
                }
                let inner = self.parse_union_expr()?;
                if !self.at(TokenKind::RightParen) {
                    return Err(KermaError::malformed(
                        self.context,
                        format!("unclosed parenthesis, found {}", self.describe_here()),
                    ));
                }
                self.bump();
                let mut close = ValueNode::new(")", ValueType::Text)?;
                if let Some(padding) = self.take_padding()? {
                    close.set_padding(padding);
                }
                Ok(GeometryTree::group(open, inner, close))
            }
            TokenKind::Word if integer_shaped(&self.peek().text) => {
                let node = self.parse_value(ValueType::Integer, "geometry term")?;
                Ok(GeometryTree::leaf(node))
            }
            _ => Err(KermaError::malformed(
                self.context,
                format!("expected geometry term, found {}", self.describe_here()),
            )),
        }
    }
}

fn integer_shaped(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn split_surface_modifier(word: &str) -> (Option<&'static str>, &str) {
    match word.as_bytes().first() {
        Some(b'*') => (Some("*"), &word[1..]),
        Some(b'+') => (Some("+"), &word[1..]),
        _ => (None, word),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::nodes::CstNode;
    use crate::cst::value::Value;
    use crate::error::ErrorKind;

    fn geometry_numbers(tree: &SyntaxNode) -> Vec<i64> {
        let Some(CstNode::Geometry(geometry)) = tree.get("geometry") else {
            panic!("no geometry");
        };
        geometry
            .leaves()
            .iter()
            .map(|leaf| leaf.as_int().unwrap())
            .collect()
    }

    #[test]
    fn cell_cards_round_trip() {
        for input in [
            "1 0 -2",
            "2 3 -7.8 1 -2 imp:n=1 vol=2.5 $ fuel",
            "21  0  #(1 2 3)",
            "99 0 1 2:( 3 4 5)",
            "3 0  -1\n     imp:n=1",
        ] {
            let tree = parse_cell(input).unwrap();
            assert_eq!(tree.format(), input, "{input}");
        }
    }

    #[test]
    fn cell_trees_expose_their_fields() {
        let tree = parse_cell("2 3 -7.8 1 -2 imp:n=1").unwrap();
        assert_eq!(tree.get_value("number").unwrap(), Some(&Value::Integer(2)));
        let material = tree.get("material").unwrap().as_syntax().unwrap();
        assert_eq!(
            material.get_value("number").unwrap(),
            Some(&Value::Integer(3))
        );
        let density = material.get("density").unwrap().as_value().unwrap();
        assert!(density.is_negatable_real());
        assert_eq!(density.as_real().unwrap(), 7.8);
        assert_eq!(density.is_negative(), Some(true));
        assert_eq!(geometry_numbers(&tree), [1, -2]);
        let parameters = tree.get("parameters").unwrap().as_parameters().unwrap();
        assert!(parameters.contains("imp:n"));
    }

    #[test]
    fn void_cells_have_no_density() {
        let tree = parse_cell("1 0 -2").unwrap();
        let material = tree.get("material").unwrap().as_syntax().unwrap();
        assert_eq!(
            material.get_value("number").unwrap(),
            Some(&Value::Integer(0))
        );
        assert!(!material.contains("density"));
    }

    #[test]
    fn complement_and_union_geometry() {
        let tree = parse_cell("21 0 #(1 2 3)").unwrap();
        assert_eq!(geometry_numbers(&tree), [1, 2, 3]);

        let tree = parse_cell("99 0 1 2:( 3 4 5)").unwrap();
        assert_eq!(geometry_numbers(&tree), [1, 2, 3, 4, 5]);

        let tree = parse_cell("5 0 #5").unwrap();
        assert_eq!(geometry_numbers(&tree), [5]);
    }

    #[test]
    fn like_but_cells_are_recognized_but_unsupported() {
        let err = parse_cell("2 like 1 but imp:n=2").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
    }

    #[test]
    fn surface_cards_round_trip() {
        for input in ["1 SO 5.0", "*10 pz 3.1", "5 -1 so 4", "2 rpp -1 1 -1 1 -1 1"] {
            let tree = parse_surface(input).unwrap();
            assert_eq!(tree.format(), input, "{input}");
        }
    }

    #[test]
    fn surface_trees_expose_their_fields() {
        let tree = parse_surface("*10 pz 3.1").unwrap();
        let modifier = tree.get("modifier").unwrap().as_value().unwrap();
        assert_eq!(modifier.as_text().unwrap(), "*");
        assert_eq!(tree.get_value("number").unwrap(), Some(&Value::Integer(10)));
        let mnemonic = tree.get("type").unwrap().as_value().unwrap();
        assert_eq!(mnemonic.as_text().unwrap(), "pz");

        let tree = parse_surface("5 -1 so 4").unwrap();
        assert_eq!(
            tree.get_value("pointer").unwrap(),
            Some(&Value::Integer(-1))
        );
    }

    #[test]
    fn surface_data_must_be_numeric() {
        let err = parse_surface("1 so radius").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn data_cards_round_trip() {
        for input in [
            "kcode 1.0 1 50 250",
            "imp:n,p 1 1 0",
            "m1 1001.80c 2 8016.80c 1",
            "*tr5 0 0 1",
            "mode n p",
            "si1 1 2i 4",
            "f4:n 1 2 3",
        ] {
            let tree = parse_data(input).unwrap();
            assert_eq!(tree.format(), input, "{input}");
        }
    }

    #[test]
    fn data_trees_expose_their_fields() {
        let tree = parse_data("imp:n,p 1 1 0").unwrap();
        let classifier = tree.get("classifier").unwrap().as_classifier().unwrap();
        assert_eq!(classifier.prefix(), "imp");
        assert_eq!(classifier.particles().unwrap().len(), 2);
        let data = tree.get("data").unwrap().as_list().unwrap();
        assert_eq!(data.len(), 3);

        let tree = parse_data("si1 1 2i 4").unwrap();
        let data = tree.get("data").unwrap().as_list().unwrap();
        let values: Vec<f64> = data
            .values()
            .map(|node| node.as_real().unwrap())
            .collect();
        assert_eq!(values, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn vertical_format_is_recognized_but_unsupported() {
        let err = parse_data("# f4 f14\n 1 2").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        let err = parse_surface("1 so 4 (").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);

        let err = parse_cell("1 0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn data_parameters_after_values() {
        let input = "sdef erg=14.1 pos=0 0 0";
        let tree = parse_data(input).unwrap();
        assert_eq!(tree.format(), input);
        let parameters = tree.get("parameters").unwrap().as_parameters().unwrap();
        assert!(parameters.contains("erg"));
        let pos = parameters.get("pos").unwrap();
        assert_eq!(pos.data().len(), 3);
    }
}
