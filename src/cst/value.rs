//! Typed scalar nodes that remember how their value was written
//!
//! A [`ValueNode`] carries a parsed value next to the exact token it
//! came from. Until the value is reassigned, formatting replays the
//! token byte-for-byte. Once it changes, the node re-renders the new
//! value under the conventions reverse-engineered from the original
//! text: sign column, zero padding, decimal precision, exponent shape,
//! and how much room the token plus its trailing blanks occupied.

use crate::cst::trivia::{CommentNode, PaddingFragment, PaddingNode};
use crate::error::KermaError;
use crate::input::Jump;
use crate::result::Result;

/// Relative tolerance for comparing real values, as in
/// "two decks that agree to ten digits are the same deck".
const REAL_EQ_RTOL: f64 = 1e-9;

/// The declared type of a value slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Integer,
    Real,
    Text,
}

/// A parsed scalar
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Real(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
        }
    }
}

/// An enumeration a value node can be bound to, such as a surface
/// mnemonic or lattice shape. Parsing is case-insensitive where the
/// deck grammar is.
pub trait DeckEnum: Sized {
    /// Interpret the raw scalar stored in a node.
    fn from_value(value: &Value) -> Result<Self>;

    /// The scalar written back into a node for this variant.
    fn to_value(&self) -> Value;
}

/// Sign column captured from the original token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignStyle {
    /// No sign column; a negative value grows the token by one
    Unsigned,
    /// Token carried `-`; the column stays, blank for non-negative
    Minus,
    /// Token carried an explicit `+`, kept for non-negative values
    Plus,
}

/// Numeric shape captured from the original token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberForm {
    /// Digits only, zero-padded to `width`
    IntLike { width: usize },
    /// Decimal point with `precision` digits after it
    Plain { precision: usize },
    /// Scientific form. `marker` is the exponent character, or `None`
    /// for the bare-sign MCNP form (`1.602-19`). The exponent is
    /// zero-padded to `exp_width` and always signed on output.
    Exponent {
        marker: Option<char>,
        exp_width: usize,
        precision: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum ValueToken {
    Text(String),
    Jump,
}

/// A scalar slot in the tree: original token, parsed value, trailing
/// padding, and the formatting conventions tying them together.
#[derive(Debug, Clone)]
pub struct ValueNode {
    token: Option<ValueToken>,
    value_type: ValueType,
    value: Option<Value>,
    padding: Option<PaddingNode>,
    sign: SignStyle,
    form: Option<NumberForm>,
    negatable_identifier: bool,
    negatable_real: bool,
    is_negative: Option<bool>,
    switch_to_upper: bool,
    value_changed: bool,
}

impl ValueNode {
    /// Parse a token into a node of the given type.
    pub fn new(token: &str, value_type: ValueType) -> Result<Self> {
        let value = parse_token(token, value_type)?;
        let (sign, form) = capture_convention(token, value_type);
        Ok(Self {
            token: Some(ValueToken::Text(token.to_string())),
            value_type,
            value: Some(value),
            padding: None,
            sign,
            form,
            negatable_identifier: false,
            negatable_real: false,
            is_negative: None,
            switch_to_upper: false,
            value_changed: false,
        })
    }

    pub fn with_padding(token: &str, value_type: ValueType, padding: PaddingNode) -> Result<Self> {
        let mut node = Self::new(token, value_type)?;
        node.padding = Some(padding);
        Ok(node)
    }

    /// A slot with no token and no value.
    pub fn empty(value_type: ValueType) -> Self {
        Self {
            token: None,
            value_type,
            value: None,
            padding: None,
            sign: SignStyle::Unsigned,
            form: None,
            negatable_identifier: false,
            negatable_real: false,
            is_negative: None,
            switch_to_upper: false,
            value_changed: false,
        }
    }

    /// A jump slot: no value, but deliberately so.
    pub fn jump(value_type: ValueType) -> Self {
        let mut node = Self::empty(value_type);
        node.token = Some(ValueToken::Jump);
        node
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// The original token text, if the node came from one.
    pub fn token(&self) -> Option<&str> {
        match &self.token {
            Some(ValueToken::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn is_jump(&self) -> bool {
        matches!(self.token, Some(ValueToken::Jump))
    }

    pub fn padding(&self) -> Option<&PaddingNode> {
        self.padding.as_ref()
    }

    pub fn padding_mut(&mut self) -> Option<&mut PaddingNode> {
        self.padding.as_mut()
    }

    pub fn set_padding(&mut self, padding: PaddingNode) {
        self.padding = Some(padding);
    }

    pub fn take_padding(&mut self) -> Option<PaddingNode> {
        self.padding.take()
    }

    /// Whether the value has been reassigned since parse.
    pub fn value_changed(&self) -> bool {
        self.value_changed
    }

    pub fn as_int(&self) -> Result<i64> {
        match &self.value {
            Some(Value::Integer(v)) => Ok(*v),
            Some(other) => Err(KermaError::type_mismatch("integer", other.type_name())),
            None => Err(KermaError::type_mismatch("integer", "empty value")),
        }
    }

    pub fn as_real(&self) -> Result<f64> {
        match &self.value {
            Some(value) => value
                .as_real()
                .ok_or_else(|| KermaError::type_mismatch("real", value.type_name())),
            None => Err(KermaError::type_mismatch("real", "empty value")),
        }
    }

    pub fn as_text(&self) -> Result<&str> {
        match &self.value {
            Some(Value::Text(s)) => Ok(s),
            Some(other) => Err(KermaError::type_mismatch("text", other.type_name())),
            None => Err(KermaError::type_mismatch("text", "empty value")),
        }
    }

    /// Read the value through an enum binding.
    pub fn value_as<E: DeckEnum>(&self) -> Result<E> {
        match &self.value {
            Some(value) => E::from_value(value),
            None => Err(KermaError::type_mismatch("enum value", "empty value")),
        }
    }

    /// Assign a new value, keeping the node's declared type.
    ///
    /// Integers widen into real slots and integral reals narrow into
    /// integer slots; anything else is a type mismatch. Assigning a
    /// value equal to the current one leaves the node pristine.
    pub fn set_value(&mut self, value: Value) -> Result<()> {
        let coerced = match (self.value_type, value) {
            (ValueType::Integer, Value::Integer(v)) => Value::Integer(v),
            (ValueType::Integer, Value::Real(v)) if v.fract() == 0.0 => Value::Integer(v as i64),
            (ValueType::Real, Value::Integer(v)) => Value::Real(v as f64),
            (ValueType::Real, Value::Real(v)) => Value::Real(v),
            (ValueType::Text, Value::Text(s)) => Value::Text(s),
            (_, other) => {
                return Err(KermaError::type_mismatch(
                    type_name(self.value_type),
                    other.type_name(),
                ));
            }
        };
        let stored = if self.is_negatable() {
            let (magnitude, negative) = split_sign(coerced);
            if self.is_negative != Some(negative) {
                self.is_negative = Some(negative);
                self.value_changed = true;
            }
            magnitude
        } else {
            coerced
        };
        if self.value.as_ref() != Some(&stored) {
            self.value = Some(stored);
            self.value_changed = true;
        }
        Ok(())
    }

    pub fn set_int(&mut self, value: i64) -> Result<()> {
        self.set_value(Value::Integer(value))
    }

    pub fn set_real(&mut self, value: f64) -> Result<()> {
        self.set_value(Value::Real(value))
    }

    pub fn set_text(&mut self, value: impl Into<String>) -> Result<()> {
        self.set_value(Value::Text(value.into()))
    }

    /// Write an enum variant's scalar into the node.
    pub fn set_enum<E: DeckEnum>(&mut self, value: E) -> Result<()> {
        self.set_value(value.to_value())
    }

    /// Clear the value; the slot formats to nothing.
    pub fn set_none(&mut self) {
        if self.value.is_some() {
            self.value = None;
            self.value_changed = true;
        }
    }

    /// Narrow a real slot whose value is integral into an integer slot.
    pub fn convert_to_int(&mut self) -> Result<()> {
        match &self.value {
            Some(Value::Real(v)) if v.fract() == 0.0 => {
                self.value = Some(Value::Integer(*v as i64));
            }
            Some(Value::Integer(_)) | None => {}
            Some(other) => {
                return Err(KermaError::type_mismatch("integral value", other.type_name()));
            }
        }
        self.value_type = ValueType::Integer;
        Ok(())
    }

    /// Validate the node against an enum binding.
    ///
    /// `allow_none` accepts an empty slot; `switch_to_upper` makes
    /// re-rendered text values uppercase, for mnemonics the deck writes
    /// either case.
    pub fn convert_to_enum<E: DeckEnum>(
        &mut self,
        allow_none: bool,
        switch_to_upper: bool,
    ) -> Result<()> {
        match &self.value {
            Some(value) => {
                E::from_value(value)?;
            }
            None => {
                if !allow_none {
                    return Err(KermaError::type_mismatch("enum value", "empty value"));
                }
            }
        }
        self.switch_to_upper = switch_to_upper;
        Ok(())
    }

    pub fn is_negatable_identifier(&self) -> bool {
        self.negatable_identifier
    }

    pub fn is_negatable_real(&self) -> bool {
        self.negatable_real
    }

    /// Re-read the node as a sign-separated identifier: the value
    /// becomes a positive integer and the sign moves to
    /// [`Self::is_negative`]. Surface references in geometry work this
    /// way, `-5` meaning the inside of surface 5.
    pub fn make_negatable_identifier(&mut self) {
        self.negatable_identifier = true;
        self.negatable_real = false;
        self.value_type = ValueType::Integer;
        if let Some(value) = self.value.take() {
            let as_int = match value {
                Value::Integer(v) => v,
                Value::Real(v) => v as i64,
                Value::Text(_) => {
                    self.value = Some(value);
                    return;
                }
            };
            self.is_negative = Some(as_int < 0);
            self.value = Some(Value::Integer(as_int.abs()));
        }
    }

    /// Like [`Self::make_negatable_identifier`] for real values:
    /// magnitude in the value, sign carried separately. Densities in
    /// cell cards encode units this way.
    pub fn make_negatable_real(&mut self) {
        self.negatable_real = true;
        self.negatable_identifier = false;
        self.value_type = ValueType::Real;
        if let Some(value) = self.value.take() {
            let as_real = match value.as_real() {
                Some(v) => v,
                None => {
                    self.value = Some(value);
                    return;
                }
            };
            self.is_negative = Some(as_real < 0.0);
            self.value = Some(Value::Real(as_real.abs()));
        }
    }

    fn is_negatable(&self) -> bool {
        self.negatable_identifier || self.negatable_real
    }

    /// The carried sign of a negatable node; `None` when the node is
    /// not negatable or has no value.
    pub fn is_negative(&self) -> Option<bool> {
        self.is_negative
    }

    /// Flip the carried sign. Ignored on nodes that are not negatable.
    pub fn set_is_negative(&mut self, negative: bool) {
        if !self.is_negatable() || self.value.is_none() {
            return;
        }
        if self.is_negative != Some(negative) {
            self.is_negative = Some(negative);
            self.value_changed = true;
        }
    }

    /// All comments in this node's padding.
    pub fn comments(&self) -> Vec<&CommentNode> {
        self.padding.as_ref().map(|p| p.comments()).unwrap_or_default()
    }

    pub fn get_trailing_comment(&self) -> Option<Vec<&CommentNode>> {
        self.padding.as_ref().and_then(|p| p.get_trailing_comment())
    }

    pub fn delete_trailing_comment(&mut self) {
        if let Some(padding) = &mut self.padding {
            padding.delete_trailing_comment();
        }
    }

    /// Render the node: the original token while the value is pristine,
    /// the re-rendered value under captured conventions otherwise.
    pub fn format(&self) -> String {
        if !self.value_changed {
            let mut out = match &self.token {
                Some(ValueToken::Text(text)) => text.clone(),
                Some(ValueToken::Jump) => Jump.to_string(),
                None => String::new(),
            };
            if let Some(padding) = &self.padding {
                out.push_str(&padding.format());
            }
            return out;
        }
        let rendered = self.render_value();
        match &self.padding {
            None => rendered,
            Some(padding) => self.join_with_padding(&rendered, padding),
        }
    }

    fn render_value(&self) -> String {
        let Some(value) = &self.value else {
            return String::new();
        };
        match value {
            Value::Integer(v) => {
                let signed = if self.is_negative == Some(true) { -v } else { *v };
                self.render_int(signed)
            }
            Value::Real(v) => {
                let signed = if self.is_negative == Some(true) { -v } else { *v };
                self.render_real(signed)
            }
            Value::Text(s) => {
                if self.switch_to_upper {
                    s.to_uppercase()
                } else {
                    s.clone()
                }
            }
        }
    }

    fn render_int(&self, value: i64) -> String {
        let sign = self.sign_prefix(value < 0);
        let magnitude = value.unsigned_abs();
        match self.form {
            Some(NumberForm::IntLike { width }) => format!("{sign}{magnitude:0width$}"),
            _ => format!("{sign}{magnitude}"),
        }
    }

    fn render_real(&self, value: f64) -> String {
        let sign = self.sign_prefix(value < 0.0);
        let magnitude = value.abs();
        match self.form {
            Some(NumberForm::IntLike { width }) if magnitude.fract() == 0.0 => {
                format!("{sign}{:0width$}", magnitude as i64)
            }
            Some(NumberForm::IntLike { .. }) => format!("{sign}{magnitude}"),
            Some(NumberForm::Plain { precision }) => format!("{sign}{magnitude:.precision$}"),
            Some(NumberForm::Exponent {
                marker,
                exp_width,
                precision,
            }) => format!("{sign}{}", render_exponent(magnitude, marker, exp_width, precision)),
            None => {
                if magnitude.fract() == 0.0 {
                    format!("{sign}{magnitude:.1}")
                } else {
                    format!("{sign}{magnitude}")
                }
            }
        }
    }

    fn sign_prefix(&self, negative: bool) -> &'static str {
        match (self.sign, negative) {
            (_, true) => "-",
            (SignStyle::Unsigned, false) => "",
            (SignStyle::Minus, false) => " ",
            (SignStyle::Plus, false) => "+",
        }
    }

    /// Splice a re-rendered token in front of the original padding.
    ///
    /// The token and its leading blank run occupied a fixed number of
    /// columns; a longer token eats into that run, down to a single
    /// blank, or down to nothing when a line break follows anyway.
    fn join_with_padding(&self, rendered: &str, padding: &PaddingNode) -> String {
        let token_len = match &self.token {
            Some(ValueToken::Text(text)) => text.chars().count(),
            Some(ValueToken::Jump) => 1,
            None => 0,
        };
        let fragments = padding.fragments();
        let mut leading_frags = 0usize;
        let mut leading_blanks = 0usize;
        for fragment in fragments {
            if let PaddingFragment::Text(text) = fragment {
                if fragment.is_space() {
                    leading_blanks += text.chars().count();
                    leading_frags += 1;
                    continue;
                }
            }
            break;
        }

        let mut out = String::from(rendered);
        let rest = &fragments[leading_frags..];
        if leading_frags > 0 {
            let reserved = token_len + leading_blanks;
            let min_sep = match rest.first() {
                Some(PaddingFragment::Newline(_)) => 0,
                _ => 1,
            };
            let blanks = reserved
                .saturating_sub(rendered.chars().count())
                .max(min_sep);
            for _ in 0..blanks {
                out.push(' ');
            }
        }
        for fragment in rest {
            out.push_str(&fragment.format());
        }
        out
    }
}

impl PartialEq for ValueNode {
    fn eq(&self, other: &Self) -> bool {
        // value-less slots: a jump is deliberate, an empty slot is not,
        // and the two never compare equal
        if self.value.is_none() && other.value.is_none() {
            return self.is_jump() == other.is_jump();
        }
        values_equal(self.value.as_ref(), other.value.as_ref())
    }
}

impl PartialEq<i64> for ValueNode {
    fn eq(&self, other: &i64) -> bool {
        values_equal(self.value.as_ref(), Some(&Value::Integer(*other)))
    }
}

impl PartialEq<f64> for ValueNode {
    fn eq(&self, other: &f64) -> bool {
        values_equal(self.value.as_ref(), Some(&Value::Real(*other)))
    }
}

impl PartialEq<&str> for ValueNode {
    fn eq(&self, other: &&str) -> bool {
        matches!(&self.value, Some(Value::Text(s)) if s == other)
    }
}

pub(crate) fn values_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => match (x, y) {
            (Value::Integer(l), Value::Integer(r)) => l == r,
            (Value::Text(l), Value::Text(r)) => l == r,
            (Value::Text(_), _) | (_, Value::Text(_)) => false,
            (l, r) => match (l.as_real(), r.as_real()) {
                (Some(l), Some(r)) => reals_close(l, r),
                _ => false,
            },
        },
        _ => false,
    }
}

fn reals_close(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    (a - b).abs() <= REAL_EQ_RTOL * a.abs().max(b.abs())
}

fn type_name(value_type: ValueType) -> &'static str {
    match value_type {
        ValueType::Integer => "integer",
        ValueType::Real => "real",
        ValueType::Text => "text",
    }
}

fn split_sign(value: Value) -> (Value, bool) {
    match value {
        Value::Integer(v) => (Value::Integer(v.abs()), v < 0),
        Value::Real(v) => (Value::Real(v.abs()), v < 0.0),
        Value::Text(s) => (Value::Text(s), false),
    }
}

fn parse_token(token: &str, value_type: ValueType) -> Result<Value> {
    match value_type {
        ValueType::Text => Ok(Value::Text(token.to_string())),
        ValueType::Integer => token
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| KermaError::type_mismatch("integer", token)),
        ValueType::Real => parse_mcnp_real(token)
            .map(Value::Real)
            .ok_or_else(|| KermaError::type_mismatch("real", token)),
    }
}

/// Parse a real in any form MCNP writes, including the bare-sign
/// exponent (`1.602-19` meaning 1.602e-19).
pub(crate) fn parse_mcnp_real(token: &str) -> Option<f64> {
    if let Ok(value) = token.parse::<f64>() {
        // std accepts "inf"/"nan" spellings decks never mean
        if token.chars().any(|c| c.is_ascii_digit()) {
            return Some(value);
        }
        return None;
    }
    let rest = token.strip_prefix(['+', '-']).unwrap_or(token);
    let offset = token.len() - rest.len();
    let sign_pos = rest.find(['+', '-'])? + offset;
    if sign_pos == 0 || token[..sign_pos].contains(['e', 'E']) {
        return None;
    }
    let rebuilt = format!("{}e{}", &token[..sign_pos], &token[sign_pos..]);
    rebuilt.parse::<f64>().ok()
}

fn capture_convention(token: &str, value_type: ValueType) -> (SignStyle, Option<NumberForm>) {
    if value_type == ValueType::Text {
        return (SignStyle::Unsigned, None);
    }
    let (sign, rest) = match token.as_bytes().first() {
        Some(b'-') => (SignStyle::Minus, &token[1..]),
        Some(b'+') => (SignStyle::Plus, &token[1..]),
        _ => (SignStyle::Unsigned, token),
    };
    if rest.is_empty() {
        return (sign, None);
    }

    let (mantissa, marker, exponent) = match rest.find(['e', 'E']) {
        Some(pos) if pos > 0 => (
            &rest[..pos],
            rest[pos..].chars().next(),
            Some(&rest[pos + 1..]),
        ),
        _ => match rest[1..].find(['+', '-']) {
            Some(rel) => (&rest[..rel + 1], None, Some(&rest[rel + 1..])),
            None => (rest, None, None),
        },
    };

    let precision = mantissa
        .split_once('.')
        .map(|(_, decimals)| decimals.len());

    let form = match exponent {
        Some(exponent) => {
            let exp_width = exponent.trim_start_matches(['+', '-']).len();
            NumberForm::Exponent {
                marker,
                exp_width,
                precision: precision.unwrap_or(0),
            }
        }
        None => match precision {
            Some(precision) => NumberForm::Plain { precision },
            None => NumberForm::IntLike {
                width: mantissa.len(),
            },
        },
    };
    (sign, Some(form))
}

fn render_exponent(magnitude: f64, marker: Option<char>, exp_width: usize, precision: usize) -> String {
    let rendered = format!("{magnitude:.precision$e}");
    let Some((mantissa, exponent)) = rendered.split_once('e') else {
        return rendered;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let marker = marker.map(String::from).unwrap_or_default();
    let sign = if exponent < 0 { '-' } else { '+' };
    format!(
        "{mantissa}{marker}{sign}{:0exp_width$}",
        exponent.unsigned_abs()
    )
}
