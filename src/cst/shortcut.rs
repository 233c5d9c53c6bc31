//! The compressed numeric grammar used inside value lists
//!
//! Deck lists compress runs of numbers with shortcut tokens: `2R`
//! repeats the previous value, `3M` multiplies it, `2I 10` interpolates
//! toward an end value, `2ILOG` does so geometrically and `2J` skips
//! slots. A [`ShortcutNode`] holds the expanded values next to the
//! original token so an untouched run re-emits verbatim, while a run
//! with any member changed falls back to literal values.

use crate::cst::trivia::{CommentNode, PaddingNode};
use crate::cst::value::{Value, ValueNode, ValueType, parse_mcnp_real};
use crate::error::KermaError;
use crate::result::Result;

/// The shortcut grammar's operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKind {
    /// `nR`: the previous value, n more times
    Repeat,
    /// `nM`: the previous value scaled by n
    Multiply,
    /// `nI end`: n evenly spaced values, then the end value
    Interpolate,
    /// `nILOG end`: n geometrically spaced values, then the end value
    LogInterpolate,
    /// `nJ`: n placeholder slots
    Jump,
}

impl ShortcutKind {
    /// Recognize a word as a shortcut token, case-insensitively.
    ///
    /// Only the shape is checked here; whether the shortcut is legal in
    /// its position is decided during expansion. Words that are plain
    /// numbers, including the bare-sign exponent form, never match.
    pub fn classify(word: &str) -> Option<ShortcutKind> {
        if !word.is_ascii() || word.is_empty() {
            return None;
        }
        let upper = word.to_ascii_uppercase();
        // ILOG and its LOG alias, checked longest-suffix first
        for marker in ["ILOG", "LOG"] {
            if let Some(prefix) = upper.strip_suffix(marker) {
                if prefix.bytes().all(|b| b.is_ascii_digit()) {
                    return Some(ShortcutKind::LogInterpolate);
                }
                return None;
            }
        }
        let (prefix, suffix) = upper.split_at(upper.len() - 1);
        let counted = prefix.bytes().all(|b| b.is_ascii_digit());
        match suffix {
            "R" if counted => Some(ShortcutKind::Repeat),
            "I" if counted => Some(ShortcutKind::Interpolate),
            "J" if counted => Some(ShortcutKind::Jump),
            // the prefix is the factor, not a count; validated on expansion
            "M" => Some(ShortcutKind::Multiply),
            _ => None,
        }
    }

    /// How much of `word` is the count (or factor) ahead of the suffix.
    fn prefix_len(self, word: &str) -> usize {
        match self {
            ShortcutKind::LogInterpolate => {
                if word.len() >= 4 && word[word.len() - 4..].eq_ignore_ascii_case("ILOG") {
                    word.len() - 4
                } else {
                    word.len() - 3
                }
            }
            _ => word.len() - 1,
        }
    }
}

/// A compressed numeric run: the original token plus the values it
/// stands for.
#[derive(Debug, Clone)]
pub struct ShortcutNode {
    kind: ShortcutKind,
    values: Vec<ValueNode>,
    baseline: Vec<Option<Value>>,
    token: String,
    inner_padding: Option<PaddingNode>,
    end_padding: Option<PaddingNode>,
}

impl ShortcutNode {
    /// Expand a self-contained shortcut word: repeat, multiply or jump.
    ///
    /// `prev` is the most recent expanded value in the surrounding
    /// list. An interpolation word is rejected here because it consumes
    /// a following end value; use [`Self::expand_interpolation`].
    pub fn expand(
        word: &str,
        end_padding: Option<PaddingNode>,
        prev: Option<&ValueNode>,
        value_type: ValueType,
    ) -> Result<Self> {
        let kind = Self::require_kind(word)?;
        let prefix = &word[..kind.prefix_len(word)];
        let values = match kind {
            ShortcutKind::Repeat => {
                let count = parse_count(word, prefix)?;
                let prev = require_prev(word, prev)?;
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(synth_from(prev)?);
                }
                values
            }
            ShortcutKind::Multiply => {
                let factor = parse_mcnp_real(prefix).ok_or_else(|| {
                    KermaError::malformed(
                        "shortcut",
                        format!("multiply shortcut {word:?} has no factor"),
                    )
                })?;
                let prev = require_prev(word, prev)?;
                let prev_real = require_real(word, prev)?;
                vec![synth(value_type, prev_real * factor)?]
            }
            ShortcutKind::Jump => {
                let count = parse_count(word, prefix)?;
                vec![ValueNode::jump(value_type); count]
            }
            ShortcutKind::Interpolate | ShortcutKind::LogInterpolate => {
                return Err(KermaError::malformed(
                    "shortcut",
                    format!("interpolation {word:?} has no end value"),
                ));
            }
        };
        let baseline = values.iter().map(|v| v.value().cloned()).collect();
        Ok(Self {
            kind,
            values,
            baseline,
            token: word.to_string(),
            inner_padding: None,
            end_padding,
        })
    }

    /// Expand an interpolation, which consumes the following word as
    /// its end value. `inner_padding` sat between the two words.
    pub fn expand_interpolation(
        word: &str,
        inner_padding: Option<PaddingNode>,
        end_word: &str,
        end_padding: Option<PaddingNode>,
        prev: Option<&ValueNode>,
        value_type: ValueType,
    ) -> Result<Self> {
        let kind = Self::require_kind(word)?;
        if !matches!(
            kind,
            ShortcutKind::Interpolate | ShortcutKind::LogInterpolate
        ) {
            return Err(KermaError::malformed(
                "shortcut",
                format!("{word:?} does not take an end value"),
            ));
        }
        if ShortcutKind::classify(end_word).is_some() {
            return Err(KermaError::malformed(
                "shortcut",
                format!("interpolation {word:?} needs a literal end value, got {end_word:?}"),
            ));
        }
        let prefix = &word[..kind.prefix_len(word)];
        let count = parse_count(word, prefix)?;
        let prev = require_prev(word, prev)?;
        let start = require_real(word, prev)?;
        let end_node = ValueNode::new(end_word, value_type)?;
        let end = end_node.as_real()?;

        let mut values = Vec::with_capacity(count + 1);
        if kind == ShortcutKind::LogInterpolate {
            if start <= 0.0 || end <= 0.0 {
                return Err(KermaError::malformed(
                    "shortcut",
                    format!("log interpolation {word:?} needs positive endpoints"),
                ));
            }
            let (lo, hi) = (start.log10(), end.log10());
            let step = (hi - lo) / (count as f64 + 1.0);
            for k in 1..=count {
                values.push(synth(value_type, 10f64.powf(lo + step * k as f64))?);
            }
        } else {
            let step = (end - start) / (count as f64 + 1.0);
            for k in 1..=count {
                values.push(synth(value_type, start + step * k as f64)?);
            }
        }
        values.push(end_node);
        let baseline = values.iter().map(|v| v.value().cloned()).collect();
        Ok(Self {
            kind,
            values,
            baseline,
            token: word.to_string(),
            inner_padding,
            end_padding,
        })
    }

    fn require_kind(word: &str) -> Result<ShortcutKind> {
        ShortcutKind::classify(word).ok_or_else(|| {
            KermaError::malformed("shortcut", format!("{word:?} is not a shortcut"))
        })
    }

    pub fn kind(&self) -> ShortcutKind {
        self.kind
    }

    /// The expanded values this shortcut stands for.
    pub fn values(&self) -> &[ValueNode] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [ValueNode] {
        &mut self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn end_padding(&self) -> Option<&PaddingNode> {
        self.end_padding.as_ref()
    }

    pub fn end_padding_mut(&mut self) -> Option<&mut PaddingNode> {
        self.end_padding.as_mut()
    }

    pub fn set_end_padding(&mut self, padding: PaddingNode) {
        self.end_padding = Some(padding);
    }

    /// Whether every expanded member still holds its parse-time value.
    pub fn is_pristine(&self) -> bool {
        self.values.len() == self.baseline.len()
            && self
                .values
                .iter()
                .zip(&self.baseline)
                .all(|(node, base)| node.value() == base.as_ref())
    }

    pub fn comments(&self) -> Vec<&CommentNode> {
        let mut out = Vec::new();
        if let Some(padding) = &self.inner_padding {
            out.extend(padding.comments());
        }
        for value in &self.values {
            out.extend(value.comments());
        }
        if let Some(padding) = &self.end_padding {
            out.extend(padding.comments());
        }
        out
    }

    pub fn get_trailing_comment(&self) -> Option<Vec<&CommentNode>> {
        self.end_padding.as_ref().and_then(|p| p.get_trailing_comment())
    }

    pub fn delete_trailing_comment(&mut self) {
        if let Some(padding) = &mut self.end_padding {
            padding.delete_trailing_comment();
        }
    }

    /// Render the run: the original shortcut while pristine, literal
    /// values once any member has changed.
    pub fn format(&self) -> String {
        let mut out = String::new();
        if self.is_pristine() {
            out.push_str(&self.token);
            if self.takes_end_value() {
                match &self.inner_padding {
                    Some(padding) => out.push_str(&padding.format()),
                    None => out.push(' '),
                }
                if let Some(end) = self.values.last() {
                    out.push_str(&end.format());
                }
            }
        } else {
            for (i, value) in self.values.iter().enumerate() {
                if i > 0 && !out.ends_with(' ') {
                    out.push(' ');
                }
                out.push_str(&value.format());
            }
        }
        if let Some(padding) = &self.end_padding {
            out.push_str(&padding.format());
        }
        out
    }

    /// Abandon the shortcut encoding, yielding the member nodes as
    /// standalone literals. The run's trailing padding moves onto the
    /// last literal.
    pub fn into_literals(mut self) -> Vec<ValueNode> {
        if let Some(padding) = self.end_padding.take()
            && let Some(last) = self.values.last_mut()
        {
            last.set_padding(padding);
        }
        self.values
    }

    fn takes_end_value(&self) -> bool {
        matches!(
            self.kind,
            ShortcutKind::Interpolate | ShortcutKind::LogInterpolate
        )
    }
}

fn parse_count(word: &str, prefix: &str) -> Result<usize> {
    if prefix.is_empty() {
        return Ok(1);
    }
    prefix.parse().map_err(|_| {
        KermaError::malformed("shortcut", format!("bad count in shortcut {word:?}"))
    })
}

fn require_prev<'a>(word: &str, prev: Option<&'a ValueNode>) -> Result<&'a Value> {
    let node = prev.ok_or_else(|| {
        KermaError::malformed(
            "shortcut",
            format!("{word:?} has no previous value to work from"),
        )
    })?;
    node.value().ok_or_else(|| {
        KermaError::malformed(
            "shortcut",
            format!("{word:?} cannot follow a jump"),
        )
    })
}

fn require_real(word: &str, value: &Value) -> Result<f64> {
    value.as_real().ok_or_else(|| {
        KermaError::malformed(
            "shortcut",
            format!("{word:?} needs a numeric previous value"),
        )
    })
}

/// Build a literal node for an expansion product. Integer lists keep
/// integral products as integers so an exploded run renders like its
/// neighbors.
fn synth(value_type: ValueType, value: f64) -> Result<ValueNode> {
    if value_type == ValueType::Integer && value.fract() == 0.0 {
        let mut node = ValueNode::empty(ValueType::Integer);
        node.set_int(value as i64)?;
        Ok(node)
    } else {
        let mut node = ValueNode::empty(ValueType::Real);
        node.set_real(value)?;
        Ok(node)
    }
}

fn synth_from(value: &Value) -> Result<ValueNode> {
    let mut node = ValueNode::empty(match value {
        Value::Integer(_) => ValueType::Integer,
        Value::Real(_) => ValueType::Real,
        Value::Text(_) => ValueType::Text,
    });
    node.set_value(value.clone())?;
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn literal(token: &str, value_type: ValueType) -> ValueNode {
        ValueNode::new(token, value_type).unwrap()
    }

    fn reals(node: &ShortcutNode) -> Vec<f64> {
        node.values()
            .iter()
            .map(|v| v.as_real().unwrap())
            .collect()
    }

    #[test]
    fn classify_recognizes_shortcut_shapes() {
        for (word, kind) in [
            ("2R", ShortcutKind::Repeat),
            ("r", ShortcutKind::Repeat),
            ("3M", ShortcutKind::Multiply),
            ("-2M", ShortcutKind::Multiply),
            ("2I", ShortcutKind::Interpolate),
            ("i", ShortcutKind::Interpolate),
            ("2ILOG", ShortcutKind::LogInterpolate),
            ("ilog", ShortcutKind::LogInterpolate),
            ("2LOG", ShortcutKind::LogInterpolate),
            ("log", ShortcutKind::LogInterpolate),
            ("2J", ShortcutKind::Jump),
            ("j", ShortcutKind::Jump),
        ] {
            assert_eq!(ShortcutKind::classify(word), Some(kind), "{word}");
        }
        for word in ["4", "2.5", "-2", "6.02+23", "1.0e-2", "2i4", "hi", "xilog", ""] {
            assert_eq!(ShortcutKind::classify(word), None, "{word}");
        }
    }

    #[test]
    fn repeat_copies_the_previous_value() {
        let prev = literal("3", ValueType::Integer);
        let node = ShortcutNode::expand("2r", None, Some(&prev), ValueType::Integer).unwrap();
        assert_eq!(node.kind(), ShortcutKind::Repeat);
        assert_eq!(node.len(), 2);
        for value in node.values() {
            assert_eq!(value.as_int().unwrap(), 3);
        }

        let node = ShortcutNode::expand("R", None, Some(&prev), ValueType::Integer).unwrap();
        assert_eq!(node.len(), 1);
    }

    #[test]
    fn multiply_scales_the_previous_value() {
        let prev = literal("1", ValueType::Integer);
        let node = ShortcutNode::expand("-2M", None, Some(&prev), ValueType::Integer).unwrap();
        assert_eq!(node.values()[0].as_int().unwrap(), -2);

        let prev = literal("1.5", ValueType::Real);
        let node = ShortcutNode::expand("2m", None, Some(&prev), ValueType::Real).unwrap();
        assert!((node.values()[0].as_real().unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn jump_makes_placeholder_slots() {
        let node = ShortcutNode::expand("2j", None, None, ValueType::Real).unwrap();
        assert_eq!(node.len(), 2);
        for value in node.values() {
            assert!(value.value().is_none());
            assert!(value.is_jump());
        }
        let node = ShortcutNode::expand("J", None, None, ValueType::Real).unwrap();
        assert_eq!(node.len(), 1);
    }

    #[test]
    fn linear_interpolation_fills_between_endpoints() {
        let prev = literal("1", ValueType::Real);
        let node = ShortcutNode::expand_interpolation(
            "2i",
            Some(PaddingNode::new(" ")),
            "4",
            None,
            Some(&prev),
            ValueType::Real,
        )
        .unwrap();
        assert_eq!(reals(&node), vec![2.0, 3.0, 4.0]);

        let prev = literal("3", ValueType::Real);
        let node = ShortcutNode::expand_interpolation(
            "I",
            Some(PaddingNode::new(" ")),
            "4",
            None,
            Some(&prev),
            ValueType::Real,
        )
        .unwrap();
        assert_eq!(reals(&node), vec![3.5, 4.0]);
    }

    #[test]
    fn log_interpolation_fills_geometrically() {
        let prev = literal("0.01", ValueType::Real);
        let node = ShortcutNode::expand_interpolation(
            "2ILOG",
            Some(PaddingNode::new(" ")),
            "10",
            None,
            Some(&prev),
            ValueType::Real,
        )
        .unwrap();
        let got = reals(&node);
        for (got, want) in got.iter().zip([0.1, 1.0, 10.0]) {
            assert!((got - want).abs() < 1e-9 * want, "{got} vs {want}");
        }
    }

    #[test]
    fn pristine_runs_replay_their_token() {
        let prev = literal("3", ValueType::Integer);
        let mut node = ShortcutNode::expand(
            "2r",
            Some(PaddingNode::new(" ")),
            Some(&prev),
            ValueType::Integer,
        )
        .unwrap();
        assert!(node.is_pristine());
        assert_eq!(node.format(), "2r ");

        node.values_mut()[0].set_int(4).unwrap();
        assert!(!node.is_pristine());
        assert_eq!(node.format(), "4 3 ");
    }

    #[test]
    fn pristine_interpolation_replays_both_tokens() {
        let prev = literal("1", ValueType::Real);
        let mut node = ShortcutNode::expand_interpolation(
            "2i",
            Some(PaddingNode::new("  ")),
            "4",
            Some(PaddingNode::new(" ")),
            Some(&prev),
            ValueType::Real,
        )
        .unwrap();
        assert_eq!(node.format(), "2i  4 ");

        node.values_mut()[0].set_real(2.5).unwrap();
        assert_eq!(node.format(), "2.5 3.0 4 ");
    }

    #[test]
    fn assigning_equal_values_keeps_the_run_pristine() {
        let prev = literal("3", ValueType::Integer);
        let mut node = ShortcutNode::expand("2r", None, Some(&prev), ValueType::Integer).unwrap();
        node.values_mut()[0].set_int(3).unwrap();
        assert!(node.is_pristine());
        assert_eq!(node.format(), "2r");
    }

    #[test]
    fn changed_jump_slots_explode() {
        let mut node = ShortcutNode::expand("2j", None, None, ValueType::Real).unwrap();
        node.values_mut()[0].set_real(5.0).unwrap();
        assert_eq!(node.format(), "5.0 J");
    }

    #[test]
    fn shortcuts_need_a_usable_predecessor() {
        for word in ["2R", "3M", "R"] {
            let err = ShortcutNode::expand(word, None, None, ValueType::Integer).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedInput, "{word}");
        }
        let jump = ValueNode::jump(ValueType::Integer);
        for word in ["4R", "2M"] {
            let err =
                ShortcutNode::expand(word, None, Some(&jump), ValueType::Integer).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedInput, "{word}");
        }
    }

    #[test]
    fn multiply_needs_a_factor() {
        let prev = literal("10", ValueType::Integer);
        let err = ShortcutNode::expand("M", None, Some(&prev), ValueType::Integer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn interpolation_needs_a_literal_end() {
        let prev = literal("1", ValueType::Real);
        for end in ["3M", "J", "2R"] {
            let err = ShortcutNode::expand_interpolation(
                "4I",
                None,
                end,
                None,
                Some(&prev),
                ValueType::Real,
            )
            .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedInput, "{end}");
        }
        let err = ShortcutNode::expand("4I", None, Some(&prev), ValueType::Real).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn log_interpolation_rejects_bad_endpoints() {
        let jump = ValueNode::jump(ValueType::Real);
        let err = ShortcutNode::expand_interpolation(
            "2Ilog",
            None,
            "5",
            None,
            Some(&jump),
            ValueType::Real,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);

        let prev = literal("-1", ValueType::Real);
        let err = ShortcutNode::expand_interpolation(
            "2ilog",
            None,
            "5",
            None,
            Some(&prev),
            ValueType::Real,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn into_literals_moves_end_padding_to_the_last_value() {
        let prev = literal("3", ValueType::Integer);
        let node = ShortcutNode::expand(
            "2r",
            Some(PaddingNode::new("  ")),
            Some(&prev),
            ValueType::Integer,
        )
        .unwrap();
        let literals = node.into_literals();
        assert_eq!(literals.len(), 2);
        assert!(literals[0].padding().is_none());
        assert_eq!(literals[1].padding().unwrap().format(), "  ");
    }
}
