//! Data cards and the naming discipline of the data block
//!
//! Every data card starts with a classifier: a letter prefix, maybe a
//! number, maybe a particle designator. Which of those parts a given
//! card family allows is fixed by the deck grammar; [`DataNameRule`]
//! captures one family's rules and [`DataCard::parse_with_rule`]
//! enforces them at parse time.

use tracing::debug;

use crate::cst::nodes::{ClassifierNode, ListNode, ParametersNode, SyntaxNode};
use crate::cst::parser;
use crate::cst::value::Value;
use crate::error::KermaError;
use crate::result::Result;
use crate::semantic::object::card_lines;
use crate::version::McnpVersion;

/// Whether a card family takes a particle designator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleRule {
    Forbidden,
    Optional,
    Required,
}

/// The naming rules of one data-card family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataNameRule {
    prefix: &'static str,
    requires_number: bool,
    particles: ParticleRule,
}

impl DataNameRule {
    pub const KCODE: DataNameRule = DataNameRule::new("kcode", false, ParticleRule::Forbidden);
    pub const MODE: DataNameRule = DataNameRule::new("mode", false, ParticleRule::Forbidden);
    pub const IMPORTANCE: DataNameRule = DataNameRule::new("imp", false, ParticleRule::Required);
    pub const VOLUME: DataNameRule = DataNameRule::new("vol", false, ParticleRule::Forbidden);
    pub const TALLY: DataNameRule = DataNameRule::new("f", true, ParticleRule::Optional);
    pub const MATERIAL: DataNameRule = DataNameRule::new("m", true, ParticleRule::Forbidden);
    pub const TRANSFORM: DataNameRule = DataNameRule::new("tr", true, ParticleRule::Forbidden);

    pub const fn new(prefix: &'static str, requires_number: bool, particles: ParticleRule) -> Self {
        Self {
            prefix,
            requires_number,
            particles,
        }
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Check a parsed classifier against this family's rules.
    pub fn validate(&self, classifier: &ClassifierNode) -> Result<()> {
        let name = classifier.format_name();
        if !classifier.prefix().eq_ignore_ascii_case(self.prefix) {
            return Err(KermaError::malformed(
                name,
                format!("the name does not start with {}", self.prefix.to_uppercase()),
            ));
        }
        if self.requires_number && classifier.number().is_none() {
            return Err(KermaError::malformed(name, "a card number is required"));
        }
        if !self.requires_number && classifier.number().is_some() {
            return Err(KermaError::malformed(name, "a card number is not allowed"));
        }
        match (self.particles, classifier.particles().is_some()) {
            (ParticleRule::Forbidden, true) => Err(KermaError::malformed(
                name,
                "a particle classifier is not allowed",
            )),
            (ParticleRule::Required, false) => Err(KermaError::malformed(
                name,
                "a particle classifier is required",
            )),
            _ => Ok(()),
        }
    }
}

/// One data card: a classifier followed by values or parameters
#[derive(Debug, Clone)]
pub struct DataCard {
    tree: SyntaxNode,
    mutated: bool,
}

impl DataCard {
    pub fn parse(text: &str) -> Result<DataCard> {
        let tree = parser::parse_data(text)?;
        let card = DataCard {
            tree,
            mutated: false,
        };
        debug!(card = %card.name()?, "parsed data card");
        Ok(card)
    }

    /// Parse and enforce a card family's naming rules in one step.
    pub fn parse_with_rule(text: &str, rule: &DataNameRule) -> Result<DataCard> {
        let card = DataCard::parse(text)?;
        rule.validate(card.classifier()?)?;
        Ok(card)
    }

    pub fn classifier(&self) -> Result<&ClassifierNode> {
        self.tree
            .get("classifier")
            .and_then(|node| node.as_classifier())
            .ok_or_else(|| KermaError::malformed("data", "data card has no classifier"))
    }

    pub fn classifier_mut(&mut self) -> Result<&mut ClassifierNode> {
        self.tree
            .get_mut("classifier")
            .and_then(|node| node.as_classifier_mut())
            .ok_or_else(|| KermaError::malformed("data", "data card has no classifier"))
    }

    /// The card name as written, without padding.
    pub fn name(&self) -> Result<String> {
        Ok(self.classifier()?.format_name())
    }

    /// The classifier's number, when the card carries one.
    pub fn number(&self) -> Option<i64> {
        self.classifier().ok()?.number()?.as_int().ok()
    }

    pub fn data(&self) -> Result<&ListNode> {
        self.tree
            .get("data")
            .and_then(|node| node.as_list())
            .ok_or_else(|| KermaError::malformed("data", "data card has no value list"))
    }

    pub fn data_mut(&mut self) -> Result<&mut ListNode> {
        self.tree
            .get_mut("data")
            .and_then(|node| node.as_list_mut())
            .ok_or_else(|| KermaError::malformed("data", "data card has no value list"))
    }

    /// Replace the value run, keeping shortcut runs whose expansion
    /// still matches and the spacing of everything untouched.
    pub fn set_values(&mut self, values: &[Value]) -> Result<()> {
        self.data_mut()?.update_with_new_values(values)?;
        self.mutated = true;
        Ok(())
    }

    pub fn parameters(&self) -> Option<&ParametersNode> {
        self.tree.get("parameters").and_then(|node| node.as_parameters())
    }

    pub fn parameters_mut(&mut self) -> Option<&mut ParametersNode> {
        self.tree
            .get_mut("parameters")
            .and_then(|node| node.as_parameters_mut())
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
