//! Rule definitions.
//!
//! A [`Rule`] is a category label plus exactly one pattern:
//!
//! ```text
//! RulePattern::Literal("no history of")          -> phrase engine
//! RulePattern::Regex(r"\bCHF\b")                 -> regex engine
//! RulePattern::Tokens([{LOWER: "no"}, {POS: ..}]) -> token-pattern engine
//! ```
//!
//! The kind is fixed when the rule is built and decides which engine owns the
//! rule once it is registered with a [`Matcher`](crate::Matcher).

use crate::doc::{Doc, TokenAttr, TokenFlag};
use crate::{Match, RuleId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Callback fired by an engine for each distinct match of a rule, before pruning.
pub type OnMatch = Arc<dyn Fn(&Doc, &Match) + Send + Sync>;

/// The pattern of a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum RulePattern {
    /// Exact phrase, compared token by token on the matcher's phrase attribute.
    Literal(String),
    /// Regular expression run over the document text.
    Regex(String),
    /// Sequence of per-token constraints.
    Tokens(Vec<TokenPattern>),
}

impl RulePattern {
    pub fn kind(&self) -> &'static str {
        match self {
            RulePattern::Literal(_) => "literal",
            RulePattern::Regex(_) => "regex",
            RulePattern::Tokens(_) => "token",
        }
    }
}

/// Predicate on one token attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrPredicate {
    Equals(String),
    In(Vec<String>),
    NotIn(Vec<String>),
    /// Regex searched in the attribute value; compiled when the rule is registered.
    Regex(String),
}

/// How many consecutive tokens one [`TokenPattern`] consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quantifier {
    /// Exactly one token.
    #[default]
    One,
    /// Zero or one token (`?`).
    Optional,
    /// Zero or more tokens (`*`).
    ZeroOrMore,
    /// One or more tokens (`+`).
    OneOrMore,
}

/// Constraints one token must satisfy.
///
/// Every attribute predicate and every flag must hold. A pattern with no
/// constraints matches any token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenPattern {
    pub attrs: Vec<(TokenAttr, AttrPredicate)>,
    pub flags: Vec<(TokenFlag, bool)>,
    pub quantifier: Quantifier,
}

impl TokenPattern {
    /// A pattern matching any single token.
    pub fn any() -> Self {
        TokenPattern::default()
    }

    /// A pattern requiring `attr` to equal `value`.
    pub fn attr(attr: TokenAttr, value: impl Into<String>) -> Self {
        TokenPattern::any().with_attr(attr, AttrPredicate::Equals(value.into()))
    }

    pub fn with_attr(mut self, attr: TokenAttr, predicate: AttrPredicate) -> Self {
        self.attrs.push((attr, predicate));
        self
    }

    pub fn with_flag(mut self, flag: TokenFlag, value: bool) -> Self {
        self.flags.push((flag, value));
        self
    }

    pub fn quantifier(mut self, quantifier: Quantifier) -> Self {
        self.quantifier = quantifier;
        self
    }
}

/// A pattern to search for, labeled with a category.
#[derive(Clone)]
pub struct Rule {
    category: String,
    pattern: RulePattern,
    on_match: Option<OnMatch>,
    attributes: BTreeMap<String, String>,
    rule_id: Option<RuleId>,
}

impl Rule {
    pub fn new(category: impl Into<String>, pattern: RulePattern) -> Self {
        Rule { category: category.into(), pattern, on_match: None, attributes: BTreeMap::new(), rule_id: None }
    }

    /// A rule matching the exact phrase `literal`.
    pub fn literal(category: impl Into<String>, literal: impl Into<String>) -> Self {
        Rule::new(category, RulePattern::Literal(literal.into()))
    }

    /// A rule matching the regular expression `source`.
    pub fn regex(category: impl Into<String>, source: impl Into<String>) -> Self {
        Rule::new(category, RulePattern::Regex(source.into()))
    }

    /// A rule matching a sequence of token constraints.
    pub fn tokens(category: impl Into<String>, pattern: Vec<TokenPattern>) -> Self {
        Rule::new(category, RulePattern::Tokens(pattern))
    }

    pub fn on_match<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Doc, &Match) + Send + Sync + 'static,
    {
        self.on_match = Some(Arc::new(callback));
        self
    }

    /// Attach metadata for downstream consumers. The matcher never reads it.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn pattern(&self) -> &RulePattern {
        &self.pattern
    }

    /// The phrase text of a literal rule.
    pub fn literal_text(&self) -> Option<&str> {
        match &self.pattern {
            RulePattern::Literal(text) => Some(text),
            _ => None,
        }
    }

    pub fn callback(&self) -> Option<&OnMatch> {
        self.on_match.as_ref()
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Id assigned at registration; `None` until the rule is added to a matcher.
    pub fn rule_id(&self) -> Option<&RuleId> {
        self.rule_id.as_ref()
    }

    pub(crate) fn assign_id(&mut self, id: RuleId) {
        self.rule_id = Some(id);
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("category", &self.category)
            .field("pattern", &self.pattern)
            .field("on_match", &self.on_match.as_ref().map(|_| "<function>"))
            .field("attributes", &self.attributes)
            .field("rule_id", &self.rule_id)
            .finish()
    }
}
