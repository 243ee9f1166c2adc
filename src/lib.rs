extern crate self as unimatch;

#[macro_use]
mod macros;
mod api;
mod doc;
mod engine;
mod error;
mod rule;

pub use api::{Matcher, MatcherOptions, Span};
pub use doc::{Alignment, Doc, SimpleTokenizer, Token, TokenAttr, TokenFlag, Tokenize};
pub use engine::{
    EngineKind, EngineMetrics, EngineSet, MatchMetrics, MatchRun, PatternEngine, PhraseMatcher, PruneMetrics,
    PruneStrategy, RegexMatcher, RegexOptions, TokenMatcher, overlaps, prune_longest, prune_overlapping_matches,
};
pub use error::{EngineError, MatchError, Result};
pub use rule::{AttrPredicate, OnMatch, Quantifier, Rule, RulePattern, TokenPattern};

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

// --- Core types -------------------------------------------------------------

/// Identifier assigned to a rule at registration: `"{category}_{sequence}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(Arc<str>);

impl RuleId {
    pub(crate) fn new(category: &str, sequence: usize) -> Self {
        RuleId(Arc::from(format!("{category}_{sequence}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RuleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RuleId {
    fn from(id: &str) -> Self {
        RuleId(Arc::from(id))
    }
}

/// A matched token range `[start, end)` attributed to one rule.
///
/// Engines only produce matches with `start < end`. Hand-built matches are
/// not checked here; [`Matcher::to_spans`] rejects empty ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Match {
    rule_id: RuleId,
    start: usize,
    end: usize,
}

impl Match {
    pub fn new(rule_id: impl Into<RuleId>, start: usize, end: usize) -> Self {
        Match { rule_id: rule_id.into(), start, end }
    }

    pub fn rule_id(&self) -> &RuleId {
        &self.rule_id
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of tokens covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
