//! Error types.
//!
//! Two layers, mirroring how the matcher is built:
//!
//! - [`EngineError`]: raised by a single pattern engine when a pattern of its
//!   own kind is malformed (a regex that does not compile, an empty token
//!   pattern, a phrase that tokenizes to nothing).
//! - [`MatchError`]: the public error for registry, pruning and span
//!   operations. Engine errors pass through unchanged.

use thiserror::Error;

/// Errors raised by a pattern engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A regular expression (rule pattern or `REGEX` predicate) failed to compile.
    #[error("invalid regex for {id}: {source}")]
    InvalidRegex {
        /// Rule id the regex was registered under.
        id: String,
        #[source]
        source: regex::Error,
    },

    /// A token pattern with no constraints.
    #[error("token pattern for {id} is empty")]
    EmptyPattern {
        /// Rule id the pattern was registered under.
        id: String,
    },

    /// A literal phrase that produced no tokens.
    #[error("phrase for {id} has no tokens")]
    EmptyPhrase {
        /// Rule id the phrase was registered under.
        id: String,
    },

    /// A phrase token lacks the attribute the phrase engine compares on.
    #[error("phrase for {id} has a token without a {attr} value")]
    UnannotatedPhrase {
        /// Rule id the phrase was registered under.
        id: String,
        /// Name of the missing attribute.
        attr: &'static str,
    },
}

/// Errors surfaced by [`Matcher`](crate::Matcher) and the pruning functions.
#[derive(Error, Debug)]
pub enum MatchError {
    /// A rule does not have the shape the registry accepts.
    #[error("invalid rule (category '{category}', {kind} pattern): {reason}")]
    InvalidRuleShape {
        /// Category of the rejected rule.
        category: String,
        /// Pattern kind of the rejected rule.
        kind: &'static str,
        /// Why the rule was rejected.
        reason: String,
    },

    /// Pruning strategy other than `longest`.
    #[error("unsupported pruning strategy '{0}': only 'longest' is implemented")]
    UnsupportedStrategy(String),

    /// A match refers to a rule id this registry never assigned.
    #[error("unknown rule id '{0}'")]
    UnknownRule(String),

    /// A match does not fit inside the document it is materialized against.
    #[error("match {start}..{end} is out of range for a document of {len} tokens")]
    SpanOutOfRange { start: usize, end: usize, len: usize },

    /// A token attribute name that does not exist.
    #[error("unknown token attribute '{0}'")]
    UnknownAttribute(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Result type for matcher operations.
pub type Result<T> = std::result::Result<T, MatchError>;
