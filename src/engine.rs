//! Pattern engines and match post-processing.
//!
//! Each rule kind is owned by one engine. The [`Matcher`](crate::Matcher)
//! routes rules at registration and fans a document out to every populated
//! engine at match time:
//!
//! ```text
//! Rule::Tokens  ──▶ TokenMatcher  ──┐
//! Rule::Literal ──▶ PhraseMatcher ──┼─▶ concat (fixed order) ──▶ prune ──▶ Vec<Match>
//! Rule::Regex   ──▶ RegexMatcher  ──┘
//! ```
//!
//! ## Responsibilities by module
//!
//! - `token_matcher.rs`: per-token attribute constraints with quantifiers.
//! - `phrase_matcher.rs`: exact token-sequence phrases on one attribute.
//! - `regex_matcher.rs`: regexes over the document text, aligned to tokens.
//! - `prune.rs`: longest-span-wins overlap pruning, iterated to a fixpoint.
//! - `metrics.rs`: opt-in timing and counts for a match run.
//!
//! ## The engine contract
//!
//! All engines implement [`PatternEngine`]. `add` either registers the
//! pattern or fails without touching the engine; `find` is deterministic for a
//! fixed pattern set and document, reports each `(id, start, end)` at most
//! once, and fires the pattern's callback once per reported match.

#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/phrase_matcher.rs"]
mod phrase_matcher;
#[path = "engine/prune.rs"]
mod prune;
#[path = "engine/regex_matcher.rs"]
mod regex_matcher;
#[path = "engine/token_matcher.rs"]
mod token_matcher;

pub use metrics::{EngineKind, EngineMetrics, EngineSet, MatchMetrics, MatchRun, PruneMetrics};
pub use phrase_matcher::PhraseMatcher;
pub(crate) use prune::prune_longest_with_metrics;
pub use prune::{PruneStrategy, overlaps, prune_longest, prune_overlapping_matches};
pub use regex_matcher::{RegexMatcher, RegexOptions};
pub use token_matcher::TokenMatcher;

use crate::error::EngineError;
use crate::{Doc, Match, OnMatch, RuleId};

/// One matching technique over tokenized documents.
pub trait PatternEngine: Send + Sync {
    /// Kind-specific pattern representation.
    type Pattern;

    /// Register `pattern` under `id`. On error the engine is left unchanged.
    fn add(&mut self, id: RuleId, pattern: Self::Pattern, on_match: Option<OnMatch>) -> Result<(), EngineError>;

    /// All matches of the registered patterns in `doc`, in token coordinates.
    fn find(&self, doc: &Doc) -> Vec<Match>;

    /// Number of registered patterns.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fire callbacks for `hits` in report order and strip the entry indexes.
///
/// Each hit pairs a match with the index of the engine entry that produced it;
/// `callback_of` resolves that index to the entry's callback.
fn fire_callbacks<'a>(
    doc: &Doc,
    hits: Vec<(usize, Match)>,
    callback_of: impl Fn(usize) -> Option<&'a OnMatch>,
) -> Vec<Match> {
    hits.into_iter()
        .map(|(entry, m)| {
            if let Some(callback) = callback_of(entry) {
                callback(doc, &m);
            }
            m
        })
        .collect()
}
