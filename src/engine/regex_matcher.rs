//! Regular-expression matching over the document text.
//!
//! Regexes run on the raw text, so a hit can start or end inside a token. Hits
//! are mapped back to token coordinates with [`Doc::token_span`] under the
//! configured [`Alignment`]; hits that cover no token are dropped.
//!
//! ```text
//! text:   "hx of afib."          regex: "fib"
//! tokens:  hx  of  afib  .
//! Expand   -> 2..3 ("afib")
//! Contract -> none (no token fully inside)
//! Strict   -> none
//! ```

use super::{PatternEngine, fire_callbacks};
use crate::error::EngineError;
use crate::{Alignment, Doc, Match, OnMatch, RuleId};
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

/// Options for the regex engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegexOptions {
    /// Compile rule regexes case-insensitively.
    pub case_insensitive: bool,
    /// How hits are snapped to token boundaries.
    pub alignment: Alignment,
}

impl Default for RegexOptions {
    fn default() -> Self {
        RegexOptions { case_insensitive: true, alignment: Alignment::Expand }
    }
}

struct RegexEntry {
    id: RuleId,
    regex: Regex,
    on_match: Option<OnMatch>,
}

/// Matches regular expressions and aligns the hits to tokens.
pub struct RegexMatcher {
    options: RegexOptions,
    entries: Vec<RegexEntry>,
}

impl RegexMatcher {
    pub fn new(options: RegexOptions) -> Self {
        RegexMatcher { options, entries: Vec::new() }
    }

    pub fn options(&self) -> RegexOptions {
        self.options
    }
}

impl std::fmt::Debug for RegexMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegexMatcher")
            .field("options", &self.options)
            .field("patterns", &self.entries.iter().map(|e| e.regex.as_str()).collect::<Vec<_>>())
            .finish()
    }
}

impl PatternEngine for RegexMatcher {
    type Pattern = String;

    fn add(&mut self, id: RuleId, source: String, on_match: Option<OnMatch>) -> Result<(), EngineError> {
        let regex = RegexBuilder::new(&source)
            .case_insensitive(self.options.case_insensitive)
            .build()
            .map_err(|source| EngineError::InvalidRegex { id: id.to_string(), source })?;
        self.entries.push(RegexEntry { id, regex, on_match });
        Ok(())
    }

    fn find(&self, doc: &Doc) -> Vec<Match> {
        let mut hits = Vec::new();
        for (entry_idx, entry) in self.entries.iter().enumerate() {
            let mut seen = HashSet::new();
            for m in entry.regex.find_iter(doc.text()) {
                let Some((start, end)) = doc.token_span(m.start(), m.end(), self.options.alignment) else {
                    log::trace!(
                        target: "unimatch::engine",
                        "regex {} hit {}..{} does not align to tokens",
                        entry.id,
                        m.start(),
                        m.end()
                    );
                    continue;
                };
                if seen.insert((start, end)) {
                    hits.push((entry_idx, Match::new(entry.id.clone(), start, end)));
                }
            }
        }

        log::trace!(target: "unimatch::engine", "regex matcher: {} hits over {} tokens", hits.len(), doc.len());
        fire_callbacks(doc, hits, |entry| self.entries[entry].on_match.as_ref())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SimpleTokenizer, Tokenize};

    fn spans(matches: &[Match]) -> Vec<(&str, usize, usize)> {
        matches.iter().map(|m| (m.rule_id().as_str(), m.start(), m.end())).collect()
    }

    fn matcher(options: RegexOptions, sources: &[&str]) -> RegexMatcher {
        let mut rm = RegexMatcher::new(options);
        for (i, src) in sources.iter().enumerate() {
            rm.add(RuleId::new("RX", i), src.to_string(), None).unwrap();
        }
        rm
    }

    #[test]
    fn case_insensitive_by_default() {
        let rm = matcher(RegexOptions::default(), &[r"\bchf\b"]);
        let doc = SimpleTokenizer.tokenize("Hx of CHF and chf");
        assert_eq!(spans(&rm.find(&doc)), vec![("RX_0", 2, 3), ("RX_0", 4, 5)]);

        let sensitive = matcher(RegexOptions { case_insensitive: false, ..RegexOptions::default() }, &[r"\bchf\b"]);
        assert_eq!(spans(&sensitive.find(&doc)), vec![("RX_0", 4, 5)]);
    }

    #[test]
    fn partial_token_hits_follow_alignment() {
        let doc = SimpleTokenizer.tokenize("hx of afib.");
        let expand = matcher(RegexOptions::default(), &["fib"]);
        assert_eq!(spans(&expand.find(&doc)), vec![("RX_0", 2, 3)]);

        let contract = matcher(RegexOptions { alignment: Alignment::Contract, ..RegexOptions::default() }, &["fib"]);
        assert!(contract.find(&doc).is_empty());

        let strict = matcher(RegexOptions { alignment: Alignment::Strict, ..RegexOptions::default() }, &["afib"]);
        assert_eq!(spans(&strict.find(&doc)), vec![("RX_0", 2, 3)]);
    }

    #[test]
    fn hits_collapsing_to_the_same_tokens_are_reported_once() {
        let doc = SimpleTokenizer.tokenize("hypertension");
        let rm = matcher(RegexOptions::default(), &["hyper|tension"]);
        assert_eq!(spans(&rm.find(&doc)), vec![("RX_0", 0, 1)]);
    }

    #[test]
    fn rules_are_reported_in_registration_order() {
        let doc = SimpleTokenizer.tokenize("pain in chest");
        let rm = matcher(RegexOptions::default(), &["chest", "pain"]);
        assert_eq!(spans(&rm.find(&doc)), vec![("RX_0", 2, 3), ("RX_1", 0, 1)]);
    }

    #[test]
    fn bad_regex_leaves_engine_unchanged() {
        let mut rm = RegexMatcher::new(RegexOptions::default());
        let err = rm.add(RuleId::from("RX_0"), "[unclosed".to_string(), None).unwrap_err();
        assert!(matches!(err, EngineError::InvalidRegex { .. }));
        assert!(rm.is_empty());
    }
}
