//! Token-attribute pattern matching.
//!
//! A pattern is a sequence of [`TokenPattern`]s. Each element constrains one
//! token (attribute predicates plus lexical flags) and carries a quantifier.
//! Matching is a position-set simulation: starting from `{start}`, every
//! element maps the set of reachable positions to the next set.
//!
//! ```text
//! pattern: [LOWER=no] [IS_ALPHA]* [LOWER=fever]
//! doc:      no  chills  or  fever
//! start 0: {0} -> {1} -> {1,2,3} -> {4}     => match 0..4
//! ```
//!
//! Every reachable non-empty end is reported (no greedy filtering); the
//! pruner decides which of the overlapping candidates survive.

use super::{PatternEngine, fire_callbacks};
use crate::error::EngineError;
use crate::{AttrPredicate, Doc, Match, OnMatch, Quantifier, RuleId, Token, TokenAttr, TokenFlag, TokenPattern};
use regex::Regex;
use std::collections::BTreeSet;

#[derive(Debug)]
enum CompiledPredicate {
    Equals(String),
    In(Vec<String>),
    NotIn(Vec<String>),
    Regex(Regex),
}

impl CompiledPredicate {
    /// Missing attribute values only satisfy `NotIn`.
    fn test(&self, value: Option<&str>) -> bool {
        match (self, value) {
            (CompiledPredicate::Equals(want), Some(v)) => v == want,
            (CompiledPredicate::In(set), Some(v)) => set.iter().any(|s| s == v),
            (CompiledPredicate::NotIn(set), Some(v)) => !set.iter().any(|s| s == v),
            (CompiledPredicate::NotIn(_), None) => true,
            (CompiledPredicate::Regex(re), Some(v)) => re.is_match(v),
            (_, None) => false,
        }
    }
}

#[derive(Debug)]
struct CompiledToken {
    attrs: Vec<(TokenAttr, CompiledPredicate)>,
    flags: Vec<(TokenFlag, bool)>,
    quantifier: Quantifier,
}

impl CompiledToken {
    fn compile(id: &RuleId, pattern: TokenPattern) -> Result<Self, EngineError> {
        let attrs = pattern
            .attrs
            .into_iter()
            .map(|(attr, predicate)| {
                let compiled = match predicate {
                    AttrPredicate::Equals(v) => CompiledPredicate::Equals(v),
                    AttrPredicate::In(vs) => CompiledPredicate::In(vs),
                    AttrPredicate::NotIn(vs) => CompiledPredicate::NotIn(vs),
                    AttrPredicate::Regex(src) => CompiledPredicate::Regex(
                        Regex::new(&src).map_err(|source| EngineError::InvalidRegex { id: id.to_string(), source })?,
                    ),
                };
                Ok((attr, compiled))
            })
            .collect::<Result<Vec<_>, EngineError>>()?;
        Ok(CompiledToken { attrs, flags: pattern.flags, quantifier: pattern.quantifier })
    }

    fn accepts(&self, token: &Token) -> bool {
        self.flags.iter().all(|&(flag, want)| token.flag(flag) == want)
            && self.attrs.iter().all(|(attr, predicate)| predicate.test(token.attr(*attr).as_deref()))
    }
}

struct TokenEntry {
    id: RuleId,
    pattern: Vec<CompiledToken>,
    on_match: Option<OnMatch>,
}

impl TokenEntry {
    /// End positions reachable from `start`, excluding empty matches.
    ///
    /// `accepts[i][pos]` caches whether element `i` accepts token `pos`.
    fn ends_from(&self, start: usize, accepts: &[Vec<bool>]) -> BTreeSet<usize> {
        let n = accepts.first().map(Vec::len).unwrap_or(0);
        let mut current = BTreeSet::from([start]);

        for (element, ok) in self.pattern.iter().zip(accepts) {
            let mut next = BTreeSet::new();
            for &pos in &current {
                match element.quantifier {
                    Quantifier::One => {
                        if pos < n && ok[pos] {
                            next.insert(pos + 1);
                        }
                    }
                    Quantifier::Optional => {
                        next.insert(pos);
                        if pos < n && ok[pos] {
                            next.insert(pos + 1);
                        }
                    }
                    Quantifier::ZeroOrMore | Quantifier::OneOrMore => {
                        if element.quantifier == Quantifier::ZeroOrMore {
                            next.insert(pos);
                        }
                        let mut p = pos;
                        while p < n && ok[p] {
                            p += 1;
                            next.insert(p);
                        }
                    }
                }
            }
            if next.is_empty() {
                return next;
            }
            current = next;
        }

        current.retain(|&end| end > start);
        current
    }
}

/// Matches sequences of per-token attribute constraints.
#[derive(Default)]
pub struct TokenMatcher {
    entries: Vec<TokenEntry>,
}

impl TokenMatcher {
    pub fn new() -> Self {
        TokenMatcher::default()
    }
}

impl std::fmt::Debug for TokenMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenMatcher").field("patterns", &self.entries.len()).finish()
    }
}

impl PatternEngine for TokenMatcher {
    type Pattern = Vec<TokenPattern>;

    fn add(&mut self, id: RuleId, pattern: Vec<TokenPattern>, on_match: Option<OnMatch>) -> Result<(), EngineError> {
        if pattern.is_empty() {
            return Err(EngineError::EmptyPattern { id: id.to_string() });
        }
        let pattern =
            pattern.into_iter().map(|p| CompiledToken::compile(&id, p)).collect::<Result<Vec<_>, EngineError>>()?;
        self.entries.push(TokenEntry { id, pattern, on_match });
        Ok(())
    }

    fn find(&self, doc: &Doc) -> Vec<Match> {
        let accepts: Vec<Vec<Vec<bool>>> = self
            .entries
            .iter()
            .map(|entry| {
                entry.pattern.iter().map(|element| doc.tokens().iter().map(|t| element.accepts(t)).collect()).collect()
            })
            .collect();

        let mut hits = Vec::new();
        for start in 0..doc.len() {
            for (entry_idx, entry) in self.entries.iter().enumerate() {
                for end in entry.ends_from(start, &accepts[entry_idx]) {
                    hits.push((entry_idx, Match::new(entry.id.clone(), start, end)));
                }
            }
        }

        log::trace!(target: "unimatch::engine", "token matcher: {} hits over {} tokens", hits.len(), doc.len());
        fire_callbacks(doc, hits, |entry| self.entries[entry].on_match.as_ref())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SimpleTokenizer, Tokenize, token};

    fn spans(matches: &[Match]) -> Vec<(usize, usize)> {
        matches.iter().map(|m| (m.start(), m.end())).collect()
    }

    fn matcher(pattern: Vec<TokenPattern>) -> TokenMatcher {
        let mut tm = TokenMatcher::new();
        tm.add(RuleId::from("T_0"), pattern, None).unwrap();
        tm
    }

    #[test]
    fn single_tokens_in_sequence() {
        let tm = matcher(vec![token!(Lower = "no"), token!(Lower = "fever")]);
        let doc = SimpleTokenizer.tokenize("No fever, no FEVER");
        assert_eq!(spans(&tm.find(&doc)), vec![(0, 2), (3, 5)]);
    }

    #[test]
    fn zero_or_more_reports_every_end() {
        let tm = matcher(vec![
            token!(Lower = "no"),
            TokenPattern::any().with_flag(TokenFlag::IsAlpha, true).quantifier(Quantifier::ZeroOrMore),
        ]);
        let doc = SimpleTokenizer.tokenize("no chills or fever");
        assert_eq!(spans(&tm.find(&doc)), vec![(0, 1), (0, 2), (0, 3), (0, 4)]);
    }

    #[test]
    fn optional_and_one_or_more() {
        let tm = matcher(vec![
            token!(Lower = "left").quantifier(Quantifier::Optional),
            TokenPattern::attr(TokenAttr::Lower, "lower").quantifier(Quantifier::OneOrMore),
            token!(Lower = "lobe"),
        ]);
        let doc = SimpleTokenizer.tokenize("left lower lower lobe");
        // start 0 uses the optional token, start 1 and 2 skip it
        assert_eq!(spans(&tm.find(&doc)), vec![(0, 4), (1, 4), (2, 4)]);
    }

    #[test]
    fn predicates_on_annotations() {
        let mut doc = SimpleTokenizer.tokenize("patient denies pain");
        doc.token_mut(1).unwrap().set_lemma("deny");
        let tm = matcher(vec![
            TokenPattern::any().with_attr(TokenAttr::Lemma, AttrPredicate::In(vec!["deny".into(), "refuse".into()])),
            TokenPattern::any().with_attr(TokenAttr::Lower, AttrPredicate::Regex("^pa".into())),
        ]);
        assert_eq!(spans(&tm.find(&doc)), vec![(1, 3)]);

        // unannotated lemma only satisfies NotIn
        let not_in =
            matcher(vec![TokenPattern::any().with_attr(TokenAttr::Lemma, AttrPredicate::NotIn(vec!["deny".into()]))]);
        assert_eq!(spans(&not_in.find(&doc)), vec![(0, 1), (2, 3)]);
    }

    #[test]
    fn patterns_that_only_match_empty_never_report() {
        let tm = matcher(vec![token!(Lower = "absent").quantifier(Quantifier::Optional)]);
        assert!(tm.find(&SimpleTokenizer.tokenize("nothing here")).is_empty());
    }

    #[test]
    fn malformed_patterns_are_engine_errors() {
        let mut tm = TokenMatcher::new();
        assert!(matches!(tm.add(RuleId::from("T_0"), vec![], None), Err(EngineError::EmptyPattern { .. })));
        let bad = vec![TokenPattern::any().with_attr(TokenAttr::Orth, AttrPredicate::Regex("(".into()))];
        assert!(matches!(tm.add(RuleId::from("T_1"), bad, None), Err(EngineError::InvalidRegex { .. })));
        assert!(tm.is_empty());
    }
}
