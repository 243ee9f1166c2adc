//! Exact phrase matching.
//!
//! A phrase is a tokenized literal. Phrase and document tokens are compared on
//! one attribute (`LOWER` by default), so `"No History"` and `"no history"`
//! match the same text under `LOWER` but not under `ORTH`.
//!
//! Phrases are indexed by the key of their first token; at each document
//! position only the phrases starting with that token's key are checked.
//!
//! ```text
//! by_first["no"] = [0, 3]   entries 0 ("no history of") and 3 ("no")
//! doc keys:  no  history  of  chf
//!            ^ position 0 -> check entries 0 and 3 in registration order
//! ```

use super::{PatternEngine, fire_callbacks};
use crate::error::EngineError;
use crate::{Doc, Match, OnMatch, RuleId, TokenAttr};
use std::collections::HashMap;

struct PhraseEntry {
    id: RuleId,
    keys: Vec<String>,
    on_match: Option<OnMatch>,
}

/// Matches tokenized phrases on a single token attribute.
pub struct PhraseMatcher {
    attr: TokenAttr,
    entries: Vec<PhraseEntry>,
    by_first: HashMap<String, Vec<usize>>,
}

impl PhraseMatcher {
    pub fn new(attr: TokenAttr) -> Self {
        PhraseMatcher { attr, entries: Vec::new(), by_first: HashMap::new() }
    }

    /// Attribute phrases are compared on.
    pub fn attr(&self) -> TokenAttr {
        self.attr
    }
}

impl std::fmt::Debug for PhraseMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhraseMatcher").field("attr", &self.attr).field("phrases", &self.entries.len()).finish()
    }
}

impl PatternEngine for PhraseMatcher {
    type Pattern = Doc;

    fn add(&mut self, id: RuleId, phrase: Doc, on_match: Option<OnMatch>) -> Result<(), EngineError> {
        if phrase.is_empty() {
            return Err(EngineError::EmptyPhrase { id: id.to_string() });
        }
        let keys = phrase
            .tokens()
            .iter()
            .map(|t| t.attr(self.attr).map(|v| v.into_owned()))
            .collect::<Option<Vec<String>>>()
            .ok_or_else(|| EngineError::UnannotatedPhrase { id: id.to_string(), attr: self.attr.as_str() })?;

        let entry = self.entries.len();
        self.by_first.entry(keys[0].clone()).or_default().push(entry);
        self.entries.push(PhraseEntry { id, keys, on_match });
        Ok(())
    }

    fn find(&self, doc: &Doc) -> Vec<Match> {
        if self.entries.is_empty() {
            return Vec::new();
        }
        let doc_keys: Vec<Option<String>> =
            doc.tokens().iter().map(|t| t.attr(self.attr).map(|v| v.into_owned())).collect();

        let mut hits = Vec::new();
        for (start, key) in doc_keys.iter().enumerate() {
            let Some(candidates) = key.as_ref().and_then(|k| self.by_first.get(k)) else {
                continue;
            };
            for &entry in candidates {
                let keys = &self.entries[entry].keys;
                let end = start + keys.len();
                if end > doc_keys.len() {
                    continue;
                }
                let matched = keys.iter().zip(&doc_keys[start..end]).all(|(want, got)| got.as_deref() == Some(want));
                if matched {
                    hits.push((entry, Match::new(self.entries[entry].id.clone(), start, end)));
                }
            }
        }

        log::trace!(target: "unimatch::engine", "phrase matcher: {} hits over {} tokens", hits.len(), doc.len());
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
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ids(matches: &[Match]) -> Vec<(&str, usize, usize)> {
        matches.iter().map(|m| (m.rule_id().as_str(), m.start(), m.end())).collect()
    }

    #[test]
    fn lower_attr_ignores_case() {
        let mut pm = PhraseMatcher::new(TokenAttr::Lower);
        pm.add(RuleId::from("NEG_0"), SimpleTokenizer.tokenize("no history of"), None).unwrap();
        pm.add(RuleId::from("NEG_1"), SimpleTokenizer.tokenize("history of"), None).unwrap();
        let doc = SimpleTokenizer.tokenize("No History of CHF");
        assert_eq!(ids(&pm.find(&doc)), vec![("NEG_0", 0, 3), ("NEG_1", 1, 3)]);
    }

    #[test]
    fn orth_attr_is_case_sensitive() {
        let mut pm = PhraseMatcher::new(TokenAttr::Orth);
        pm.add(RuleId::from("ABBR_0"), SimpleTokenizer.tokenize("CHF"), None).unwrap();
        let doc = SimpleTokenizer.tokenize("chf or CHF");
        assert_eq!(ids(&pm.find(&doc)), vec![("ABBR_0", 2, 3)]);
    }

    #[test]
    fn phrase_longer_than_remaining_tokens_is_skipped() {
        let mut pm = PhraseMatcher::new(TokenAttr::Lower);
        pm.add(RuleId::from("P_0"), SimpleTokenizer.tokenize("chest pain"), None).unwrap();
        assert!(pm.find(&SimpleTokenizer.tokenize("severe chest")).is_empty());
    }

    #[test]
    fn empty_or_unannotated_phrases_are_rejected() {
        let mut pm = PhraseMatcher::new(TokenAttr::Lower);
        let err = pm.add(RuleId::from("P_0"), SimpleTokenizer.tokenize("   "), None).unwrap_err();
        assert!(matches!(err, EngineError::EmptyPhrase { .. }));

        let mut by_lemma = PhraseMatcher::new(TokenAttr::Lemma);
        let err = by_lemma.add(RuleId::from("P_1"), SimpleTokenizer.tokenize("deny"), None).unwrap_err();
        assert!(matches!(err, EngineError::UnannotatedPhrase { attr: "LEMMA", .. }));
        assert!(by_lemma.is_empty());
    }

    #[test]
    fn callback_fires_once_per_hit() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let mut pm = PhraseMatcher::new(TokenAttr::Lower);
        pm.add(
            RuleId::from("P_0"),
            SimpleTokenizer.tokenize("pain"),
            Some(Arc::new(move |_: &Doc, _: &Match| {
                seen.fetch_add(1, Ordering::SeqCst);
            })),
        )
        .unwrap();
        let matches = pm.find(&SimpleTokenizer.tokenize("pain, more pain"));
        assert_eq!(matches.len(), 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
