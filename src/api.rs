use crate::engine::{
    EngineKind, EngineMetrics, EngineSet, MatchMetrics, MatchRun, PatternEngine, PhraseMatcher, RegexMatcher,
    RegexOptions, TokenMatcher, prune_longest, prune_longest_with_metrics,
};
use crate::error::{MatchError, Result};
use crate::{Doc, Match, Rule, RuleId, RulePattern, SimpleTokenizer, TokenAttr, Tokenize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::time::Instant;


/// Options that affect registration and matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatcherOptions {
    /// Attribute literal phrases are compared on. Literals are lowercased
    /// before tokenization only when this is [`TokenAttr::Lower`].
    pub phrase_attr: TokenAttr,
    /// Prune overlapping matches in [`Matcher::find`].
    pub prune: bool,
    pub regex: RegexOptions,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        MatcherOptions { phrase_attr: TokenAttr::Lower, prune: true, regex: RegexOptions::default() }
    }
}

/// A labeled view of a match over a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span<'d> {
    doc: &'d Doc,
    /// Start token index (inclusive).
    pub start: usize,
    /// End token index (exclusive).
    pub end: usize,
    /// Category of the rule that produced the match, when labels were requested.
    pub label: Option<String>,
    /// Id of the rule that produced the match.
    pub rule_id: RuleId,
}

impl<'d> Span<'d> {
    pub fn doc(&self) -> &'d Doc {
        self.doc
    }

    /// Text covered by the span.
    pub fn text(&self) -> &'d str {
        self.doc.span_text(self.start, self.end)
    }
}

/// Registry of rules over three pattern engines, with overlap pruning.
///
/// Register rules with [`add`](Matcher::add), then call
/// [`find`](Matcher::find) on as many documents as needed:
///
/// ```
/// use unimatch::{Matcher, Rule, SimpleTokenizer, Tokenize};
///
/// let mut matcher = Matcher::default();
/// matcher.add([Rule::literal("NEGATION", "no history of"), Rule::literal("HISTORY", "history of")]).unwrap();
///
/// let doc = SimpleTokenizer.tokenize("No history of CHF");
/// let matches = matcher.find(&doc);
/// assert_eq!(matches.len(), 1);
/// assert_eq!(matches[0].rule_id().as_str(), "NEGATION_0");
/// ```
pub struct Matcher {
    options: MatcherOptions,
    tokenizer: Box<dyn Tokenize>,
    rules: Vec<Rule>,
    index: HashMap<RuleId, usize>,
    labels: BTreeSet<String>,
    /// Next registration sequence number; never reset.
    sequence: usize,
    engines: EngineSet,
    token_matcher: TokenMatcher,
    phrase_matcher: PhraseMatcher,
    regex_matcher: RegexMatcher,
}

impl Default for Matcher {
    fn default() -> Self {
        Matcher::new(MatcherOptions::default())
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("options", &self.options)
            .field("tokenizer", &"<tokenizer>")
            .field("rules", &self.rules.len())
            .field("labels", &self.labels)
            .field("engines", &self.engines)
            .finish()
    }
}

impl Matcher {
    /// Create a matcher that tokenizes literal phrases with [`SimpleTokenizer`].
    pub fn new(options: MatcherOptions) -> Self {
        Matcher::with_tokenizer(options, SimpleTokenizer)
    }

    /// Create a matcher that tokenizes literal phrases with `tokenizer`.
    ///
    /// Use the same tokenizer that produces the documents being matched, so
    /// phrase tokens line up with document tokens.
    pub fn with_tokenizer(options: MatcherOptions, tokenizer: impl Tokenize + 'static) -> Self {
        Matcher {
            options,
            tokenizer: Box::new(tokenizer),
            rules: Vec::new(),
            index: HashMap::new(),
            labels: BTreeSet::new(),
            sequence: 0,
            engines: EngineSet::empty(),
            token_matcher: TokenMatcher::new(),
            phrase_matcher: PhraseMatcher::new(options.phrase_attr),
            regex_matcher: RegexMatcher::new(options.regex),
        }
    }

    pub fn options(&self) -> &MatcherOptions {
        &self.options
    }

    /// Register `rules` in order.
    ///
    /// Each rule gets the id `"{category}_{n}"`, where `n` counts every rule
    /// this matcher has ever registered. The first failing rule aborts the
    /// call: rules before it stay registered, the failing rule and the ones
    /// after it are not registered and consume no sequence number.
    pub fn add<I>(&mut self, rules: I) -> Result<()>
    where
        I: IntoIterator<Item = Rule>,
    {
        for rule in rules {
            self.add_one(rule)?;
        }
        Ok(())
    }

    fn add_one(&mut self, mut rule: Rule) -> Result<()> {
        validate(&rule)?;

        let id = RuleId::new(rule.category(), self.sequence);
        let on_match = rule.callback().cloned();
        let engine = match rule.pattern() {
            RulePattern::Regex(source) => {
                self.regex_matcher.add(id.clone(), source.clone(), on_match)?;
                EngineKind::Regex
            }
            RulePattern::Tokens(pattern) => {
                self.token_matcher.add(id.clone(), pattern.clone(), on_match)?;
                EngineKind::Token
            }
            RulePattern::Literal(text) => {
                let phrase = if self.options.phrase_attr == TokenAttr::Lower {
                    self.tokenizer.tokenize(&text.to_lowercase())
                } else {
                    self.tokenizer.tokenize(text)
                };
                self.phrase_matcher.add(id.clone(), phrase, on_match)?;
                EngineKind::Phrase
            }
        };

        log::debug!(target: "unimatch::registry", "registered {} with the {} engine", id, engine.name());
        self.engines |= engine.flag();
        self.labels.insert(rule.category().to_string());
        rule.assign_id(id.clone());
        self.index.insert(id, self.rules.len());
        self.rules.push(rule);
        self.sequence += 1;
        Ok(())
    }

    /// Registered rules, in registration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Look up a rule by its id.
    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.index.get(id).map(|&i| &self.rules[i])
    }

    /// Mapping from rule id to rule.
    pub fn rule_map(&self) -> HashMap<&RuleId, &Rule> {
        self.index.iter().map(|(id, &i)| (id, &self.rules[i])).collect()
    }

    /// Categories of all registered rules.
    pub fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    /// Engines holding at least one rule.
    pub fn engines(&self) -> EngineSet {
        self.engines
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn engine(&self, kind: EngineKind) -> &dyn PatternEngineDyn {
        match kind {
            EngineKind::Token => &self.token_matcher,
            EngineKind::Phrase => &self.phrase_matcher,
            EngineKind::Regex => &self.regex_matcher,
        }
    }

    /// Matches from every engine, concatenated token -> phrase -> regex, unpruned.
    pub fn find_raw(&self, doc: &Doc) -> Vec<Match> {
        let mut matches = Vec::new();
        for kind in EngineKind::ORDER {
            if self.engines.contains(kind.flag()) {
                matches.extend(self.engine(kind).find_dyn(doc));
            }
        }
        matches
    }

    /// Matches for `doc`, pruned to non-overlapping spans unless the matcher
    /// was created with `prune: false`.
    pub fn find(&self, doc: &Doc) -> Vec<Match> {
        let matches = self.find_raw(doc);
        if self.options.prune { prune_longest(&matches) } else { matches }
    }

    /// Like [`find`](Matcher::find), but also returns the raw matches and timings.
    pub fn find_with_metrics(&self, doc: &Doc) -> MatchRun {
        let total_start = Instant::now();
        let mut metrics = MatchMetrics::default();
        let mut raw = Vec::new();

        for kind in EngineKind::ORDER {
            if !self.engines.contains(kind.flag()) {
                continue;
            }
            let started = Instant::now();
            let found = self.engine(kind).find_dyn(doc);
            metrics.engines.push(EngineMetrics { engine: kind, duration: started.elapsed(), produced: found.len() });
            raw.extend(found);
        }

        let matches = if self.options.prune {
            let (pruned, prune_metrics) = prune_longest_with_metrics(&raw);
            log::debug!(
                target: "unimatch::prune",
                "pruned {} -> {} matches in {} passes",
                raw.len(),
                pruned.len(),
                prune_metrics.passes
            );
            metrics.prune = Some(prune_metrics);
            pruned
        } else {
            raw.clone()
        };

        metrics.total = total_start.elapsed();
        MatchRun { raw, matches, metrics }
    }

    /// Materialize `matches` as spans over `doc`.
    ///
    /// With `set_label`, each span is labeled with the category of its rule,
    /// looked up by id in this matcher; ids this matcher never assigned are an
    /// error. Without it, spans carry no label and ids are not checked.
    pub fn to_spans<'d>(&self, doc: &'d Doc, matches: &[Match], set_label: bool) -> Result<Vec<Span<'d>>> {
        matches
            .iter()
            .map(|m| {
                if m.start() >= m.end() || m.end() > doc.len() {
                    return Err(MatchError::SpanOutOfRange { start: m.start(), end: m.end(), len: doc.len() });
                }
                let label = if set_label {
                    let rule =
                        self.rule(m.rule_id().as_str()).ok_or_else(|| MatchError::UnknownRule(m.rule_id().to_string()))?;
                    Some(rule.category().to_string())
                } else {
                    None
                };
                Ok(Span { doc, start: m.start(), end: m.end(), label, rule_id: m.rule_id().clone() })
            })
            .collect()
    }
}

fn validate(rule: &Rule) -> Result<()> {
    let reject = |reason: String| MatchError::InvalidRuleShape {
        category: rule.category().to_string(),
        kind: rule.pattern().kind(),
        reason,
    };
    if rule.category().trim().is_empty() {
        return Err(reject("category is empty".to_string()));
    }
    if let Some(id) = rule.rule_id() {
        return Err(reject(format!("rule is already registered as {id}")));
    }
    if rule.literal_text().is_some_and(|text| text.trim().is_empty()) {
        return Err(reject("literal text is empty".to_string()));
    }
    Ok(())
}

/// Object-safe view of [`PatternEngine`] used by the coordinator to walk the
/// engines uniformly (the associated `Pattern` type keeps the trait itself
/// from being used as `dyn`).
trait PatternEngineDyn {
    fn find_dyn(&self, doc: &Doc) -> Vec<Match>;
}

impl<E: PatternEngine> PatternEngineDyn for E {
    fn find_dyn(&self, doc: &Doc) -> Vec<Match> {
        self.find(doc)
    }
}
