//! Overlap pruning.
//!
//! Matches from different engines are compared on token intervals only. The
//! `longest` strategy walks the `(start, end)`-sorted list with one "current"
//! match; when current and the next candidate overlap, the longer one is kept
//! (current wins ties) and the walk jumps to the match after the candidate.
//!
//! ```text
//! sorted:  A[0,3)  B[2,6)  C[5,9)
//! pass 1:  A~B -> keep B, current = C, end  => [B, C]
//! pass 2:  B~C -> tie, keep B (seen first)  => [B]
//! pass 3:  nothing to compare               => [B]   (fixpoint)
//! ```
//!
//! Because the walk skips ahead after a collision, the kept match is never
//! compared with the following one in the same pass. Passes therefore repeat
//! until one removes nothing. Every repeated pass removes at least one match,
//! so the number of passes is bounded by the input length.
//!
//! This is a greedy, pairwise policy. It guarantees that no two survivors
//! overlap, not that the survivors cover the most tokens.

use super::metrics::PruneMetrics;
use crate::Match;
use crate::error::{MatchError, Result};
use std::str::FromStr;
use std::time::Instant;

/// Policy for choosing between overlapping matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PruneStrategy {
    /// Keep the match covering more tokens; the earlier one on ties.
    #[default]
    Longest,
}

impl FromStr for PruneStrategy {
    type Err = MatchError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "longest" => Ok(PruneStrategy::Longest),
            other => Err(MatchError::UnsupportedStrategy(other.to_string())),
        }
    }
}

/// True when either match has a boundary inside the other's interval.
///
/// Matches that only touch (`a.end == b.start`) do not overlap.
pub fn overlaps(a: &Match, b: &Match) -> bool {
    starts_or_ends_within(a, b) || starts_or_ends_within(b, a)
}

fn starts_or_ends_within(a: &Match, b: &Match) -> bool {
    (b.start() <= a.start() && a.start() < b.end()) || (b.start() < a.end() && a.end() <= b.end())
}

/// Prune `matches` with the strategy named `strategy`.
///
/// The strategy is validated before any work: only `"longest"` is accepted.
pub fn prune_overlapping_matches(matches: &[Match], strategy: &str) -> Result<Vec<Match>> {
    match strategy.parse::<PruneStrategy>()? {
        PruneStrategy::Longest => Ok(prune_longest(matches)),
    }
}

/// Prune `matches` with the longest-span-wins policy, repeated to a fixpoint.
pub fn prune_longest(matches: &[Match]) -> Vec<Match> {
    prune_longest_with_metrics(matches).0
}

pub(crate) fn prune_longest_with_metrics(matches: &[Match]) -> (Vec<Match>, PruneMetrics) {
    let started = Instant::now();
    let mut metrics = PruneMetrics::default();
    if matches.is_empty() {
        return (Vec::new(), metrics);
    }

    let mut current = matches.to_vec();
    loop {
        let before = current.len();
        current = prune_pass(current);
        metrics.passes += 1;
        log::trace!(target: "unimatch::prune", "pass {}: {} -> {} matches", metrics.passes, before, current.len());
        if current.len() == before {
            break;
        }
    }

    metrics.removed = matches.len() - current.len();
    metrics.duration = started.elapsed();
    (current, metrics)
}

/// One left-to-right sweep over the sorted matches.
fn prune_pass(mut matches: Vec<Match>) -> Vec<Match> {
    // stable: equal intervals keep their encounter order
    matches.sort_by_key(|m| (m.start(), m.end()));

    let mut pruned = Vec::with_capacity(matches.len());
    let mut rest = matches.into_iter();
    let Some(mut current) = rest.next() else {
        return pruned;
    };

    loop {
        let Some(candidate) = rest.next() else {
            pruned.push(current);
            break;
        };
        if overlaps(&current, &candidate) {
            let longer = if candidate.len() > current.len() { candidate } else { current };
            pruned.push(longer);
            match rest.next() {
                Some(next) => current = next,
                None => break,
            }
        } else {
            pruned.push(current);
            current = candidate;
        }
    }
    pruned
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn m(id: &str, start: usize, end: usize) -> Match {
        Match::new(id, start, end)
    }

    fn triples(matches: &[Match]) -> Vec<(&str, usize, usize)> {
        matches.iter().map(|m| (m.rule_id().as_str(), m.start(), m.end())).collect()
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(prune_longest(&[]).is_empty());
        assert!(prune_overlapping_matches(&[], "longest").unwrap().is_empty());
    }

    #[test]
    fn overlap_test_is_symmetric_and_excludes_touching() {
        assert!(overlaps(&m("a", 0, 3), &m("b", 2, 5)));
        assert!(overlaps(&m("a", 2, 5), &m("b", 0, 3)));
        assert!(overlaps(&m("a", 2, 8), &m("b", 3, 5)));
        assert!(overlaps(&m("a", 3, 5), &m("b", 2, 8)));
        assert!(overlaps(&m("a", 1, 4), &m("b", 1, 4)));
        assert!(!overlaps(&m("a", 0, 3), &m("b", 3, 5)));
        assert!(!overlaps(&m("a", 3, 5), &m("b", 0, 3)));
    }

    #[test]
    fn touching_matches_both_survive() {
        let out = prune_longest(&[m("r1", 0, 3), m("r2", 3, 5)]);
        assert_eq!(triples(&out), vec![("r1", 0, 3), ("r2", 3, 5)]);
    }

    #[test]
    fn nested_match_is_dropped() {
        let out = prune_longest(&[m("r1", 2, 8), m("r2", 3, 5)]);
        assert_eq!(triples(&out), vec![("r1", 2, 8)]);
        let out = prune_longest(&[m("r2", 3, 5), m("r1", 2, 8)]);
        assert_eq!(triples(&out), vec![("r1", 2, 8)]);
    }

    #[test]
    fn chained_overlaps_collapse_over_several_passes() {
        let input = [m("r1", 0, 3), m("r2", 2, 6), m("r3", 5, 9)];
        let (out, metrics) = prune_longest_with_metrics(&input);
        assert_eq!(triples(&out), vec![("r2", 2, 6)]);
        assert_eq!(metrics.passes, 3);
        assert_eq!(metrics.removed, 2);
    }

    #[test]
    fn equal_length_ties_keep_the_first_in_sorted_order() {
        let out = prune_longest(&[m("late", 1, 4), m("early", 0, 3)]);
        assert_eq!(triples(&out), vec![("early", 0, 3)]);

        // identical intervals keep encounter order
        let out = prune_longest(&[m("token", 0, 2), m("phrase", 0, 2)]);
        assert_eq!(triples(&out), vec![("token", 0, 2)]);
    }

    #[test]
    fn kept_match_skips_comparison_with_the_next_in_the_same_pass() {
        // pass 1 keeps [0,5) from the first collision and jumps to [4,6),
        // leaving them overlapping until pass 2
        let input = [m("a", 0, 2), m("b", 0, 5), m("c", 4, 6), m("d", 7, 8)];
        let (out, metrics) = prune_longest_with_metrics(&input);
        assert_eq!(triples(&out), vec![("b", 0, 5), ("d", 7, 8)]);
        assert_eq!(metrics.passes, 3);
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let input = [m("r1", 0, 3), m("r2", 1, 2)];
        let err = prune_overlapping_matches(&input, "shortest").unwrap_err();
        assert!(matches!(err, MatchError::UnsupportedStrategy(ref s) if s == "shortest"));
        assert_eq!(triples(&input), vec![("r1", 0, 3), ("r2", 1, 2)]);
    }

    fn arb_matches() -> impl Strategy<Value = Vec<Match>> {
        prop::collection::vec((0usize..4, 0usize..30, 1usize..8), 0..24).prop_map(|raw| {
            raw.into_iter().map(|(rule, start, len)| Match::new(format!("r{rule}").as_str(), start, start + len)).collect()
        })
    }

    proptest! {
        #[test]
        fn pruned_output_never_overlaps(input in arb_matches()) {
            let out = prune_longest(&input);
            for (i, a) in out.iter().enumerate() {
                for b in &out[i + 1..] {
                    prop_assert!(!overlaps(a, b), "{a:?} overlaps {b:?}");
                }
            }
        }

        #[test]
        fn pruning_is_idempotent(input in arb_matches()) {
            let once = prune_longest(&input);
            let twice = prune_longest(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn survivors_come_from_the_input(input in arb_matches()) {
            let out = prune_longest(&input);
            prop_assert!(out.len() <= input.len());
            prop_assert!(out.iter().all(|m| input.contains(m)));
            prop_assert!(input.is_empty() || !out.is_empty());
        }

        #[test]
        fn passes_are_bounded_by_input_size(input in arb_matches()) {
            let (_, metrics) = prune_longest_with_metrics(&input);
            prop_assert!(metrics.passes <= input.len().max(1));
        }
    }
}
