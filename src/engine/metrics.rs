//! Match run metrics.
//!
//! - `Matcher::find` for normal operation.
//! - `Matcher::find_with_metrics` for profiling and rule debugging: it keeps
//!   the raw (unpruned) matches next to the final ones and times each stage.

use crate::Match;
use std::time::Duration;

bitflags::bitflags! {
    /// Engines that hold at least one registered pattern.
    ///
    /// The coordinator skips engines that are not in the set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EngineSet: u8 {
        const TOKEN  = 1 << 0;
        const PHRASE = 1 << 1;
        const REGEX  = 1 << 2;
    }
}

/// The three pattern engines, in the order their matches are concatenated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    Token,
    Phrase,
    Regex,
}

impl EngineKind {
    /// Fixed concatenation order.
    pub const ORDER: [EngineKind; 3] = [EngineKind::Token, EngineKind::Phrase, EngineKind::Regex];

    pub fn name(self) -> &'static str {
        match self {
            EngineKind::Token => "token",
            EngineKind::Phrase => "phrase",
            EngineKind::Regex => "regex",
        }
    }

    pub fn flag(self) -> EngineSet {
        match self {
            EngineKind::Token => EngineSet::TOKEN,
            EngineKind::Phrase => EngineSet::PHRASE,
            EngineKind::Regex => EngineSet::REGEX,
        }
    }
}

/// Timing and output size of one engine call.
#[derive(Debug, Clone)]
pub struct EngineMetrics {
    pub engine: EngineKind,
    pub duration: Duration,
    /// Raw matches reported by the engine.
    pub produced: usize,
}

/// Pruning statistics.
#[derive(Debug, Default, Clone)]
pub struct PruneMetrics {
    pub duration: Duration,
    /// Sweeps performed until the fixpoint (0 for empty input).
    pub passes: usize,
    /// Matches removed across all passes.
    pub removed: usize,
}

#[derive(Debug, Default, Clone)]
pub struct MatchMetrics {
    /// Total elapsed time for the run.
    pub total: Duration,
    /// One entry per engine that was invoked, in concatenation order.
    pub engines: Vec<EngineMetrics>,
    /// `None` when the matcher is configured not to prune.
    pub prune: Option<PruneMetrics>,
}

/// Matcher output bundled with the raw matches and timings.
#[derive(Debug, Clone)]
pub struct MatchRun {
    /// Concatenated engine output before pruning.
    pub raw: Vec<Match>,
    /// Final matches (pruned when pruning is enabled).
    pub matches: Vec<Match>,
    pub metrics: MatchMetrics,
}
