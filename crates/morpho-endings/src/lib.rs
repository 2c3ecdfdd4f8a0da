//! Ending discovery from word co-occurrence.
//!
//! Words seen together in a short context window are treated as mutual
//! evidence: each word contributes a candidate ending to the other's
//! [`EndingTrie`]. Each trie is then collapsed, merging single characters into
//! stable ending chunks and pruning chunks with too few successors, and the
//! [`StemEndingCounter`] ranks the surviving endings per stem, either by how
//! dominant the top ending is or by how distinctive each ending is across
//! stems.
//!
//! The heuristics that were never settled on a single formula are exposed as
//! [`policy`] enums and chosen at construction time.
//!
//! ```rust
//! use morpho_endings::{CounterConfig, StemEndingCounter};
//!
//! # fn main() -> Result<(), morpho_endings::EndingError> {
//! let mut counter = StemEndingCounter::new(CounterConfig::default());
//! counter.add_window(&["run", "running", "runs"]);
//! counter.collapse_all();
//! let ranked = counter.rank_by_dominance()?;
//! let run = ranked.iter().find(|row| row.stem == "run").unwrap();
//! assert_eq!(run.dominance, 0.5);
//! # Ok(()) }
//! ```

pub mod counter;
pub mod ending_trie;
pub mod policy;
pub mod window;

pub use counter::{
    CollapseSummary, CounterConfig, DominanceRow, ScoredEnding, StemEndingCounter, UniquenessRow,
    candidate_ending,
};
pub use ending_trie::{CollapseReport, EndingTrie};
pub use policy::{AssociationMetric, CollapsePolicy, Cutoff, MergeThreshold, UniquenessMetric};
pub use window::{WindowLength, group_windows, windows};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EndingError {
    #[error("degenerate input: {0}")]
    DegenerateInput(&'static str),
    #[error("invalid window length: {0}")]
    InvalidWindow(String),
}

/// Restore reading order of a reversed ending.
pub(crate) fn unreverse(ending: &str) -> String {
    ending.chars().rev().collect()
}
