//! Branch-point morpheme segmentation.
//!
//! Words are inserted into a letter trie (and an independent trie over their
//! reversed spelling) whose first symbol is the minimal stem. The letter trie
//! is then rewritten into a [`ChunkTrie`] whose edges are whole morphemes: a
//! morpheme boundary is declared exactly where the letter trie branches or a
//! word ends. The forward trie discovers prefixes and stems; the reverse one
//! performs the mirror-image suffix discovery.
//!
//! # How it works
//! 1. Drop words shorter than the minimal stem length `k`, sort, dedup.
//! 2. Insert `[word[..k], word[k], word[k+1], ...]` forward and reversed.
//! 3. Walk each letter trie, absorbing unambiguous continuations into one
//!    chunk and closing the chunk at branch points and word ends.
//! 4. Query segments per word, or derive [`stats`] over the trie pair.
//!
//! # Example
//! ```rust
//! use morpho_segment::MorphemeSegmenter;
//!
//! # fn main() -> Result<(), morpho_segment::SegmentError> {
//! let segmenter = MorphemeSegmenter::new(4)?;
//! let seg = segmenter.segment(["walking", "walked", "walks"]);
//! assert_eq!(
//!     seg.forward.morphemes_for("walking"),
//!     Some(vec!["walk".to_string(), "ing".to_string()])
//! );
//! # Ok(()) }
//! ```

mod chunk_trie;
mod segmenter;
pub mod stats;

pub use chunk_trie::{ChunkTrie, Direction};
pub use segmenter::{MorphemeSegmenter, Segmentation};
pub use stats::{CorpusReport, DirectionalStats, OccurrenceStats, StatsError, Summary};

use thiserror::Error;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum SegmentError {
    #[error("minimal stem length must be at least 1, got {0}")]
    InvalidStemLength(usize),
}
