use std::collections::BTreeSet;

use morpho_trie::{PrefixTrie, Symbol};
use tracing::{debug, info};

use crate::SegmentError;
use crate::chunk_trie::{ChunkTrie, Direction};

/// Builds forward and reverse chunk tries for a word list.
#[derive(Clone, Copy, Debug)]
pub struct MorphemeSegmenter {
    min_stem_len: usize,
}

/// Result of segmenting one corpus in both reading directions.
#[derive(Clone, Debug)]
pub struct Segmentation {
    pub forward: ChunkTrie,
    pub reverse: ChunkTrie,
    /// Words dropped for being shorter than the minimal stem length.
    pub skipped: usize,
}

impl MorphemeSegmenter {
    pub fn new(min_stem_len: usize) -> Result<Self, SegmentError> {
        if min_stem_len == 0 {
            return Err(SegmentError::InvalidStemLength(min_stem_len));
        }
        Ok(Self { min_stem_len })
    }

    pub fn min_stem_len(&self) -> usize {
        self.min_stem_len
    }

    /// Letter tries keyed by `[first k chars, each remaining char]`, forward and reversed.
    pub fn letter_tries<I, S>(&self, words: I) -> (PrefixTrie, PrefixTrie, usize)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut skipped = 0usize;
        let mut sorted = BTreeSet::new();
        for word in words {
            let word = word.as_ref();
            if word.chars().count() < self.min_stem_len {
                skipped += 1;
                continue;
            }
            sorted.insert(word.to_string());
        }
        if skipped > 0 {
            debug!("skipped {skipped} words shorter than {} characters", self.min_stem_len);
        }

        let mut forward = PrefixTrie::new();
        let mut reverse = PrefixTrie::new();
        for word in &sorted {
            forward.insert(&stem_key(word, self.min_stem_len));
            let reversed: String = word.chars().rev().collect();
            reverse.insert(&stem_key(&reversed, self.min_stem_len));
        }
        (forward, reverse, skipped)
    }

    pub fn segment<I, S>(&self, words: I) -> Segmentation
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (forward_letters, reverse_letters, skipped) = self.letter_tries(words);
        let forward = ChunkTrie::from_letters(&forward_letters, Direction::Forward);
        let reverse = ChunkTrie::from_letters(&reverse_letters, Direction::Reverse);
        info!(
            "segmented {} words (k = {}): {} forward chunk paths, {} reverse",
            forward_letters.len(),
            self.min_stem_len,
            forward.word_count(),
            reverse.word_count()
        );
        Segmentation {
            forward,
            reverse,
            skipped,
        }
    }
}

fn stem_key(word: &str, min_stem_len: usize) -> Vec<Symbol> {
    let mut chars = word.chars();
    let stem: String = chars.by_ref().take(min_stem_len).collect();
    std::iter::once(stem)
        .chain(chars.map(String::from))
        .collect()
}
