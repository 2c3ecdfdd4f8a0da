use std::fmt;

use morpho_trie::{NodeId, PrefixTrie, Prefixed, Symbol, TerminalDepths};

/// Reading direction a chunk trie was built in.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Direction {
    Forward,
    Reverse,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Forward => "left-to-right",
            Direction::Reverse => "right-to-left",
        })
    }
}

/// Prefix trie whose edges are morphemes rather than characters.
///
/// Reverse tries store their chunks in reversed spelling, exactly as built
/// from the reversed letter trie; the query helpers convert back to reading
/// order.
#[derive(Clone, Debug)]
pub struct ChunkTrie {
    trie: PrefixTrie,
    direction: Direction,
}

impl ChunkTrie {
    /// Rewrite a letter trie into maximal unambiguous chunks.
    ///
    /// A node with a single child continues the current chunk. A node that
    /// branches or ends a word closes it; every child of a branch starts a
    /// fresh chunk.
    pub fn from_letters(letters: &PrefixTrie, direction: Direction) -> Self {
        let mut trie = PrefixTrie::new();
        let mut stack: Vec<(NodeId, Vec<Symbol>, String)> =
            vec![(letters.root(), Vec::new(), String::new())];

        while let Some((start, mut chunks, mut chunk)) = stack.pop() {
            let mut node = start;
            while !letters.is_terminal(node) && letters.child_count(node) == 1 {
                let Some((symbol, next)) = letters.children(node).next() else {
                    break;
                };
                chunk.push_str(symbol);
                node = next;
            }

            if !chunk.is_empty() {
                chunks.push(chunk);
            }
            if letters.is_terminal(node) {
                trie.insert(&chunks);
            }
            for (symbol, child) in letters.children(node).rev() {
                stack.push((child, chunks.clone(), symbol.to_string()));
            }
        }

        Self { trie, direction }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn trie(&self) -> &PrefixTrie {
        &self.trie
    }

    pub fn word_count(&self) -> usize {
        self.trie.len()
    }

    /// Length in characters of the shortest root chunk; zero for an empty trie.
    pub fn min_stem_len(&self) -> usize {
        self.trie
            .root_symbols()
            .map(|stem| stem.chars().count())
            .min()
            .unwrap_or(0)
    }

    /// Segments of `word` in reading order, or `None` when the trie lacks it.
    pub fn morphemes_for(&self, word: &str) -> Option<Vec<String>> {
        let spelled: Vec<char> = match self.direction {
            Direction::Forward => word.chars().collect(),
            Direction::Reverse => word.chars().rev().collect(),
        };
        let mut len = self.min_stem_len();
        if len == 0 {
            return None;
        }

        let root = self.trie.root();
        let stem = loop {
            if len > spelled.len() {
                return None;
            }
            let candidate: String = spelled[..len].iter().collect();
            if self.trie.child(root, &candidate).is_some() {
                break candidate;
            }
            len += 1;
        };

        let target: String = spelled.iter().collect();
        let found = self
            .trie
            .prefixed(&[stem])
            .find(|chunks| chunks.concat() == target)?;
        Some(self.reading_order(found))
    }

    /// Chunk count of every word.
    pub fn morpheme_count_per_word(&self) -> TerminalDepths<'_> {
        self.trie.terminal_depths()
    }

    /// Every chunk path (stem plus suffix chain) as stored.
    pub fn all_morphemes(&self) -> Prefixed<'_> {
        self.trie.entries()
    }

    /// Every chunk path in reading order.
    pub fn display_segments(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.all_morphemes().map(|chunks| self.reading_order(chunks))
    }

    /// Whether any edge carries `morpheme`, spelled in reading order.
    pub fn contains_morpheme(&self, morpheme: &str) -> bool {
        let stored = match self.direction {
            Direction::Forward => morpheme.to_string(),
            Direction::Reverse => morpheme.chars().rev().collect(),
        };
        self.trie.edge_symbols().any(|symbol| symbol == stored)
    }

    fn reading_order(&self, chunks: Vec<Symbol>) -> Vec<String> {
        match self.direction {
            Direction::Forward => chunks,
            Direction::Reverse => chunks
                .iter()
                .rev()
                .map(|chunk| chunk.chars().rev().collect())
                .collect(),
        }
    }
}
