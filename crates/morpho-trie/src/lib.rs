//! Arena-backed prefix trie over symbol sequences.
//!
//! Every key is a sequence of [`Symbol`]s. A symbol is an arbitrary string, so
//! the same structure serves letter tries (one character per symbol) and chunk
//! tries (one morpheme per symbol); a single character is just a length-1
//! chunk. Nodes live in a `Vec` and are addressed by [`NodeId`], which stays
//! stable across structural edits, so callers can snapshot ids and keep
//! mutating the trie without invalidating them.
//!
//! ```rust
//! use morpho_trie::{PrefixTrie, char_symbols};
//!
//! let mut trie = PrefixTrie::new();
//! trie.insert(&char_symbols("walk"));
//! trie.insert(&char_symbols("walks"));
//! assert!(trie.contains(&["w", "a", "l", "k"]));
//! assert_eq!(trie.count_matches(&["w", "a"]), 2);
//! assert!(trie.lookup(&["x"]).is_err());
//! ```

use std::collections::BTreeMap;

use thiserror::Error;

/// One edge label: a character or a whole chunk.
pub type Symbol = String;

/// Stable handle to a node inside one [`PrefixTrie`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(usize);


#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum TrieError {
    #[error("no entry with prefix {path:?}")]
    NotFound { path: Vec<Symbol> },
}

#[derive(Clone, Debug, Default)]
struct Node {
    children: BTreeMap<Symbol, NodeId>,
    terminal: bool,
}

/// Prefix trie owning its node arena. `Clone` is a deep, independent copy.
#[derive(Clone, Debug)]
pub struct PrefixTrie {
    nodes: Vec<Node>,
}

impl Default for PrefixTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl PrefixTrie {
    const ROOT: NodeId = NodeId(0);

    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    /// Insert a sequence, marking its last node as a completed entry.
    ///
    /// Inserting the same sequence twice leaves the trie unchanged.
    pub fn insert<S: AsRef<str>>(&mut self, path: &[S]) -> NodeId {
        let mut current = Self::ROOT;
        for symbol in path {
            current = self.child_or_insert(current, symbol.as_ref());
        }
        self.nodes[current.0].terminal = true;
        current
    }

    /// Resolve `path` from the root.
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Result<NodeId, TrieError> {
        self.lookup_from(Self::ROOT, path)
    }

    /// Resolve `path` relative to `start`.
    pub fn lookup_from<S: AsRef<str>>(
        &self,
        start: NodeId,
        path: &[S],
    ) -> Result<NodeId, TrieError> {
        let mut current = start;
        for symbol in path {
            match self.child(current, symbol.as_ref()) {
                Some(next) => current = next,
                None => {
                    return Err(TrieError::NotFound {
                        path: path.iter().map(|s| s.as_ref().to_string()).collect(),
                    });
                }
            }
        }
        Ok(current)
    }

    /// True iff `path` was inserted as a complete entry.
    pub fn contains<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.lookup(path)
            .map(|node| self.is_terminal(node))
            .unwrap_or(false)
    }

    pub fn child(&self, node: NodeId, symbol: &str) -> Option<NodeId> {
        self.nodes
            .get(node.0)
            .and_then(|n| n.children.get(symbol))
            .copied()
    }

    /// Children of `node` in symbol order.
    pub fn children(&self, node: NodeId) -> impl DoubleEndedIterator<Item = (&str, NodeId)> + '_ {
        self.nodes[node.0]
            .children
            .iter()
            .map(|(symbol, id)| (symbol.as_str(), *id))
    }

    pub fn child_count(&self, node: NodeId) -> usize {
        self.nodes[node.0].children.len()
    }

    pub fn is_terminal(&self, node: NodeId) -> bool {
        self.nodes[node.0].terminal
    }

    pub fn root_symbols(&self) -> impl Iterator<Item = &str> + '_ {
        self.children(Self::ROOT).map(|(symbol, _)| symbol)
    }

    /// Every completed entry starting with `prefix`, as full paths from the root.
    ///
    /// An absent prefix yields nothing.
    pub fn prefixed<S: AsRef<str>>(&self, prefix: &[S]) -> Prefixed<'_> {
        let prefix: Vec<Symbol> = prefix.iter().map(|s| s.as_ref().to_string()).collect();
        match self.lookup(&prefix[..]) {
            Ok(node) => Prefixed::new(self, node, prefix),
            Err(_) => Prefixed::empty(self),
        }
    }

    /// Every completed entry below `node`, as paths relative to it.
    pub fn completions_below(&self, node: NodeId) -> Prefixed<'_> {
        Prefixed::new(self, node, Vec::new())
    }

    /// Every completed entry in the trie.
    pub fn entries(&self) -> Prefixed<'_> {
        self.completions_below(Self::ROOT)
    }

    /// Number of completed entries below `path`; zero when the path is absent.
    pub fn count_matches<S: AsRef<str>>(&self, path: &[S]) -> usize {
        self.lookup(path)
            .map(|node| self.count_below(node))
            .unwrap_or(0)
    }

    /// Number of completed entries at or below `node`.
    pub fn count_below(&self, node: NodeId) -> usize {
        let mut count = 0;
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let n = &self.nodes[id.0];
            if n.terminal {
                count += 1;
            }
            stack.extend(n.children.values().copied());
        }
        count
    }

    /// Number of completed entries.
    pub fn len(&self) -> usize {
        self.count_below(Self::ROOT)
    }

    pub fn is_empty(&self) -> bool {
        let root = &self.nodes[Self::ROOT.0];
        root.children.is_empty() && !root.terminal
    }

    /// Number of nodes reachable from the root, the root included.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            count += 1;
            stack.extend(self.nodes[id.0].children.values().copied());
        }
        count
    }

    /// Depth of every completed entry, in the same order as [`entries`](Self::entries).
    pub fn terminal_depths(&self) -> TerminalDepths<'_> {
        TerminalDepths {
            trie: self,
            stack: vec![(Self::ROOT, 0)],
        }
    }

    /// Every edge label reachable from the root.
    pub fn edge_symbols(&self) -> impl Iterator<Item = &str> + '_ {
        let mut stack = vec![Self::ROOT];
        let mut pending: Vec<&str> = Vec::new();
        std::iter::from_fn(move || {
            loop {
                if let Some(symbol) = pending.pop() {
                    return Some(symbol);
                }
                let id = stack.pop()?;
                for (symbol, child) in self.nodes[id.0].children.iter().rev() {
                    pending.push(symbol.as_str());
                    stack.push(*child);
                }
            }
        })
    }

    /// Detach the child of `parent` labelled `symbol`, returning its subtree id.
    ///
    /// The detached nodes stay in the arena but are no longer reachable.
    pub fn remove_child(&mut self, parent: NodeId, symbol: &str) -> Option<NodeId> {
        self.nodes[parent.0].children.remove(symbol)
    }

    /// Move the subtree at `from -> symbol` so that it hangs off `to` as `new_symbol`.
    ///
    /// If `to` already has a child called `new_symbol`, the two subtrees are
    /// unioned so no completed entry is lost. `to` must not lie inside the
    /// moved subtree. Returns false when `from` has no such child.
    pub fn move_child(&mut self, from: NodeId, symbol: &str, to: NodeId, new_symbol: &str) -> bool {
        let Some(subtree) = self.remove_child(from, symbol) else {
            return false;
        };
        self.attach_child(to, new_symbol, subtree);
        true
    }

    /// Hang a detached subtree off `parent`, unioning with an existing child.
    pub fn attach_child(&mut self, parent: NodeId, symbol: &str, subtree: NodeId) {
        match self.child(parent, symbol) {
            Some(existing) if existing == subtree => {}
            Some(existing) => self.union_into(existing, subtree),
            None => {
                self.nodes[parent.0]
                    .children
                    .insert(symbol.to_string(), subtree);
            }
        }
    }

    fn union_into(&mut self, target: NodeId, source: NodeId) {
        let mut stack = vec![(target, source)];
        while let Some((into, from)) = stack.pop() {
            if self.nodes[from.0].terminal {
                self.nodes[into.0].terminal = true;
            }
            let moved = std::mem::take(&mut self.nodes[from.0].children);
            for (symbol, child) in moved {
                match self.nodes[into.0].children.get(&symbol).copied() {
                    Some(existing) => stack.push((existing, child)),
                    None => {
                        self.nodes[into.0].children.insert(symbol, child);
                    }
                }
            }
        }
    }

    fn child_or_insert(&mut self, parent: NodeId, symbol: &str) -> NodeId {
        if let Some(existing) = self.child(parent, symbol) {
            return existing;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::default());
        self.nodes[parent.0].children.insert(symbol.to_string(), id);
        id
    }
}

/// Split a word into one symbol per character.
pub fn char_symbols(word: &str) -> Vec<Symbol> {
    word.chars().map(String::from).collect()
}

/// Lazy depth-first enumeration of completed entries.
///
/// Entries come out in symbol order, shorter entries before their extensions.
/// Cloning the iterator before advancing it restarts the enumeration.
#[derive(Clone, Debug)]
pub struct Prefixed<'a> {
    trie: &'a PrefixTrie,
    stack: Vec<(NodeId, Vec<Symbol>)>,
}

impl<'a> Prefixed<'a> {
    fn new(trie: &'a PrefixTrie, node: NodeId, prefix: Vec<Symbol>) -> Self {
        Self {
            trie,
            stack: vec![(node, prefix)],
        }
    }

    fn empty(trie: &'a PrefixTrie) -> Self {
        Self {
            trie,
            stack: Vec::new(),
        }
    }
}

impl Iterator for Prefixed<'_> {
    type Item = Vec<Symbol>;

    fn next(&mut self) -> Option<Self::Item> {
        let trie = self.trie;
        while let Some((node, path)) = self.stack.pop() {
            for (symbol, child) in trie.children(node).rev() {
                let mut extended = path.clone();
                extended.push(symbol.to_string());
                self.stack.push((child, extended));
            }
            if trie.is_terminal(node) {
                return Some(path);
            }
        }
        None
    }
}

/// Lazy depth of every completed entry.
#[derive(Clone, Debug)]
pub struct TerminalDepths<'a> {
    trie: &'a PrefixTrie,
    stack: Vec<(NodeId, usize)>,
}

impl Iterator for TerminalDepths<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let trie = self.trie;
        while let Some((node, depth)) = self.stack.pop() {
            for (_, child) in trie.children(node).rev() {
                self.stack.push((child, depth + 1));
            }
            if trie.is_terminal(node) {
                return Some(depth);
            }
        }
        None
    }
}
