//! Load word corpora for segmentation and ending discovery.
//!
//! Three on-disk shapes are understood:
//! - word lists, one word per line;
//! - count files (`.dx1`), `word<whitespace>count` per line with `#` comments;
//! - running text, split into `\w+`-style tokens.
//!
//! Every word is lowercase-folded on the way in. Callers choose between
//! memory-mapped files or owned buffers at runtime via [`LoadMode`].
//!
//! # Example
//! ```no_run
//! use morpho_corpus::{Corpus, LoadMode};
//!
//! # fn main() -> anyhow::Result<()> {
//! let corpus = Corpus::load("corpora/english.dx1", None, LoadMode::Mmap)?;
//! println!("{} distinct words", corpus.len());
//! for word in corpus.sorted_words(4) {
//!     println!("{word}");
//! }
//! # Ok(()) }
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use memmap2::Mmap;
use tracing::{info, trace};

/// Strategy for loading corpus files.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LoadMode {
    /// Memory-map the file (fast, zero-copy).
    #[default]
    Mmap,
    /// Read the file into an owned buffer (portable fallback).
    Owned,
}

enum Buffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Mmap(m) => m.as_ref(),
            Buffer::Owned(v) => v.as_slice(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CorpusFormat {
    WordList,
    Counts,
    Text,
}

impl CorpusFormat {
    /// `.dx1` and `.tsv` files hold counts; anything else is a word list.
    pub fn detect(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("dx1") | Some("tsv") => CorpusFormat::Counts,
            _ => CorpusFormat::WordList,
        }
    }
}

/// Ordering used when writing a count file.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CountOrder {
    /// Highest count first, ties alphabetical.
    #[default]
    MostCommon,
    Alphabetical,
}

/// Word to occurrence-count mapping.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Corpus {
    words: BTreeMap<String, u64>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path`, detecting the format from its extension unless one is given.
    pub fn load(
        path: impl AsRef<Path>,
        format: Option<CorpusFormat>,
        mode: LoadMode,
    ) -> Result<Self> {
        let path = path.as_ref();
        let format = format.unwrap_or_else(|| CorpusFormat::detect(path));
        let corpus = with_text(path, mode, |text| match format {
            CorpusFormat::WordList => Self::parse_word_list(text),
            CorpusFormat::Counts => Self::parse_counts(text),
            CorpusFormat::Text => Self::parse_text(text),
        })?;
        info!(
            "loaded {} distinct words ({} occurrences) from {} as {:?}",
            corpus.len(),
            corpus.total_occurrences(),
            path.display(),
            format
        );
        Ok(corpus)
    }

    /// One occurrence per item.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut corpus = Self::new();
        for word in words {
            corpus.add(word.as_ref(), 1);
        }
        corpus
    }

    pub fn parse_word_list(text: &str) -> Self {
        Self::from_words(text.lines().map(str::trim).filter(|l| !l.is_empty()))
    }

    /// Parse `word<whitespace>count` lines, skipping comments and malformed lines.
    pub fn parse_counts(text: &str) -> Self {
        let mut corpus = Self::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, char::is_whitespace);
            let (Some(word), Some(count)) = (parts.next(), parts.next()) else {
                trace!("skipping line {}: no count", lineno + 1);
                continue;
            };
            let word = word.trim();
            match count.trim().parse::<u64>() {
                Ok(count) if !word.is_empty() => corpus.add(word, count),
                _ => trace!("skipping line {}: malformed count", lineno + 1),
            }
        }
        corpus
    }

    pub fn parse_text(text: &str) -> Self {
        Self::from_words(tokenize(text))
    }

    /// Add `count` occurrences of `word`, lowercase-folded.
    pub fn add(&mut self, word: &str, count: u64) {
        *self.words.entry(word.to_lowercase()).or_insert(0) += count;
    }

    /// Sum the counts of `other` into this corpus.
    pub fn merge(&mut self, other: &Corpus) {
        for (word, count) in &other.words {
            *self.words.entry(word.clone()).or_insert(0) += count;
        }
    }

    pub fn count(&self, word: &str) -> u64 {
        self.words.get(word).copied().unwrap_or(0)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn total_occurrences(&self) -> u64 {
        self.words.values().sum()
    }

    /// Words with their counts, alphabetical.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.words.iter().map(|(w, &c)| (w.as_str(), c))
    }

    /// Distinct words of at least `min_len` characters, sorted.
    pub fn sorted_words(&self, min_len: usize) -> Vec<String> {
        self.words
            .keys()
            .filter(|w| w.chars().count() >= min_len)
            .cloned()
            .collect()
    }

    pub fn most_common(&self) -> Vec<(&str, u64)> {
        let mut items: Vec<(&str, u64)> = self.iter().collect();
        items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        items
    }

    /// Write a count file: `#` header lines, then `word\tcount` per line.
    pub fn write_counts<W: Write>(
        &self,
        out: &mut W,
        order: CountOrder,
        header: &[String],
    ) -> Result<()> {
        for line in header {
            writeln!(out, "# {line}").context("write count file header")?;
        }
        let items = match order {
            CountOrder::MostCommon => self.most_common(),
            CountOrder::Alphabetical => self.iter().collect(),
        };
        for (word, count) in items {
            writeln!(out, "{word}\t{count}").context("write count file line")?;
        }
        Ok(())
    }
}

/// Split running text into lowercase runs of alphanumeric or `_` characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Tokens of a running-text file, in order.
pub fn load_tokens(path: impl AsRef<Path>, mode: LoadMode) -> Result<Vec<String>> {
    let path = path.as_ref();
    let tokens = with_text(path, mode, tokenize)?;
    info!("read {} tokens from {}", tokens.len(), path.display());
    Ok(tokens)
}

/// Run `f` over the file contents, borrowed straight from the backing buffer.
fn with_text<T>(path: &Path, mode: LoadMode, f: impl FnOnce(&str) -> T) -> Result<T> {
    let buffer = load_file(path, mode)?;
    let text = std::str::from_utf8(buffer.as_slice())
        .with_context(|| format!("{} is not valid UTF-8", path.display()))?;
    Ok(f(text))
}

fn load_file(path: &Path, mode: LoadMode) -> Result<Buffer> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    match mode {
        LoadMode::Mmap => {
            // Empty files cannot be mapped on every platform.
            let len = file
                .metadata()
                .with_context(|| format!("stat {}", path.display()))?
                .len();
            if len == 0 {
                return Ok(Buffer::Owned(Vec::new()));
            }
            unsafe { Mmap::map(&file) }
                .map(Buffer::Mmap)
                .with_context(|| format!("mmap {}", path.display()))
        }
        LoadMode::Owned => {
            let mut file = file;
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)
                .with_context(|| format!("read {}", path.display()))?;
            Ok(Buffer::Owned(buf))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_skip_comments_and_garbage() {
        let corpus =
            Corpus::parse_counts("# author\nWalk\t3\nwalks 2\n\nbroken\nwalk\t1\nbad\tx\n");
        assert_eq!(corpus.count("walk"), 4);
        assert_eq!(corpus.count("walks"), 2);
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.total_occurrences(), 6);
    }

    #[test]
    fn counts_accept_indented_lines() {
        let corpus = Corpus::parse_counts("  walk\t3\n\twalks 2\n   # note\n");
        assert_eq!(corpus.count("walk"), 3);
        assert_eq!(corpus.count("walks"), 2);
        assert_eq!(corpus.len(), 2);
    }

    #[test]
    fn word_list_folds_case_and_skips_blanks() {
        let corpus = Corpus::parse_word_list("Run\n\n  runs \nrun\n");
        assert_eq!(corpus.count("run"), 2);
        assert_eq!(corpus.sorted_words(4), vec!["runs".to_string()]);
    }

    #[test]
    fn tokenizes_word_characters() {
        assert_eq!(
            tokenize("The cat's_toy, 2 dogs!"),
            vec!["the", "cat", "s_toy", "2", "dogs"]
        );
    }

    #[test]
    fn detects_format_from_extension() {
        assert_eq!(CorpusFormat::detect(Path::new("a.dx1")), CorpusFormat::Counts);
        assert_eq!(CorpusFormat::detect(Path::new("a.TSV")), CorpusFormat::Counts);
        assert_eq!(CorpusFormat::detect(Path::new("a.txt")), CorpusFormat::WordList);
    }

    #[test]
    fn merge_sums_counts() {
        let mut a = Corpus::parse_counts("run\t1\n");
        let b = Corpus::parse_counts("run\t2\nruns\t1\n");
        a.merge(&b);
        assert_eq!(a.count("run"), 3);
        assert_eq!(a.count("runs"), 1);
    }

    #[test]
    fn writes_most_common_first() {
        let corpus = Corpus::parse_text("b a b c b a");
        let mut out = Vec::new();
        corpus
            .write_counts(&mut out, CountOrder::MostCommon, &["from test".to_string()])
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "# from test\nb\t3\na\t2\nc\t1\n"
        );
    }
}
