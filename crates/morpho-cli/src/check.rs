//! How well stripping an ending predicts the rest of a corpus.
//!
//! Words carrying the ending are stripped to bare stems; every other word
//! that starts with one of those stems but lacks the ending counts as a
//! match for it.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

use anyhow::{Result, bail};
use serde::Serialize;

use morpho_corpus::Corpus;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EndingCheck {
    pub ending: String,
    /// Total occurrences in the corpus.
    pub corpus_size: u64,
    pub with_ending: u64,
    pub matched_without: u64,
    /// Bare stem to the words it matched.
    pub matches: BTreeMap<String, BTreeSet<String>>,
}

impl EndingCheck {
    pub fn with_ending_percent(&self) -> f64 {
        self.with_ending as f64 / self.corpus_size as f64 * 100.0
    }

    pub fn matched_percent(&self) -> f64 {
        self.matched_without as f64 / self.corpus_size as f64 * 100.0
    }

    pub fn write_text<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "length of corpus: {} words", self.corpus_size)?;
        writeln!(
            out,
            "words that end with {}: {} ({:.2}% of total)",
            self.ending,
            self.with_ending,
            self.with_ending_percent()
        )?;
        writeln!(
            out,
            "matching words without {}: {} ({:.2}% of total)",
            self.ending,
            self.matched_without,
            self.matched_percent()
        )?;
        for (stem, words) in &self.matches {
            let words: Vec<&str> = words.iter().map(String::as_str).collect();
            writeln!(out, "{stem}:\t{}", words.join(" "))?;
        }
        Ok(())
    }
}

pub fn check_ending(corpus: &Corpus, ending: &str) -> Result<EndingCheck> {
    let corpus_size = corpus.total_occurrences();
    if corpus_size == 0 {
        bail!("cannot check ending {ending:?} against an empty corpus");
    }

    let mut with_ending = 0;
    let mut stems = BTreeSet::new();
    for (word, count) in corpus.iter() {
        if word == ending {
            continue;
        }
        if let Some(stem) = word.strip_suffix(ending) {
            with_ending += count;
            stems.insert(stem.to_string());
        }
    }

    let mut matches: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut matched_words = BTreeSet::new();
    for (word, _) in corpus.iter().filter(|(w, _)| !w.ends_with(ending)) {
        for stem in stems.iter().filter(|s| word.starts_with(s.as_str())) {
            matches.entry(stem.clone()).or_default().insert(word.to_string());
            matched_words.insert(word);
        }
    }
    let matched_without = matched_words.iter().map(|w| corpus.count(w)).sum();

    Ok(EndingCheck {
        ending: ending.to_string(),
        corpus_size,
        with_ending,
        matched_without,
        matches,
    })
}
