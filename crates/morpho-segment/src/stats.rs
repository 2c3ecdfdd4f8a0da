//! Corpus-level statistics over a forward/reverse chunk trie pair.
//!
//! Every function refuses degenerate samples (no words, zero mean) with
//! [`StatsError::DegenerateInput`] instead of returning NaN or infinity.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::chunk_trie::ChunkTrie;
use crate::segmenter::Segmentation;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum StatsError {
    #[error("degenerate input: {0}")]
    DegenerateInput(&'static str),
}

/// Mean and population standard deviation of a sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub stdev: f64,
}

impl Summary {
    pub fn from_samples<I>(samples: I, what: &'static str) -> Result<Self, StatsError>
    where
        I: IntoIterator<Item = f64>,
    {
        let values: Vec<f64> = samples.into_iter().collect();
        if values.is_empty() {
            return Err(StatsError::DegenerateInput(what));
        }
        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        Ok(Self {
            count,
            mean,
            stdev: variance.sqrt(),
        })
    }

    /// `stdev / mean`.
    pub fn coefficient_of_variation(&self) -> Result<f64, StatsError> {
        if self.mean == 0.0 {
            return Err(StatsError::DegenerateInput(
                "coefficient of variation with zero mean",
            ));
        }
        Ok(self.stdev / self.mean)
    }
}

/// Morphemes-per-word in each direction and over both depth lists together.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalStats {
    pub forward: Summary,
    pub reverse: Summary,
    pub combined: Summary,
    /// Mean of the forward and reverse means.
    pub mean_of_means: f64,
}

impl DirectionalStats {
    /// Combined standard deviation relative to the mean of means.
    pub fn coefficient_of_variation(&self) -> Result<f64, StatsError> {
        if self.mean_of_means == 0.0 {
            return Err(StatsError::DegenerateInput(
                "morpheme ratio coefficient of variation with zero mean",
            ));
        }
        Ok(self.combined.stdev / self.mean_of_means)
    }
}

/// How often individual morphemes occur, per direction.
#[derive(Clone, Debug, PartialEq)]
pub struct OccurrenceStats {
    pub forward: Summary,
    pub reverse: Summary,
    pub forward_table: BTreeMap<String, usize>,
    pub reverse_table: BTreeMap<String, usize>,
}

/// Everything the segmentation report prints.
#[derive(Clone, Debug, PartialEq)]
pub struct CorpusReport {
    pub per_word: DirectionalStats,
    pub per_word_variation: f64,
    pub occurrence: OccurrenceStats,
    pub forward_occurrence_variation: f64,
    pub reverse_occurrence_variation: f64,
}

pub fn morphemes_per_word(seg: &Segmentation) -> Result<DirectionalStats, StatsError> {
    let forward_depths: Vec<f64> = seg
        .forward
        .morpheme_count_per_word()
        .map(|d| d as f64)
        .collect();
    let reverse_depths: Vec<f64> = seg
        .reverse
        .morpheme_count_per_word()
        .map(|d| d as f64)
        .collect();

    let forward = Summary::from_samples(forward_depths.iter().copied(), "no forward words")?;
    let reverse = Summary::from_samples(reverse_depths.iter().copied(), "no reverse words")?;
    let combined = Summary::from_samples(
        forward_depths.into_iter().chain(reverse_depths),
        "no words",
    )?;

    Ok(DirectionalStats {
        forward,
        reverse,
        combined,
        mean_of_means: (forward.mean + reverse.mean) / 2.0,
    })
}

/// Occurrence count of every chunk label across all chunk paths, in reading order.
pub fn morpheme_frequencies(trie: &ChunkTrie) -> BTreeMap<String, usize> {
    let mut table = BTreeMap::new();
    for chunks in trie.display_segments() {
        for chunk in chunks {
            *table.entry(chunk).or_insert(0) += 1;
        }
    }
    table
}

pub fn morpheme_occurrence(seg: &Segmentation) -> Result<OccurrenceStats, StatsError> {
    let forward_table = morpheme_frequencies(&seg.forward);
    let reverse_table = morpheme_frequencies(&seg.reverse);
    let forward = Summary::from_samples(
        forward_table.values().map(|&c| c as f64),
        "no forward morphemes",
    )?;
    let reverse = Summary::from_samples(
        reverse_table.values().map(|&c| c as f64),
        "no reverse morphemes",
    )?;
    Ok(OccurrenceStats {
        forward,
        reverse,
        forward_table,
        reverse_table,
    })
}

pub fn corpus_report(seg: &Segmentation) -> Result<CorpusReport, StatsError> {
    let per_word = morphemes_per_word(seg)?;
    let occurrence = morpheme_occurrence(seg)?;
    Ok(CorpusReport {
        per_word_variation: per_word.coefficient_of_variation()?,
        forward_occurrence_variation: occurrence.forward.coefficient_of_variation()?,
        reverse_occurrence_variation: occurrence.reverse.coefficient_of_variation()?,
        per_word,
        occurrence,
    })
}
