//! Stem to ending-trie bookkeeping, collapsing and ranking.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::ending_trie::{CollapseReport, EndingTrie};
use crate::policy::{AssociationMetric, CollapsePolicy, Cutoff, UniquenessMetric};
use crate::{EndingError, unreverse};

/// Construction-time choices for a [`StemEndingCounter`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CounterConfig {
    pub collapse: CollapsePolicy,
    pub cutoff: Cutoff,
    pub association: AssociationMetric,
    pub uniqueness: UniquenessMetric,
    /// Stems whose association exceeds the mean by this factor keep raw counts.
    pub strong_multiplier: f64,
    /// Top endings per stem considered when counting cross-stem frequency.
    pub candidates_per_stem: usize,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            collapse: CollapsePolicy::default(),
            cutoff: Cutoff::default(),
            association: AssociationMetric::default(),
            uniqueness: UniquenessMetric::default(),
            strong_multiplier: 1.5,
            candidates_per_stem: 5,
        }
    }
}

/// A stem ranked by the share of its top ending.
#[derive(Clone, Debug, PartialEq)]
pub struct DominanceRow {
    pub stem: String,
    pub dominance: f64,
    /// Up to three `(ending, count)` pairs in reading order.
    pub endings: Vec<(String, usize)>,
    /// How often the stem took part in a co-occurrence pair.
    pub co_occurrence: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoredEnding {
    pub ending: String,
    pub score: f64,
    pub count: usize,
}

/// A stem with endings scored by count or by uniqueness.
#[derive(Clone, Debug, PartialEq)]
pub struct UniquenessRow {
    pub stem: String,
    pub association: f64,
    /// Endings were scored by raw count rather than uniqueness.
    pub strongly_determined: bool,
    pub endings: Vec<ScoredEnding>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CollapseSummary {
    pub stems: usize,
    pub passes: usize,
    pub merges: usize,
    pub pruned: usize,
    /// Largest pass count taken by a single stem.
    pub max_passes: usize,
}

impl CollapseSummary {
    fn absorb(&mut self, report: CollapseReport) {
        self.stems += 1;
        self.passes += report.passes;
        self.merges += report.merges;
        self.pruned += report.pruned;
        self.max_passes = self.max_passes.max(report.passes);
    }
}

/// The candidate ending `other` offers to `stem`, reversed for trie insertion.
///
/// When `other` extends `stem` the shared stem is stripped, so `running`
/// offers `ing` to `run`; otherwise the whole word is the candidate.
pub fn candidate_ending(stem: &str, other: &str) -> String {
    let ending = match other.strip_prefix(stem) {
        Some(rest) if !rest.is_empty() => rest,
        _ => other,
    };
    ending.chars().rev().collect()
}

#[derive(Clone, Debug, Default)]
pub struct StemEndingCounter {
    config: CounterConfig,
    stems: BTreeMap<String, EndingTrie>,
    word_counts: BTreeMap<String, usize>,
    filtered: Option<Vec<String>>,
}

impl StemEndingCounter {
    pub fn new(config: CounterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    /// Record `word` and `other_word` as mutual evidence.
    pub fn add(&mut self, word: &str, other_word: &str) {
        self.stems
            .entry(word.to_string())
            .or_default()
            .add_evidence(&candidate_ending(word, other_word));
        self.stems
            .entry(other_word.to_string())
            .or_default()
            .add_evidence(&candidate_ending(other_word, word));

        *self.word_counts.entry(word.to_string()).or_insert(0) += 1;
        *self.word_counts.entry(other_word.to_string()).or_insert(0) += 1;
    }

    /// Feed every unordered pair of a context window.
    pub fn add_window<S: AsRef<str>>(&mut self, window: &[S]) {
        for (i, word) in window.iter().enumerate() {
            for other in &window[i + 1..] {
                self.add(word.as_ref(), other.as_ref());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.stems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
    }

    pub fn stems(&self) -> impl Iterator<Item = &str> + '_ {
        self.stems.keys().map(String::as_str)
    }

    pub fn ending_trie(&self, stem: &str) -> Option<&EndingTrie> {
        self.stems.get(stem)
    }

    /// Co-occurrence count of `word`; zero when never seen.
    pub fn word_count(&self, word: &str) -> usize {
        self.word_counts.get(word).copied().unwrap_or(0)
    }

    /// Collapse every stem's trie independently.
    pub fn collapse_all(&mut self) -> CollapseSummary {
        let mut summary = CollapseSummary::default();
        let total = self.stems.len();
        let policy = self.config.collapse;
        for (n, (stem, trie)) in self.stems.iter_mut().enumerate() {
            debug!("collapsing {stem} ({}/{total})", n + 1);
            summary.absorb(trie.collapse(&policy));
        }
        info!(
            "collapsed {} stems: {} merges, {} pruned chunks",
            summary.stems, summary.merges, summary.pruned
        );
        summary
    }

    /// Most frequent stems under the configured cutoff, ties alphabetical.
    ///
    /// The selection is memoized; it is only recomputed when `recompute` is
    /// set or after [`invalidate_filter`](Self::invalidate_filter).
    pub fn filter_top(&mut self, recompute: bool) -> &[String] {
        if recompute || self.filtered.is_none() {
            let mut ranked: Vec<(&String, &usize)> = self.word_counts.iter().collect();
            ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            let take = self.config.cutoff.take(ranked.len());
            self.filtered = Some(
                ranked
                    .into_iter()
                    .take(take)
                    .map(|(word, _)| word.clone())
                    .collect(),
            );
        }
        self.filtered.as_deref().unwrap_or(&[])
    }

    pub fn invalidate_filter(&mut self) {
        self.filtered = None;
    }

    /// Filtered stems by the share of their top ending, highest first.
    pub fn rank_by_dominance(&mut self) -> Result<Vec<DominanceRow>, EndingError> {
        if self.word_counts.is_empty() {
            return Err(EndingError::DegenerateInput("no co-occurrence evidence"));
        }
        let filtered = self.filter_top(false).to_vec();

        let mut rows = Vec::with_capacity(filtered.len());
        for stem in filtered {
            let Some(trie) = self.stems.get(&stem) else {
                continue;
            };
            let dominance = match trie.dominance() {
                Ok(d) => d,
                Err(err) => {
                    debug!("skipping {stem}: {err}");
                    continue;
                }
            };
            let endings = trie
                .ranked_endings()
                .into_iter()
                .take(3)
                .map(|(ending, count)| (unreverse(&ending), count))
                .collect();
            rows.push(DominanceRow {
                co_occurrence: self.word_count(&stem),
                stem,
                dominance,
                endings,
            });
        }

        if rows.is_empty() {
            return Err(EndingError::DegenerateInput("no stem has assigned endings"));
        }
        rows.sort_by(|a, b| {
            b.dominance
                .total_cmp(&a.dominance)
                .then_with(|| a.stem.cmp(&b.stem))
        });
        Ok(rows)
    }

    /// Filtered stems with endings scored by count (strongly associated stems)
    /// or by how few other stems share them.
    pub fn rank_by_uniqueness(&mut self) -> Result<Vec<UniquenessRow>, EndingError> {
        if self.word_counts.is_empty() {
            return Err(EndingError::DegenerateInput("no co-occurrence evidence"));
        }
        let filtered = self.filter_top(false).to_vec();
        let config = self.config;
        let per_stem = config.candidates_per_stem.max(1);

        let mut candidates: Vec<(String, f64, Vec<(String, usize)>)> = Vec::new();
        for stem in filtered {
            let Some(trie) = self.stems.get(&stem) else {
                continue;
            };
            let mut ranked = trie.ranked_endings();
            if ranked.is_empty() {
                debug!("skipping {stem}: no assigned endings");
                continue;
            }
            let strength = config.association.strength(&ranked)?;
            ranked.truncate(per_stem);
            candidates.push((stem, strength, ranked));
        }
        if candidates.is_empty() {
            return Err(EndingError::DegenerateInput("no stem has assigned endings"));
        }

        // Cross-stem frequency is taken over every stem, filtered or not.
        let mut frequency: BTreeMap<String, usize> = BTreeMap::new();
        let mut listing_stems = 0usize;
        for trie in self.stems.values() {
            let ranked = trie.ranked_endings();
            if ranked.is_empty() {
                continue;
            }
            listing_stems += 1;
            for (ending, _) in ranked.into_iter().take(per_stem) {
                *frequency.entry(ending).or_insert(0) += 1;
            }
        }
        let total_frequency: usize = frequency.values().sum();
        let other_stems = listing_stems.saturating_sub(1);
        let stem_count = candidates.len();
        let mean_strength =
            candidates.iter().map(|(_, s, _)| s).sum::<f64>() / stem_count as f64;
        let strong_bar = mean_strength * config.strong_multiplier;

        let mut rows: Vec<UniquenessRow> = candidates
            .iter()
            .map(|(stem, strength, ranked)| {
                let strongly_determined = *strength > strong_bar;
                let mut endings: Vec<ScoredEnding> = ranked
                    .iter()
                    .map(|(ending, count)| {
                        let score = if strongly_determined {
                            *count as f64
                        } else {
                            // The scored stem itself always lists the ending.
                            let others = frequency
                                .get(ending.as_str())
                                .copied()
                                .unwrap_or(1)
                                .saturating_sub(1);
                            config.uniqueness.score(others, other_stems, total_frequency)
                        };
                        ScoredEnding {
                            ending: unreverse(ending),
                            score,
                            count: *count,
                        }
                    })
                    .collect();
                endings.sort_by(|a, b| {
                    b.score
                        .total_cmp(&a.score)
                        .then_with(|| b.count.cmp(&a.count))
                        .then_with(|| a.ending.cmp(&b.ending))
                });
                endings.truncate(3);
                UniquenessRow {
                    stem: stem.clone(),
                    association: *strength,
                    strongly_determined,
                    endings,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            b.association
                .total_cmp(&a.association)
                .then_with(|| a.stem.cmp(&b.stem))
        });
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_strips_shared_stem() {
        assert_eq!(candidate_ending("run", "running"), "gni");
        assert_eq!(candidate_ending("run", "runs"), "s");
        assert_eq!(candidate_ending("runs", "run"), "nur");
        assert_eq!(candidate_ending("run", "run"), "nur");
    }

    #[test]
    fn add_is_symmetric() {
        let mut counter = StemEndingCounter::new(CounterConfig::default());
        counter.add("walk", "walked");
        assert_eq!(counter.word_count("walk"), 1);
        assert_eq!(counter.word_count("walked"), 1);
        assert_eq!(counter.word_count("talk"), 0);
        assert_eq!(
            counter.ending_trie("walk").unwrap().words().get("de"),
            Some(&1)
        );
        assert_eq!(
            counter.ending_trie("walked").unwrap().words().get("klaw"),
            Some(&1)
        );
        assert_eq!(counter.len(), 2);
    }

    #[test]
    fn window_adds_every_unordered_pair() {
        let mut counter = StemEndingCounter::new(CounterConfig::default());
        counter.add_window(&["a", "b", "c", "d"]);
        for word in ["a", "b", "c", "d"] {
            assert_eq!(counter.word_count(word), 3);
            assert_eq!(counter.ending_trie(word).unwrap().evidence_count(), 3);
        }
    }

    #[test]
    fn filter_is_memoized_until_recomputed() {
        let config = CounterConfig {
            cutoff: Cutoff::Count(1),
            ..CounterConfig::default()
        };
        let mut counter = StemEndingCounter::new(config);
        counter.add("a", "b");
        counter.add("a", "c");
        assert_eq!(counter.filter_top(false), ["a".to_string()]);

        counter.add("c", "b");
        counter.add("c", "d");
        assert_eq!(counter.filter_top(false), ["a".to_string()]);
        assert_eq!(counter.filter_top(true), ["c".to_string()]);
        counter.invalidate_filter();
        assert_eq!(counter.filter_top(false), ["c".to_string()]);
    }

    #[test]
    fn empty_counter_is_degenerate() {
        let mut counter = StemEndingCounter::new(CounterConfig::default());
        assert_eq!(
            counter.rank_by_dominance(),
            Err(EndingError::DegenerateInput("no co-occurrence evidence"))
        );
        assert!(matches!(
            counter.rank_by_uniqueness(),
            Err(EndingError::DegenerateInput(_))
        ));
    }

    #[test]
    fn uncollapsed_counter_has_nothing_to_rank() {
        let mut counter = StemEndingCounter::new(CounterConfig::default());
        counter.add("run", "runs");
        assert!(matches!(
            counter.rank_by_dominance(),
            Err(EndingError::DegenerateInput(_))
        ));
    }
}
