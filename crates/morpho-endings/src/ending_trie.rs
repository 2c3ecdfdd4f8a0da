//! Per-stem trie of reversed ending candidates and its collapse algorithm.

use std::collections::BTreeMap;

use morpho_trie::{NodeId, PrefixTrie, char_symbols};
use tracing::warn;

use crate::EndingError;
use crate::policy::{CollapsePolicy, MergeThreshold};

/// Candidate endings observed for one stem, spelled in reverse.
///
/// `words` counts each reversed candidate as it was observed; `endings` is
/// only populated by [`collapse`](EndingTrie::collapse) and maps each
/// surviving reversed ending chunk to the evidence assigned to it.
#[derive(Clone, Debug, Default)]
pub struct EndingTrie {
    trie: PrefixTrie,
    words: BTreeMap<String, usize>,
    endings: BTreeMap<String, usize>,
    collapsed: bool,
}

/// What one call to [`EndingTrie::collapse`] did.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CollapseReport {
    /// Merge scans run, including the final scan that merged nothing.
    pub passes: usize,
    pub merges: usize,
    pub pruned: usize,
}

impl EndingTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one reversed candidate ending. Empty candidates are ignored.
    pub fn add_evidence(&mut self, reversed_ending: &str) {
        if reversed_ending.is_empty() {
            return;
        }
        self.trie.insert(&char_symbols(reversed_ending));
        *self.words.entry(reversed_ending.to_string()).or_insert(0) += 1;
        self.collapsed = false;
    }

    pub fn trie(&self) -> &PrefixTrie {
        &self.trie
    }

    /// Occurrence count of every reversed candidate.
    pub fn words(&self) -> &BTreeMap<String, usize> {
        &self.words
    }

    /// Total pieces of evidence recorded.
    pub fn evidence_count(&self) -> usize {
        self.words.values().sum()
    }

    /// Assigned evidence per reversed ending; empty until collapsed.
    pub fn endings(&self) -> &BTreeMap<String, usize> {
        &self.endings
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn root_chunks(&self) -> Vec<String> {
        self.trie.root_symbols().map(str::to_string).collect()
    }

    /// Completions below a root chunk.
    pub fn successor_count(&self, chunk: &str) -> usize {
        self.trie.count_matches(&[chunk])
    }

    pub fn average_successor_count(&self) -> Result<f64, EndingError> {
        let counts: Vec<usize> = self.root_successor_counts().into_iter().map(|(_, c)| c).collect();
        if counts.is_empty() {
            return Err(EndingError::DegenerateInput(
                "average successor count of an empty ending trie",
            ));
        }
        Ok(counts.iter().sum::<usize>() as f64 / counts.len() as f64)
    }

    /// Endings by assigned count, highest first, ties in reversed-spelling order.
    pub fn ranked_endings(&self) -> Vec<(String, usize)> {
        let mut ranked: Vec<(String, usize)> =
            self.endings.iter().map(|(e, &c)| (e.clone(), c)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    pub fn top_ending(&self) -> Option<(String, usize)> {
        self.ranked_endings().into_iter().next()
    }

    pub fn total_ending_count(&self) -> usize {
        self.endings.values().sum()
    }

    /// Share of assigned evidence claimed by the top ending, in `(0, 1]`.
    pub fn dominance(&self) -> Result<f64, EndingError> {
        let total = self.total_ending_count();
        let Some((_, top)) = self.top_ending() else {
            return Err(EndingError::DegenerateInput("dominance of a stem without endings"));
        };
        if total == 0 {
            return Err(EndingError::DegenerateInput("dominance with zero ending evidence"));
        }
        Ok(top as f64 / total as f64)
    }

    /// Merge single characters into stable ending chunks, prune weak chunks
    /// and assign the observed candidates to the survivors.
    ///
    /// Collapsing an already collapsed trie performs no merges and keeps the
    /// existing assignment.
    pub fn collapse(&mut self, policy: &CollapsePolicy) -> CollapseReport {
        let mut report = CollapseReport::default();
        if self.trie.is_empty() {
            self.collapsed = true;
            return report;
        }

        let already_collapsed = self.collapsed;
        if policy.prune_before_merge && !already_collapsed {
            report.pruned += self.prune_below_average();
        }

        let pass_limit = self.trie.node_count();
        loop {
            report.passes += 1;
            let merged = self.merge_pass(policy.threshold);
            report.merges += merged;
            if merged == 0 {
                break;
            }
            if report.passes >= pass_limit {
                warn!("ending collapse stopped after {pass_limit} passes");
                break;
            }
        }

        if already_collapsed && report.merges == 0 {
            return report;
        }

        report.pruned += self.prune_below_average();
        self.assign_endings();
        self.collapsed = true;
        report
    }

    fn root_successor_counts(&self) -> Vec<(String, usize)> {
        self.trie
            .children(self.trie.root())
            .map(|(chunk, node)| (chunk.to_string(), self.trie.count_below(node)))
            .collect()
    }

    /// One scan over `(root chunk, next chunk)` pairs taken from a snapshot of
    /// the root level. Node ids stay valid while the live trie is edited.
    fn merge_pass(&mut self, threshold: MergeThreshold) -> usize {
        let root = self.trie.root();
        let average = self.average_successor_count().unwrap_or(0.0);
        let snapshot: Vec<(String, NodeId, Vec<String>)> = self
            .trie
            .children(root)
            .map(|(chunk, node)| {
                let next: Vec<String> = self
                    .trie
                    .children(node)
                    .map(|(symbol, _)| symbol.to_string())
                    .collect();
                (chunk.to_string(), node, next)
            })
            .collect();

        let mut merges = 0;
        for (chunk, node, next_chunks) in snapshot {
            for next in next_chunks {
                let Some(next_node) = self.trie.child(node, &next) else {
                    continue;
                };
                let merged = self.trie.count_below(next_node);
                let original = self.trie.count_below(node);
                if threshold.accepts(merged, original, average)
                    && self.trie.move_child(node, &next, root, &format!("{chunk}{next}"))
                {
                    merges += 1;
                }
            }
        }
        merges
    }

    fn prune_below_average(&mut self) -> usize {
        let counts = self.root_successor_counts();
        if counts.is_empty() {
            return 0;
        }
        let average = counts.iter().map(|(_, c)| *c as f64).sum::<f64>() / counts.len() as f64;
        let root = self.trie.root();
        let mut pruned = 0;
        for (chunk, count) in counts {
            if (count as f64) < average && self.trie.remove_child(root, &chunk).is_some() {
                pruned += 1;
            }
        }
        pruned
    }

    /// Longest surviving chunk wins; each candidate is assigned at most once.
    fn assign_endings(&mut self) {
        let mut chunks = self.root_chunks();
        chunks.sort_by(|a, b| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        });

        let mut pool = self.words.clone();
        let mut endings = BTreeMap::new();
        for chunk in &chunks {
            pool.retain(|word, count| {
                if word.starts_with(chunk.as_str()) {
                    *endings.entry(chunk.clone()).or_insert(0) += *count;
                    false
                } else {
                    true
                }
            });
        }
        self.endings = endings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trie_with(evidence: &[&str]) -> EndingTrie {
        let mut trie = EndingTrie::new();
        for e in evidence {
            trie.add_evidence(e);
        }
        trie
    }

    #[test]
    fn chains_merge_into_one_ending() {
        let mut trie = trie_with(&["gni", "s"]);
        let report = trie.collapse(&CollapsePolicy::default());
        assert_eq!(report.merges, 2);
        assert_eq!(report.passes, 3);
        assert_eq!(trie.root_chunks(), vec!["gni", "s"]);
        assert_eq!(trie.endings().get("gni"), Some(&1));
        assert_eq!(trie.endings().get("s"), Some(&1));
        assert_eq!(trie.dominance().unwrap(), 0.5);
    }

    #[test]
    fn single_evidence_dominates_fully() {
        let mut trie = trie_with(&["de"]);
        trie.collapse(&CollapsePolicy::default());
        assert_eq!(trie.ranked_endings(), vec![("de".to_string(), 1)]);
        assert_eq!(trie.dominance().unwrap(), 1.0);
    }

    #[test]
    fn empty_trie_is_degenerate() {
        let mut trie = EndingTrie::new();
        assert!(trie.average_successor_count().is_err());
        let report = trie.collapse(&CollapsePolicy::default());
        assert_eq!(report, CollapseReport::default());
        assert_eq!(
            trie.dominance(),
            Err(EndingError::DegenerateInput("dominance of a stem without endings"))
        );
        trie.add_evidence("");
        assert_eq!(trie.evidence_count(), 0);
    }

    #[test]
    fn wide_branches_resist_fractional_merge() {
        // 's' is followed by six different characters; no single one carries
        // a fifth of the completions below 's'.
        let mut trie = trie_with(&["sa", "sb", "sc", "sd", "se", "sf"]);
        trie.collapse(&CollapsePolicy::default());
        assert_eq!(trie.root_chunks(), vec!["s"]);
        assert_eq!(trie.endings().get("s"), Some(&6));
    }

    #[test]
    fn longest_chunk_wins_assignment() {
        let mut trie = trie_with(&["de", "de", "dei", "s"]);
        trie.collapse(&CollapsePolicy::default());
        let total: usize = trie.endings().values().sum();
        assert_eq!(total, trie.evidence_count());
        assert!(trie.endings().len() >= 2);
    }

    #[test]
    fn above_average_policy_also_converges() {
        let mut trie = trie_with(&["gni", "gnik", "de", "s", "s"]);
        let policy = CollapsePolicy {
            threshold: MergeThreshold::AboveAverage,
            prune_before_merge: false,
        };
        let report = trie.collapse(&policy);
        assert!(report.passes >= 1);
        assert!(trie.is_collapsed());
        assert!(trie.total_ending_count() <= trie.evidence_count());
    }

    #[test]
    fn pruning_first_drops_rare_root_chunks() {
        let mut trie = trie_with(&["gni", "gnik", "gnir", "s"]);
        let policy = CollapsePolicy {
            threshold: MergeThreshold::Fractional(0.2),
            prune_before_merge: true,
        };
        let report = trie.collapse(&policy);
        assert!(report.pruned >= 1);
        assert!(!trie.endings().contains_key("s"));
    }

    #[test]
    fn new_evidence_reopens_collapse() {
        let mut trie = trie_with(&["s"]);
        trie.collapse(&CollapsePolicy::default());
        trie.add_evidence("de");
        assert!(!trie.is_collapsed());
        trie.collapse(&CollapsePolicy::default());
        assert_eq!(trie.total_ending_count(), 2);
    }
}
