//! Selectable heuristics for collapsing and scoring.
//!
//! Two variants exist for the merge threshold, the association strength and
//! the uniqueness score; none of them is known to be the right one, so all
//! are kept and picked explicitly.

use crate::EndingError;

/// When a `chunk -> next` pair is merged into a single root chunk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MergeThreshold {
    /// Merge when the merged successor count is at least this fraction of the
    /// un-merged chunk's count.
    Fractional(f64),
    /// Merge when the merged successor count is strictly above the current
    /// average root successor count.
    AboveAverage,
}

impl Default for MergeThreshold {
    fn default() -> Self {
        MergeThreshold::Fractional(0.2)
    }
}

impl MergeThreshold {
    pub fn accepts(&self, merged: usize, original: usize, average: f64) -> bool {
        match *self {
            MergeThreshold::Fractional(fraction) => merged as f64 >= original as f64 * fraction,
            MergeThreshold::AboveAverage => merged as f64 > average,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CollapsePolicy {
    pub threshold: MergeThreshold,
    /// Drop below-average root chunks before merging.
    pub prune_before_merge: bool,
}

/// How many of the most frequent stems are ranked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Cutoff {
    Count(usize),
    /// Top fraction of stems; keeps at least one when any exist.
    Fraction(f64),
}

impl Default for Cutoff {
    fn default() -> Self {
        Cutoff::Count(150)
    }
}

impl Cutoff {
    pub fn take(&self, available: usize) -> usize {
        match *self {
            Cutoff::Count(n) => n.min(available),
            Cutoff::Fraction(fraction) => {
                if available == 0 {
                    return 0;
                }
                let wanted = (available as f64 * fraction.clamp(0.0, 1.0)).ceil() as usize;
                wanted.clamp(1, available)
            }
        }
    }
}

/// How strongly a stem commits to its top ending.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AssociationMetric {
    /// Top ending count over all ending counts.
    #[default]
    TopShare,
    /// `1 - second / top`; 1 when a stem has a single ending.
    TopRatio,
}

impl AssociationMetric {
    /// `ranked` is ordered by count, highest first.
    pub fn strength(&self, ranked: &[(String, usize)]) -> Result<f64, EndingError> {
        let Some(&(_, top)) = ranked.first() else {
            return Err(EndingError::DegenerateInput("association of a stem without endings"));
        };
        if top == 0 {
            return Err(EndingError::DegenerateInput("association with zero top count"));
        }
        match self {
            AssociationMetric::TopShare => {
                let total: usize = ranked.iter().map(|(_, c)| c).sum();
                Ok(top as f64 / total as f64)
            }
            AssociationMetric::TopRatio => {
                let second = ranked.get(1).map(|&(_, c)| c).unwrap_or(0);
                Ok(1.0 - second as f64 / top as f64)
            }
        }
    }
}

/// How distinctive an ending is, from the number of other stems listing it.
///
/// Both metrics strictly decrease in frequency and give an ending no other
/// stem lists a finite maximal score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UniquenessMetric {
    /// `log2(stems / frequency)`, with a zero frequency counted as one half.
    #[default]
    NegLogFreq,
    /// `1 - frequency / sum of all frequencies`.
    OneMinusShare,
}

impl UniquenessMetric {
    /// `frequency` is how many other stems list the ending, `stems` how many
    /// other stems list any ending and `total` the sum of all ending
    /// frequencies.
    pub fn score(&self, frequency: usize, stems: usize, total: usize) -> f64 {
        match self {
            UniquenessMetric::NegLogFreq => {
                let frequency = if frequency == 0 {
                    0.5
                } else {
                    frequency as f64
                };
                (stems.max(1) as f64 / frequency).log2()
            }
            UniquenessMetric::OneMinusShare => {
                if total == 0 {
                    return 1.0;
                }
                1.0 - frequency as f64 / total as f64
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(counts: &[usize]) -> Vec<(String, usize)> {
        counts
            .iter()
            .enumerate()
            .map(|(i, &c)| (format!("e{i}"), c))
            .collect()
    }

    #[test]
    fn fractional_threshold_compares_to_original() {
        let t = MergeThreshold::Fractional(0.2);
        assert!(t.accepts(2, 10, 100.0));
        assert!(!t.accepts(1, 10, 0.0));
    }

    #[test]
    fn above_average_is_strict() {
        let t = MergeThreshold::AboveAverage;
        assert!(t.accepts(3, 3, 2.5));
        assert!(!t.accepts(2, 3, 2.0));
    }

    #[test]
    fn fraction_cutoff_keeps_at_least_one() {
        assert_eq!(Cutoff::Fraction(0.01).take(10), 1);
        assert_eq!(Cutoff::Fraction(0.5).take(5), 3);
        assert_eq!(Cutoff::Fraction(0.5).take(0), 0);
        assert_eq!(Cutoff::Count(150).take(4), 4);
    }

    #[test]
    fn association_variants() {
        let r = ranked(&[6, 3, 1]);
        assert_eq!(AssociationMetric::TopShare.strength(&r).unwrap(), 0.6);
        assert_eq!(AssociationMetric::TopRatio.strength(&r).unwrap(), 0.5);
        assert_eq!(AssociationMetric::TopRatio.strength(&ranked(&[4])).unwrap(), 1.0);
        assert!(AssociationMetric::TopShare.strength(&[]).is_err());
    }

    #[test]
    fn uniqueness_decreases_with_frequency() {
        for metric in [UniquenessMetric::NegLogFreq, UniquenessMetric::OneMinusShare] {
            let scores: Vec<f64> = (1..=8).map(|f| metric.score(f, 8, 20)).collect();
            assert!(scores.windows(2).all(|w| w[0] > w[1]), "{metric:?}: {scores:?}");
        }
        assert!(UniquenessMetric::NegLogFreq.score(8, 8, 20).is_sign_positive());
        assert_eq!(UniquenessMetric::NegLogFreq.score(8, 8, 20), 0.0);
    }

    #[test]
    fn unshared_endings_score_highest_and_finite() {
        for metric in [UniquenessMetric::NegLogFreq, UniquenessMetric::OneMinusShare] {
            let unshared = metric.score(0, 4, 10);
            assert!(unshared.is_finite(), "{metric:?}");
            assert!(unshared > metric.score(1, 4, 10), "{metric:?}");
            assert!(metric.score(0, 0, 0).is_finite(), "{metric:?}");
        }
        assert_eq!(UniquenessMetric::NegLogFreq.score(0, 4, 10), 3.0);
        assert_eq!(UniquenessMetric::OneMinusShare.score(0, 0, 0), 1.0);
    }
}
