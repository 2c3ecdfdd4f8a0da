//! Report DTOs and their text rendering.
//!
//! Every report is built once as a plain serializable struct; `--format json`
//! pretty-prints it with `serde_json`, the text format mirrors the layout the
//! research scripts produced.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use morpho_endings::{
    AssociationMetric, CollapseSummary, CounterConfig, Cutoff, DominanceRow, MergeThreshold,
    UniquenessMetric, UniquenessRow, WindowLength,
};
use morpho_segment::stats::corpus_report;
use morpho_segment::{Segmentation, Summary};

const CHUNK_SEPARATOR: &str = "    ";

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum Format {
    #[default]
    Text,
    Json,
}

/// Stdout when no path is given, otherwise a freshly created file.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
            let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}

pub fn write_json<T: Serialize, W: Write>(value: &T, out: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("serialize report")?;
    writeln!(out).context("write report")?;
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SummaryDto {
    pub count: usize,
    pub mean: f64,
    pub stdev: f64,
}

impl From<Summary> for SummaryDto {
    fn from(s: Summary) -> Self {
        Self {
            count: s.count,
            mean: s.mean,
            stdev: s.stdev,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SegmentationReport {
    pub corpus: String,
    pub min_stem_len: usize,
    pub words: usize,
    pub skipped: usize,
    pub forward_per_word: SummaryDto,
    pub reverse_per_word: SummaryDto,
    pub combined_per_word: SummaryDto,
    /// Mean of the forward and reverse per-word means.
    pub per_word_ratio: f64,
    pub per_word_variation: f64,
    pub forward_occurrence: SummaryDto,
    pub reverse_occurrence: SummaryDto,
    pub forward_occurrence_variation: f64,
    pub reverse_occurrence_variation: f64,
    pub forward: Vec<Vec<String>>,
    pub reverse: Vec<Vec<String>>,
}

impl SegmentationReport {
    pub fn build(corpus: &str, min_stem_len: usize, seg: &Segmentation) -> Result<Self> {
        let stats = corpus_report(seg).with_context(|| format!("statistics for {corpus}"))?;
        Ok(Self {
            corpus: corpus.to_string(),
            min_stem_len,
            words: seg.forward.word_count(),
            skipped: seg.skipped,
            forward_per_word: stats.per_word.forward.into(),
            reverse_per_word: stats.per_word.reverse.into(),
            combined_per_word: stats.per_word.combined.into(),
            per_word_ratio: stats.per_word.mean_of_means,
            per_word_variation: stats.per_word_variation,
            forward_occurrence: stats.occurrence.forward.into(),
            reverse_occurrence: stats.occurrence.reverse.into(),
            forward_occurrence_variation: stats.forward_occurrence_variation,
            reverse_occurrence_variation: stats.reverse_occurrence_variation,
            forward: seg.forward.display_segments().collect(),
            reverse: seg.reverse.display_segments().collect(),
        })
    }

    pub fn write_text<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Morphemes per word:")?;
        writeln!(out, "left-to-right: {:.4}", self.forward_per_word.mean)?;
        writeln!(out, "right-to-left: {:.4}", self.reverse_per_word.mean)?;
        writeln!(out, "combined morpheme-per-word ratio: {:.4}\n", self.per_word_ratio)?;

        writeln!(out, "Standard deviation:")?;
        writeln!(out, "left-to-right: {:.4}", self.forward_per_word.stdev)?;
        writeln!(out, "right-to-left: {:.4}", self.reverse_per_word.stdev)?;
        writeln!(out, "combined: {:.4}\n", self.combined_per_word.stdev)?;
        writeln!(
            out,
            "coefficient of variation (stdev / morpheme ratio): {:.4}\n",
            self.per_word_variation
        )?;

        writeln!(out, "each morpheme occurs on average:")?;
        writeln!(out, "left-to-right: {:.4} times", self.forward_occurrence.mean)?;
        writeln!(out, "right-to-left: {:.4} times\n", self.reverse_occurrence.mean)?;

        writeln!(out, "Standard deviation of the occurrence of individual morphemes:")?;
        writeln!(out, "left-to-right: {:.4}", self.forward_occurrence.stdev)?;
        writeln!(out, "right-to-left: {:.4}", self.reverse_occurrence.stdev)?;

        writeln!(out, "\ncoefficient of variation:")?;
        writeln!(out, "left-to-right: {:.4}", self.forward_occurrence_variation)?;
        writeln!(out, "right-to-left: {:.4}", self.reverse_occurrence_variation)?;

        writeln!(out, "\n\n\nLeft-to-right:")?;
        write_segments(out, &self.forward)?;
        writeln!(out, "\n\n\nright-to-left:")?;
        write_segments(out, &self.reverse)?;
        Ok(())
    }
}

fn write_segments<W: Write>(out: &mut W, segments: &[Vec<String>]) -> io::Result<()> {
    for chunks in segments {
        writeln!(out, "{}", chunks.join(CHUNK_SEPARATOR))?;
    }
    Ok(())
}

/// Active heuristics, echoed in JSON so runs can be compared.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PolicyDto {
    pub window: String,
    pub merge: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_fraction: Option<f64>,
    pub prune_first: bool,
    pub cutoff: String,
    pub association: &'static str,
    pub uniqueness: &'static str,
    pub strong_multiplier: f64,
    pub candidates_per_stem: usize,
}

impl PolicyDto {
    pub fn new(config: &CounterConfig, window: WindowLength) -> Self {
        let (merge, merge_fraction) = match config.collapse.threshold {
            MergeThreshold::Fractional(f) => ("fractional", Some(f)),
            MergeThreshold::AboveAverage => ("above-average", None),
        };
        Self {
            window: match window {
                WindowLength::Fixed(n) => n.to_string(),
                WindowLength::Random { min, max } => format!("{min}..={max}"),
            },
            merge,
            merge_fraction,
            prune_first: config.collapse.prune_before_merge,
            cutoff: match config.cutoff {
                Cutoff::Count(n) => n.to_string(),
                Cutoff::Fraction(f) => format!("{:.2}%", f * 100.0),
            },
            association: match config.association {
                AssociationMetric::TopShare => "top-share",
                AssociationMetric::TopRatio => "top-ratio",
            },
            uniqueness: match config.uniqueness {
                UniquenessMetric::NegLogFreq => "neg-log",
                UniquenessMetric::OneMinusShare => "one-minus-share",
            },
            strong_multiplier: config.strong_multiplier,
            candidates_per_stem: config.candidates_per_stem,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CollapseDto {
    pub stems: usize,
    pub passes: usize,
    pub merges: usize,
    pub pruned: usize,
    pub max_passes: usize,
}

impl From<CollapseSummary> for CollapseDto {
    fn from(s: CollapseSummary) -> Self {
        Self {
            stems: s.stems,
            passes: s.passes,
            merges: s.merges,
            pruned: s.pruned,
            max_passes: s.max_passes,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CountedEnding {
    pub ending: String,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DominanceDto {
    pub stem: String,
    pub dominance: f64,
    pub endings: Vec<CountedEnding>,
    pub co_occurrence: usize,
}

impl From<DominanceRow> for DominanceDto {
    fn from(row: DominanceRow) -> Self {
        Self {
            stem: row.stem,
            dominance: row.dominance,
            endings: row
                .endings
                .into_iter()
                .map(|(ending, count)| CountedEnding { ending, count })
                .collect(),
            co_occurrence: row.co_occurrence,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredEndingDto {
    pub ending: String,
    pub score: f64,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PrioritizedDto {
    pub stem: String,
    pub association: f64,
    pub strongly_determined: bool,
    pub endings: Vec<ScoredEndingDto>,
}

impl From<UniquenessRow> for PrioritizedDto {
    fn from(row: UniquenessRow) -> Self {
        Self {
            stem: row.stem,
            association: row.association,
            strongly_determined: row.strongly_determined,
            endings: row
                .endings
                .into_iter()
                .map(|e| ScoredEndingDto {
                    ending: e.ending,
                    score: e.score,
                    count: e.count,
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EndingReport {
    pub corpus: String,
    pub tokens: usize,
    pub windows: usize,
    pub policy: PolicyDto,
    pub collapse: CollapseDto,
    pub dominance: Vec<DominanceDto>,
    pub prioritized: Vec<PrioritizedDto>,
}

impl EndingReport {
    pub fn write_text<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for row in &self.dominance {
            let endings: Vec<String> = row
                .endings
                .iter()
                .map(|e| format!("{}({})", e.ending, e.count))
                .collect();
            writeln!(
                out,
                "{}\t{}\tassociation preference: {:.2}%\tco-occurrence: {}",
                row.stem,
                endings.join(" "),
                row.dominance * 100.0,
                row.co_occurrence
            )?;
        }

        writeln!(out, "\n{}\n", "-".repeat(10))?;

        for row in &self.prioritized {
            write!(out, "{}:", row.stem)?;
            for ending in &row.endings {
                write!(out, "\t{}: {:.4}", ending.ending, ending.score)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}
