pub mod batch;
pub mod check;
pub mod report;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use morpho_corpus::{Corpus, CorpusFormat, CountOrder, LoadMode, load_tokens};
use morpho_endings::{CounterConfig, WindowLength, group_windows, windows};
use morpho_segment::MorphemeSegmenter;

pub use check::{EndingCheck, check_ending};
pub use report::{EndingReport, Format, PolicyDto, SegmentationReport};

fn display_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Segment every word of a corpus file with minimal stem length `min_stem_len`.
pub fn segment_corpus(
    path: &Path,
    min_stem_len: usize,
    mode: LoadMode,
) -> Result<SegmentationReport> {
    let segmenter = MorphemeSegmenter::new(min_stem_len)?;
    let corpus = Corpus::load(path, None, mode)?;
    let seg = segmenter.segment(corpus.iter().map(|(word, _)| word));
    SegmentationReport::build(&display_name(path), min_stem_len, &seg)
}

/// Window the running text of `path`, collapse every stem and rank the endings.
///
/// Without a seed the window lengths are drawn from OS entropy.
pub fn discover_endings(
    path: &Path,
    config: CounterConfig,
    window: WindowLength,
    seed: Option<u64>,
    mode: LoadMode,
) -> Result<EndingReport> {
    let tokens = load_tokens(path, mode)?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let windows = windows(&tokens, window, &mut rng)
        .with_context(|| format!("window {}", path.display()))?;

    let mut counter = group_windows(&windows, config);
    info!("optimising endings for {} stems", counter.len());
    let collapse = counter.collapse_all();
    let dominance = counter.rank_by_dominance()?;
    let prioritized = counter.rank_by_uniqueness()?;

    Ok(EndingReport {
        corpus: display_name(path),
        tokens: tokens.len(),
        windows: windows.len(),
        policy: PolicyDto::new(counter.config(), window),
        collapse: collapse.into(),
        dominance: dominance.into_iter().map(Into::into).collect(),
        prioritized: prioritized.into_iter().map(Into::into).collect(),
    })
}

/// Default report location for an ending run: `<dir>/results_<corpus>.<ext>`.
pub fn results_path(dir: &Path, corpus: &Path, format: Format) -> PathBuf {
    let ext = match format {
        Format::Text => "txt",
        Format::Json => "json",
    };
    dir.join(format!("results_{}.{ext}", display_name(corpus)))
}

/// `output` with `.dx1` appended unless it already names a count file.
pub fn counts_path(output: &Path) -> PathBuf {
    if output.extension().is_some_and(|e| e == "dx1") {
        return output.to_path_buf();
    }
    let mut name = output.as_os_str().to_os_string();
    name.push(".dx1");
    PathBuf::from(name)
}

/// Count the tokens of a text file into a `.dx1` count file.
pub fn make_corpus(
    text: &Path,
    output: &Path,
    author: Option<&str>,
    comment: Option<&str>,
    mode: LoadMode,
) -> Result<PathBuf> {
    let corpus = Corpus::load(text, Some(CorpusFormat::Text), mode)?;
    let target = counts_path(output);

    let mut header = Vec::new();
    if let Some(author) = author {
        header.push(format!("author: {author}"));
    }
    header.push(match comment {
        Some(comment) => comment.to_string(),
        None => format!("from '{}'", text.display()),
    });

    let file = File::create(&target).with_context(|| format!("create {}", target.display()))?;
    let mut out = BufWriter::new(file);
    corpus.write_counts(&mut out, CountOrder::MostCommon, &header)?;
    out.flush()
        .with_context(|| format!("flush {}", target.display()))?;
    info!(
        "wrote {} distinct words to {}",
        corpus.len(),
        target.display()
    );
    Ok(target)
}
