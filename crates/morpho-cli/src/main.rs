use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use morpho_cli::report::{open_output, write_json};
use morpho_cli::{
    Format, batch, check_ending, discover_endings, make_corpus, results_path, segment_corpus,
};
use morpho_corpus::{Corpus, LoadMode};
use morpho_endings::{
    AssociationMetric, CollapsePolicy, CounterConfig, Cutoff, MergeThreshold, UniquenessMetric,
    WindowLength,
};

const DEFAULT_RESULTS_DIR: &str = "results";

#[derive(Parser)]
#[command(name = "morpho")]
#[command(about = "Unsupervised morpheme segmentation and ending discovery")]
struct Cli {
    /// Raise the default log level to debug.
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Read corpora into memory instead of memory-mapping them.
    #[arg(long, global = true)]
    owned: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split every word of a corpus into morphemes.
    Segment {
        file: PathBuf,
        min_len: usize,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Discover likely endings from word co-occurrence in running text.
    Endings(EndingsArgs),
    /// Report how many words match once an ending is stripped.
    CheckEnding {
        file: PathBuf,
        ending: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Turn running text into a `.dx1` count file.
    MakeCorpus {
        text: PathBuf,
        output: PathBuf,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Segment every `*.dx1` corpus one level below a directory.
    Batch {
        dir: PathBuf,
        #[arg(long, value_delimiter = ',', default_values_t = [4, 5])]
        lengths: Vec<usize>,
        #[arg(long, default_value = DEFAULT_RESULTS_DIR)]
        results: PathBuf,
        #[arg(long)]
        jobs: Option<usize>,
    },
}

#[derive(Args)]
struct EndingsArgs {
    file: PathBuf,
    /// Fixed window length; random in 5..=15 when omitted.
    #[arg(short = 'l', long)]
    line_length: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, conflicts_with = "cutoff_fraction")]
    cutoff: Option<usize>,
    #[arg(long)]
    cutoff_fraction: Option<f64>,
    #[arg(long, value_enum, default_value_t = MergeArg::Fractional)]
    merge: MergeArg,
    #[arg(long, default_value_t = 0.2)]
    merge_fraction: f64,
    #[arg(long)]
    prune_first: bool,
    #[arg(long, value_enum, default_value_t = AssociationArg::TopShare)]
    association: AssociationArg,
    #[arg(long, value_enum, default_value_t = UniquenessArg::NegLog)]
    uniqueness: UniquenessArg,
    #[arg(short, long, conflicts_with = "results_dir")]
    output: Option<PathBuf>,
    /// Write to `<dir>/results_<corpus>.txt`.
    #[arg(long)]
    results_dir: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum MergeArg {
    Fractional,
    AboveAverage,
}

#[derive(Clone, Copy, ValueEnum)]
enum AssociationArg {
    TopShare,
    TopRatio,
}

#[derive(Clone, Copy, ValueEnum)]
enum UniquenessArg {
    NegLog,
    OneMinusShare,
}

impl EndingsArgs {
    fn counter_config(&self) -> Result<CounterConfig> {
        let cutoff = match (self.cutoff, self.cutoff_fraction) {
            (_, Some(f)) if !(0.0..=1.0).contains(&f) => {
                bail!("--cutoff-fraction must lie in [0, 1], got {f}")
            }
            (_, Some(f)) => Cutoff::Fraction(f),
            (Some(n), None) => Cutoff::Count(n),
            (None, None) => Cutoff::default(),
        };
        let threshold = match self.merge {
            MergeArg::Fractional => MergeThreshold::Fractional(self.merge_fraction),
            MergeArg::AboveAverage => MergeThreshold::AboveAverage,
        };
        Ok(CounterConfig {
            collapse: CollapsePolicy {
                threshold,
                prune_before_merge: self.prune_first,
            },
            cutoff,
            association: match self.association {
                AssociationArg::TopShare => AssociationMetric::TopShare,
                AssociationArg::TopRatio => AssociationMetric::TopRatio,
            },
            uniqueness: match self.uniqueness {
                UniquenessArg::NegLog => UniquenessMetric::NegLogFreq,
                UniquenessArg::OneMinusShare => UniquenessMetric::OneMinusShare,
            },
            ..CounterConfig::default()
        })
    }

    fn window(&self) -> WindowLength {
        match self.line_length {
            Some(n) => WindowLength::Fixed(n),
            None => WindowLength::default(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let mode = if cli.owned {
        LoadMode::Owned
    } else {
        LoadMode::Mmap
    };

    match cli.command {
        Commands::Segment {
            file,
            min_len,
            output,
            format,
        } => {
            let report = segment_corpus(&file, min_len, mode)?;
            let mut out = open_output(output.as_deref())?;
            match format {
                Format::Text => report.write_text(&mut out).context("write report")?,
                Format::Json => write_json(&report, &mut out)?,
            }
            out.flush().context("flush report")?;
        }
        Commands::Endings(args) => {
            let config = args.counter_config()?;
            let report = discover_endings(&args.file, config, args.window(), args.seed, mode)?;
            let target = args
                .output
                .clone()
                .or_else(|| {
                    args.results_dir
                        .as_deref()
                        .map(|dir| results_path(dir, &args.file, args.format))
                });
            let mut out = open_output(target.as_deref())?;
            match args.format {
                Format::Text => report.write_text(&mut out).context("write report")?,
                Format::Json => write_json(&report, &mut out)?,
            }
            out.flush().context("flush report")?;
            if let Some(target) = target {
                info!("wrote ending report to {}", target.display());
            }
        }
        Commands::CheckEnding {
            file,
            ending,
            output,
        } => {
            let corpus = Corpus::load(&file, None, mode)?;
            let check = check_ending(&corpus, &ending)?;
            let mut out = open_output(output.as_deref())?;
            check.write_text(&mut out).context("write report")?;
            out.flush().context("flush report")?;
        }
        Commands::MakeCorpus {
            text,
            output,
            author,
            comment,
        } => {
            let target = make_corpus(&text, &output, author.as_deref(), comment.as_deref(), mode)?;
            println!("{}", target.display());
        }
        Commands::Batch {
            dir,
            lengths,
            results,
            jobs,
        } => run_batch(&dir, &lengths, &results, jobs)?,
    }
    Ok(())
}

fn run_batch(dir: &Path, lengths: &[usize], results: &Path, jobs: Option<usize>) -> Result<()> {
    let corpora = batch::discover_corpora(dir)?;
    if corpora.is_empty() {
        bail!("no .dx1 corpora found below {}", dir.display());
    }
    std::fs::create_dir_all(results).with_context(|| format!("create {}", results.display()))?;

    let jobs = jobs.or_else(default_jobs).unwrap_or(1);
    let exe = env::current_exe().context("locate morpho executable")?;
    let units = batch::plan(&corpora, lengths, results);
    info!(
        "running {} segmentations over {} corpora with {jobs} jobs",
        units.len(),
        corpora.len()
    );

    let outcome = batch::run(&units, &exe, jobs)?;
    info!("{} succeeded, {} failed", outcome.succeeded, outcome.failed.len());
    if !outcome.failed.is_empty() {
        bail!("{} of {} batch units failed", outcome.failed.len(), units.len());
    }
    Ok(())
}

fn default_jobs() -> Option<usize> {
    env::var("MORPHO_JOBS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_env("MORPHO_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new(default))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}
