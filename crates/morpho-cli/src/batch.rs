//! Fan segmentation runs out over a directory of corpora.
//!
//! One child process per `(corpus, length)` unit. Failures are logged and
//! counted but never retried, and outputs are not aggregated.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchUnit {
    pub corpus: PathBuf,
    pub min_stem_len: usize,
    pub output: PathBuf,
}

impl BatchUnit {
    fn command(&self, exe: &Path) -> Command {
        let mut cmd = Command::new(exe);
        cmd.arg("segment")
            .arg(&self.corpus)
            .arg(self.min_stem_len.to_string())
            .arg("-o")
            .arg(&self.output);
        cmd
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BatchOutcome {
    pub succeeded: usize,
    pub failed: Vec<PathBuf>,
}

/// `*.dx1` files exactly one directory below `root`, sorted.
pub fn discover_corpora(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(root).with_context(|| format!("read {}", root.display()))? {
        let dir = entry.with_context(|| format!("read {}", root.display()))?.path();
        if !dir.is_dir() {
            continue;
        }
        for entry in fs::read_dir(&dir).with_context(|| format!("read {}", dir.display()))? {
            let path = entry.with_context(|| format!("read {}", dir.display()))?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == "dx1") {
                found.push(path);
            }
        }
    }
    found.sort();
    Ok(found)
}

/// Every corpus at every length, written to `<results>/<stem>_<length>.txt`.
pub fn plan(corpora: &[PathBuf], lengths: &[usize], results: &Path) -> Vec<BatchUnit> {
    let mut units = Vec::with_capacity(corpora.len() * lengths.len());
    for corpus in corpora {
        let stem = corpus
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        for &min_stem_len in lengths {
            units.push(BatchUnit {
                corpus: corpus.clone(),
                min_stem_len,
                output: results.join(format!("{stem}_{min_stem_len}.txt")),
            });
        }
    }
    units
}

/// Run `units` with at most `jobs` children alive at once.
///
/// A free slot goes to the next unit as soon as any child exits.
pub fn run(units: &[BatchUnit], exe: &Path, jobs: usize) -> Result<BatchOutcome> {
    let jobs = jobs.max(1);
    let mut outcome = BatchOutcome::default();
    let mut running: Vec<(&BatchUnit, Child)> = Vec::new();

    for unit in units {
        while running.len() >= jobs {
            reap(&mut running, &mut outcome);
        }
        info!(
            "segment {} (k = {}) -> {}",
            unit.corpus.display(),
            unit.min_stem_len,
            unit.output.display()
        );
        match unit.command(exe).spawn() {
            Ok(child) => running.push((unit, child)),
            Err(err) => {
                warn!("failed to start {}: {err}", unit.corpus.display());
                outcome.failed.push(unit.output.clone());
            }
        }
    }
    while !running.is_empty() {
        reap(&mut running, &mut outcome);
    }
    Ok(outcome)
}

/// Record every child that has exited, sleeping briefly when none has.
fn reap(running: &mut Vec<(&BatchUnit, Child)>, outcome: &mut BatchOutcome) {
    let mut finished = false;
    let mut i = 0;
    while i < running.len() {
        let status = match running[i].1.try_wait() {
            Ok(None) => {
                i += 1;
                continue;
            }
            Ok(Some(status)) => Ok(status),
            Err(err) => Err(err),
        };
        let (unit, _) = running.swap_remove(i);
        record(outcome, unit, status);
        finished = true;
    }
    if !finished {
        thread::sleep(POLL_INTERVAL);
    }
}

fn record(outcome: &mut BatchOutcome, unit: &BatchUnit, status: std::io::Result<ExitStatus>) {
    match status {
        Ok(status) if status.success() => outcome.succeeded += 1,
        Ok(status) => {
            warn!(
                "{} (k = {}) exited with {status}",
                unit.corpus.display(),
                unit.min_stem_len
            );
            outcome.failed.push(unit.output.clone());
        }
        Err(err) => {
            warn!("waiting on {} failed: {err}", unit.corpus.display());
            outcome.failed.push(unit.output.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_one_level_down() {
        let dir = tempfile::tempdir().unwrap();
        let lang = dir.path().join("english");
        fs::create_dir(&lang).unwrap();
        fs::write(lang.join("a.dx1"), "a\t1\n").unwrap();
        fs::write(lang.join("notes.txt"), "").unwrap();
        fs::write(dir.path().join("top.dx1"), "a\t1\n").unwrap();

        let found = discover_corpora(dir.path()).unwrap();
        assert_eq!(found, vec![lang.join("a.dx1")]);
    }

    #[test]
    fn plans_every_length() {
        let units = plan(
            &[PathBuf::from("corpora/en/english.dx1")],
            &[4, 5],
            Path::new("results"),
        );
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].output, PathBuf::from("results/english_4.txt"));
        assert_eq!(units[1].min_stem_len, 5);
    }

    #[cfg(unix)]
    #[test]
    fn free_slot_is_reused_before_slow_child_exits() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("finished.log");
        let exe = dir.path().join("fake-morpho");
        fs::write(
            &exe,
            format!(
                "#!/bin/sh\ncase \"$2\" in *slow*) sleep 1 ;; esac\necho \"$2\" >> {}\n",
                log.display()
            ),
        )
        .unwrap();
        fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();

        let corpora: Vec<PathBuf> = ["slow", "fast1", "fast2", "fast3"]
            .iter()
            .map(|name| PathBuf::from(format!("{name}.dx1")))
            .collect();
        let units = plan(&corpora, &[4], dir.path());
        let outcome = run(&units, &exe, 2).unwrap();
        assert_eq!(outcome.succeeded, 4);

        let finished = fs::read_to_string(&log).unwrap();
        let order: Vec<&str> = finished.lines().collect();
        assert_eq!(order.len(), 4);
        assert_eq!(order.last(), Some(&"slow.dx1"));
    }

    #[test]
    fn missing_executable_fails_each_unit() {
        let units = plan(&[PathBuf::from("x.dx1")], &[4, 5], Path::new("out"));
        let outcome = run(&units, Path::new("/nonexistent/morpho"), 2).unwrap();
        assert_eq!(outcome.succeeded, 0);
        assert_eq!(outcome.failed.len(), 2);
    }
}
