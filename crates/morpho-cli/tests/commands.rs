use std::fs;
use std::path::PathBuf;

use morpho_cli::{
    Format, check_ending, counts_path, discover_endings, make_corpus, results_path,
    segment_corpus,
};
use morpho_corpus::{Corpus, LoadMode};
use morpho_endings::{CounterConfig, WindowLength};
use tempfile::TempDir;

const TEXT: &str = "The walker walked while talking, and the talker talks walking.\n\
    She walks and talks; he jumped and jumps, jumping over the walkers who talked.";

fn fixture(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn segments_a_count_file() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "walk.dx1", "walking\t3\nwalked\t2\nwalks\t1\nan\t9\n");
    let report = segment_corpus(&path, 4, LoadMode::Mmap).unwrap();
    assert_eq!(report.corpus, "walk");
    assert_eq!(report.words, 3);
    assert_eq!(report.skipped, 1);
    for chunks in &report.forward {
        assert_eq!(chunks[0], "walk");
    }
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["min_stem_len"], 4);
}

#[test]
fn rejects_zero_stem_length() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "walk.dx1", "walking\t3\n");
    assert!(segment_corpus(&path, 0, LoadMode::Owned).is_err());
}

#[test]
fn seeded_ending_runs_are_reproducible() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "story.txt", TEXT);
    let run = || {
        discover_endings(
            &path,
            CounterConfig::default(),
            WindowLength::default(),
            Some(11),
            LoadMode::Owned,
        )
        .unwrap()
    };
    let first = run();
    let second = run();
    assert_eq!(first, second);
    assert_eq!(first.tokens, 25);
    assert!(!first.dominance.is_empty());
    assert!(first.dominance.iter().all(|row| row.dominance <= 1.0));

    let mut out = Vec::new();
    first.write_text(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("association preference: "));
    assert!(text.contains("\n----------\n"));
}

#[test]
fn make_corpus_appends_extension_and_reloads() {
    let dir = TempDir::new().unwrap();
    let text = fixture(&dir, "story.txt", TEXT);
    let target = make_corpus(
        &text,
        &dir.path().join("story"),
        Some("tester"),
        None,
        LoadMode::Mmap,
    )
    .unwrap();
    assert_eq!(target, dir.path().join("story.dx1"));

    let written = fs::read_to_string(&target).unwrap();
    assert!(written.starts_with("# author: tester\n# from '"));
    let corpus = Corpus::load(&target, None, LoadMode::Mmap).unwrap();
    assert_eq!(corpus.total_occurrences(), 25);
    assert_eq!(corpus.count("and"), 3);

    let check = check_ending(&corpus, "ed").unwrap();
    assert_eq!(check.with_ending, 3);
    assert!(check.matches.contains_key("walk"));
}

#[test]
fn output_paths() {
    assert_eq!(
        counts_path(&PathBuf::from("out/english.dx1")),
        PathBuf::from("out/english.dx1")
    );
    assert_eq!(
        counts_path(&PathBuf::from("out/english")),
        PathBuf::from("out/english.dx1")
    );
    assert_eq!(
        results_path(&PathBuf::from("r"), &PathBuf::from("c/story.txt"), Format::Text),
        PathBuf::from("r/results_story.txt")
    );
}
