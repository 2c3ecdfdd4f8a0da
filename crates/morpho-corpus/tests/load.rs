use std::fs;

use morpho_corpus::{Corpus, CorpusFormat, CountOrder, LoadMode, load_tokens};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn both_load_modes_agree() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "english.dx1", "# author: test\nthe\t10\nwalks\t2\nWalked 1\n");
    let mapped = Corpus::load(&path, None, LoadMode::Mmap).unwrap();
    let owned = Corpus::load(&path, None, LoadMode::Owned).unwrap();
    assert_eq!(mapped, owned);
    assert_eq!(mapped.total_occurrences(), 13);
    assert_eq!(mapped.sorted_words(5), vec!["walked", "walks"]);
}

#[test]
fn empty_file_loads_as_empty_corpus() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "empty.txt", "");
    let corpus = Corpus::load(&path, None, LoadMode::Mmap).unwrap();
    assert!(corpus.is_empty());
}

#[test]
fn missing_file_names_the_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.dx1");
    let err = Corpus::load(&path, None, LoadMode::Owned).unwrap_err();
    assert!(err.to_string().contains("absent.dx1"));
}

#[test]
fn text_round_trips_through_count_file() {
    let dir = TempDir::new().unwrap();
    let text = write(&dir, "story.txt", "The dog runs. The dogs ran!\nthe end");
    let corpus = Corpus::load(&text, Some(CorpusFormat::Text), LoadMode::Mmap).unwrap();
    assert_eq!(corpus.count("the"), 3);

    let counts = dir.path().join("story.dx1");
    let mut out = fs::File::create(&counts).unwrap();
    corpus
        .write_counts(&mut out, CountOrder::Alphabetical, &["from 'story.txt'".to_string()])
        .unwrap();
    drop(out);

    let reloaded = Corpus::load(&counts, None, LoadMode::Owned).unwrap();
    assert_eq!(reloaded, corpus);

    let tokens = load_tokens(&text, LoadMode::Owned).unwrap();
    assert_eq!(tokens.len(), 8);
    assert_eq!(tokens[0], "the");
}
