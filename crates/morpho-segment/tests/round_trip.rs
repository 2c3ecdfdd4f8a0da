use std::collections::BTreeSet;

use morpho_segment::{MorphemeSegmenter, stats};

const WORDS: &[&str] = &[
    "walk", "walks", "walked", "walker", "walkers", "walking", "talk", "talked", "talking",
    "stalk", "stalker", "run", "runs", "running", "runner", "rung", "a", "an", "anti",
    "antibody", "body", "bodies",
];

#[test]
fn chunks_reassemble_every_word_for_all_stem_lengths() {
    for k in 1..=6 {
        let segmenter = MorphemeSegmenter::new(k).unwrap();
        let seg = segmenter.segment(WORDS.iter().copied());
        let expected: BTreeSet<String> = WORDS
            .iter()
            .filter(|w| w.chars().count() >= k)
            .map(|w| w.to_string())
            .collect();

        let forward: BTreeSet<String> = seg.forward.all_morphemes().map(|c| c.concat()).collect();
        assert_eq!(forward, expected, "forward paths for k = {k}");
        assert_eq!(seg.forward.word_count(), expected.len());

        let reverse: BTreeSet<String> = seg
            .reverse
            .display_segments()
            .map(|c| c.concat())
            .collect();
        assert_eq!(reverse, expected, "reverse paths for k = {k}");

        for word in &expected {
            let forward_chunks = seg
                .forward
                .morphemes_for(word)
                .unwrap_or_else(|| panic!("{word} missing forward for k = {k}"));
            assert_eq!(&forward_chunks.concat(), word);
            assert!(forward_chunks.iter().all(|c| !c.is_empty()));

            let reverse_chunks = seg
                .reverse
                .morphemes_for(word)
                .unwrap_or_else(|| panic!("{word} missing reverse for k = {k}"));
            assert_eq!(&reverse_chunks.concat(), word);
        }
    }
}

#[test]
fn first_chunk_is_at_least_the_stem_length() {
    let seg = MorphemeSegmenter::new(3)
        .unwrap()
        .segment(WORDS.iter().copied());
    for chunks in seg.forward.all_morphemes() {
        assert!(chunks[0].chars().count() >= 3, "{chunks:?}");
    }
    assert_eq!(seg.skipped, 2);
}

#[test]
fn report_is_finite_for_real_corpus() {
    let seg = MorphemeSegmenter::new(3)
        .unwrap()
        .segment(WORDS.iter().copied());
    let report = stats::corpus_report(&seg).unwrap();
    assert!(report.per_word.combined.mean >= 1.0);
    assert!(report.per_word_variation.is_finite());
    assert!(report.forward_occurrence_variation.is_finite());
    assert!(report.reverse_occurrence_variation.is_finite());
    assert_eq!(
        report.occurrence.forward_table.values().sum::<usize>(),
        seg.forward.morpheme_count_per_word().sum::<usize>()
    );
}
