//! Grouping running tokens into context windows.
//!
//! The window length strongly affects which words count as co-occurring, so
//! it is either fixed or drawn per window from a caller-seeded RNG.

use rand::Rng;
use tracing::info;

use crate::EndingError;
use crate::counter::{CounterConfig, StemEndingCounter};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowLength {
    Fixed(usize),
    /// Uniform in `min..=max`, drawn once per window.
    Random { min: usize, max: usize },
}

impl Default for WindowLength {
    fn default() -> Self {
        WindowLength::Random { min: 5, max: 15 }
    }
}

impl WindowLength {
    fn validate(&self) -> Result<(), EndingError> {
        match *self {
            WindowLength::Fixed(0) => Err(EndingError::InvalidWindow(
                "fixed window length must be positive".into(),
            )),
            WindowLength::Random { min, max } if min == 0 || min > max => {
                Err(EndingError::InvalidWindow(format!(
                    "random window range {min}..={max} must be positive and non-empty"
                )))
            }
            _ => Ok(()),
        }
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        match *self {
            WindowLength::Fixed(n) => n,
            WindowLength::Random { min, max } => rng.gen_range(min..=max),
        }
    }
}

/// Split `tokens` into consecutive windows; the last one may be shorter.
pub fn windows<S, R>(
    tokens: &[S],
    length: WindowLength,
    rng: &mut R,
) -> Result<Vec<Vec<String>>, EndingError>
where
    S: AsRef<str>,
    R: Rng + ?Sized,
{
    length.validate()?;
    if tokens.is_empty() {
        return Err(EndingError::DegenerateInput("no tokens to window"));
    }

    let mut out = Vec::new();
    let mut rest = tokens;
    while !rest.is_empty() {
        let take = length.draw(rng).min(rest.len());
        let (head, tail) = rest.split_at(take);
        out.push(head.iter().map(|t| t.as_ref().to_string()).collect());
        rest = tail;
    }
    Ok(out)
}

/// Build a counter from every pair of every window.
pub fn group_windows(windows: &[Vec<String>], config: CounterConfig) -> StemEndingCounter {
    let mut counter = StemEndingCounter::new(config);
    for window in windows {
        counter.add_window(window);
    }
    info!(
        "grouped {} windows into {} stems",
        windows.len(),
        counter.len()
    );
    counter
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn tokens(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("w{i}")).collect()
    }

    #[test]
    fn fixed_windows_cover_all_tokens() {
        let mut rng = StdRng::seed_from_u64(7);
        let out = windows(&tokens(10), WindowLength::Fixed(4), &mut rng).unwrap();
        let lens: Vec<usize> = out.iter().map(Vec::len).collect();
        assert_eq!(lens, vec![4, 4, 2]);
        assert_eq!(out[2], vec!["w8".to_string(), "w9".to_string()]);
    }

    #[test]
    fn random_windows_stay_in_range_and_are_reproducible() {
        let length = WindowLength::Random { min: 5, max: 15 };
        let input = tokens(200);
        let first = windows(&input, length, &mut StdRng::seed_from_u64(42)).unwrap();
        let second = windows(&input, length, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(first, second);
        let (last, full) = first.split_last().unwrap();
        assert!(full.iter().all(|w| (5..=15).contains(&w.len())));
        assert!(!last.is_empty());
        assert_eq!(first.iter().map(Vec::len).sum::<usize>(), 200);
    }

    #[test]
    fn rejects_empty_windows_and_tokens() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            windows(&tokens(3), WindowLength::Fixed(0), &mut rng),
            Err(EndingError::InvalidWindow(_))
        ));
        assert!(matches!(
            windows(&tokens(3), WindowLength::Random { min: 4, max: 2 }, &mut rng),
            Err(EndingError::InvalidWindow(_))
        ));
        let none: Vec<String> = Vec::new();
        assert_eq!(
            windows(&none, WindowLength::Fixed(3), &mut rng),
            Err(EndingError::DegenerateInput("no tokens to window"))
        );
    }

    #[test]
    fn grouping_feeds_counter() {
        let windows = vec![
            vec!["run".to_string(), "runs".to_string()],
            vec!["run".to_string(), "running".to_string()],
        ];
        let counter = group_windows(&windows, CounterConfig::default());
        assert_eq!(counter.word_count("run"), 2);
        assert_eq!(counter.ending_trie("run").unwrap().evidence_count(), 2);
    }
}
