//! The sizes allocated during one cycle.

use crate::config::Config;

/// Allocation sizes for a single cycle: `start`, `2 * start`, `4 * start`,
/// and so on, stopping before a size would reach `limit`.
///
/// A fresh `Sizes` is created for every cycle, so each one begins at
/// `start` again.
#[derive(Debug, Clone)]
pub struct Sizes {
    next: Option<usize>,
    limit: usize,
}

impl Sizes {
    /// Sizes from `start` up to but excluding `limit`.
    pub fn new(start: usize, limit: usize) -> Sizes {
        Sizes {
            next: Some(start),
            limit,
        }
    }
}

impl Iterator for Sizes {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let size = self.next.filter(|&size| size < self.limit)?;
        // Doubling past `usize::MAX` is certainly past the limit.
        self.next = size.checked_mul(2);
        Some(size)
    }
}

/// The sizes of one cycle under `config`.
pub fn sizes(config: &Config) -> Sizes {
    Sizes::new(config.start(), config.limit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MB;

    #[test]
    fn doubles_until_the_limit() {
        let config = Config::from_args(&["3", "50", "1"]).unwrap();
        let sizes: Vec<usize> = sizes(&config).collect();
        assert_eq!(sizes, vec![3 * MB, 6 * MB, 12 * MB, 24 * MB, 48 * MB]);
    }

    #[test]
    fn limit_is_exclusive() {
        let sizes: Vec<usize> = Sizes::new(MB, 4 * MB).collect();
        assert_eq!(sizes, vec![MB, 2 * MB]);
    }

    #[test]
    fn size_between_doublings_is_kept() {
        let config = Config::from_args(&["1", "3", "1"]).unwrap();
        let sizes: Vec<usize> = sizes(&config).collect();
        assert_eq!(sizes, vec![1_048_576, 2_097_152]);
    }

    #[test]
    fn every_term_is_increasing_and_under_the_limit() {
        for &(start, limit) in &[(1, 2), (1, 1024), (7, 100), (5, 6), (1000, 1_000_000)] {
            let sizes: Vec<usize> = Sizes::new(start, limit).collect();
            assert_eq!(sizes[0], start);
            for pair in sizes.windows(2) {
                assert_eq!(pair[1], pair[0] * 2);
            }
            assert!(sizes.iter().all(|&s| s < limit));
            assert!(sizes.last().unwrap() * 2 >= limit);
        }
    }

    #[test]
    fn stops_instead_of_overflowing() {
        let start = usize::MAX / 2 + 1;
        let sizes: Vec<usize> = Sizes::new(start, usize::MAX).collect();
        assert_eq!(sizes, vec![start]);
    }
}
