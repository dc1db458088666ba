//! Seeded train/held-out split

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Row indices of both sides of a split
#[derive(Debug, Clone, PartialEq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n_samples` with `seed` and hold out `ceil(n_samples * test_size)` rows.
///
/// At least one row stays on the training side whenever `n_samples > 0`.
pub fn train_test_split(n_samples: usize, test_size: f64, seed: u64) -> SplitIndices {
    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n_samples as f64) * test_size.clamp(0.0, 1.0)).ceil() as usize;
    let n_test = n_test.min(n_samples.saturating_sub(1));

    let train = indices.split_off(n_test);
    SplitIndices { train, test: indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sizes() {
        let split = train_test_split(10, 0.2, 42);
        assert_eq!(split.test.len(), 2);
        assert_eq!(split.train.len(), 8);

        // ceil(11 * 0.2) = 3
        let split = train_test_split(11, 0.2, 42);
        assert_eq!(split.test.len(), 3);
    }

    #[test]
    fn test_split_is_partition() {
        let split = train_test_split(50, 0.2, 7);
        let mut all: Vec<usize> = split.train.iter().chain(split.test.iter()).copied().collect();
        all.sort();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_reproducible() {
        assert_eq!(train_test_split(100, 0.2, 42), train_test_split(100, 0.2, 42));
        assert_ne!(train_test_split(100, 0.2, 42), train_test_split(100, 0.2, 43));
    }

    #[test]
    fn test_split_keeps_training_row() {
        let split = train_test_split(1, 0.5, 42);
        assert_eq!(split.train, vec![0]);
        assert!(split.test.is_empty());
    }
}
