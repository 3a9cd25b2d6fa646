use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::DatasetError;

/// Row indices of a seeded train/test partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Number of test rows for `test_size` over `n_rows`, rounded up.
pub fn test_row_count(n_rows: usize, test_size: f64) -> usize {
    // absorbs products such as 0.2 * 100 landing just above an integer
    ((test_size * n_rows as f64) - 1e-9).ceil().max(0.0) as usize
}

/// Shuffle `0..n_rows` with `seed` and take the first `ceil(n * test_size)` as test rows.
pub fn train_test_split(
    n_rows: usize,
    test_size: f64,
    seed: u64,
) -> Result<SplitIndices, DatasetError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(DatasetError::InvalidTestSize(test_size));
    }
    let n_test = test_row_count(n_rows, test_size);
    if n_test == 0 || n_test >= n_rows {
        return Err(DatasetError::EmptyPartition { n_rows, test_size });
    }
    let mut order: Vec<usize> = (0..n_rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);
    let train = order.split_off(n_test);
    Ok(SplitIndices { train, test: order })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_percent_of_hundred_is_twenty() {
        let split = train_test_split(100, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 20);
        assert_eq!(split.train.len(), 80);
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_same_partition() {
        assert_eq!(train_test_split(50, 0.3, 7).unwrap(), train_test_split(50, 0.3, 7).unwrap());
        assert_ne!(train_test_split(50, 0.3, 7).unwrap(), train_test_split(50, 0.3, 8).unwrap());
    }

    #[test]
    fn rounds_test_rows_up() {
        assert_eq!(test_row_count(3, 0.2), 1);
        assert_eq!(test_row_count(10, 0.25), 3);
    }

    #[test]
    fn rejects_degenerate_sizes() {
        assert!(matches!(train_test_split(10, 0.0, 1), Err(DatasetError::InvalidTestSize(_))));
        assert!(matches!(train_test_split(10, 1.0, 1), Err(DatasetError::InvalidTestSize(_))));
        assert!(matches!(
            train_test_split(1, 0.5, 1),
            Err(DatasetError::EmptyPartition { .. })
        ));
    }
}
