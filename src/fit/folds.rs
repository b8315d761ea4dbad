//! k-fold partition of observation indices.
//!
//! Fold sizes differ by at most one: the first `n % k` folds hold one extra
//! observation. Every index lands in exactly one fold.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::FitError;

/// How observations are dealt into folds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FoldStrategy {
    /// Consecutive runs of indices in row order.
    Contiguous,
    /// A seeded shuffle of the indices, then consecutive runs.
    Shuffled { seed: u64 },
}

impl Default for FoldStrategy {
    fn default() -> Self {
        FoldStrategy::Shuffled { seed: 42 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldAssignment {
    n: usize,
    /// Held-out indices per fold, ascending within a fold.
    folds: Vec<Vec<usize>>,
}

impl FoldAssignment {
    pub fn n_folds(&self) -> usize {
        self.folds.len()
    }

    pub fn n_observations(&self) -> usize {
        self.n
    }

    pub fn folds(&self) -> &[Vec<usize>] {
        &self.folds
    }

    /// Held-out indices of fold `f`.
    pub fn test(&self, f: usize) -> &[usize] {
        &self.folds[f]
    }

    /// Every index not in fold `f`, ascending.
    pub fn train(&self, f: usize) -> Vec<usize> {
        let held_out = &self.folds[f];
        (0..self.n)
            .filter(|i| held_out.binary_search(i).is_err())
            .collect()
    }
}

/// Partition `0..n` into `k` folds.
pub fn assign_folds(n: usize, k: usize, strategy: FoldStrategy) -> Result<FoldAssignment, FitError> {
    if k < 2 {
        return Err(FitError::InvalidFoldCount { folds: k });
    }
    if k > n {
        return Err(FitError::InsufficientFoldSize {
            folds: k,
            observations: n,
        });
    }

    let mut indices: Vec<usize> = (0..n).collect();
    if let FoldStrategy::Shuffled { seed } = strategy {
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);
    }

    let base = n / k;
    let extra = n % k;
    let mut folds = Vec::with_capacity(k);
    let mut start = 0;
    for f in 0..k {
        let size = if f < extra { base + 1 } else { base };
        let mut fold = indices[start..start + size].to_vec();
        fold.sort_unstable();
        folds.push(fold);
        start += size;
    }

    Ok(FoldAssignment { n, folds })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(assignment: &FoldAssignment, n: usize, k: usize) {
        assert_eq!(assignment.n_folds(), k);
        let mut seen = vec![0usize; n];
        for fold in assignment.folds() {
            for &i in fold {
                seen[i] += 1;
            }
        }
        assert!(seen.iter().all(|&c| c == 1), "every index exactly once");

        let sizes: Vec<usize> = assignment.folds().iter().map(Vec::len).collect();
        let max = *sizes.iter().max().unwrap();
        let min = *sizes.iter().min().unwrap();
        assert!(max - min <= 1, "fold sizes {sizes:?}");
    }

    #[test]
    fn contiguous_folds_cover_every_index_once() {
        for (n, k) in [(10, 3), (100, 10), (7, 7), (23, 5)] {
            let a = assign_folds(n, k, FoldStrategy::Contiguous).unwrap();
            assert_partition(&a, n, k);
        }
        let a = assign_folds(10, 3, FoldStrategy::Contiguous).unwrap();
        assert_eq!(a.test(0), &[0, 1, 2, 3]);
        assert_eq!(a.test(2), &[7, 8, 9]);
    }

    #[test]
    fn shuffled_folds_are_seeded() {
        let a = assign_folds(57, 10, FoldStrategy::Shuffled { seed: 1 }).unwrap();
        let b = assign_folds(57, 10, FoldStrategy::Shuffled { seed: 1 }).unwrap();
        let c = assign_folds(57, 10, FoldStrategy::Shuffled { seed: 2 }).unwrap();
        assert_partition(&a, 57, 10);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn train_is_complement_of_test() {
        let a = assign_folds(12, 4, FoldStrategy::Shuffled { seed: 9 }).unwrap();
        for f in 0..4 {
            let train = a.train(f);
            assert_eq!(train.len() + a.test(f).len(), 12);
            assert!(train.iter().all(|i| !a.test(f).contains(i)));
        }
    }

    #[test]
    fn rejects_bad_fold_counts() {
        assert_eq!(
            assign_folds(5, 6, FoldStrategy::Contiguous).unwrap_err(),
            FitError::InsufficientFoldSize {
                folds: 6,
                observations: 5
            }
        );
        assert_eq!(
            assign_folds(5, 1, FoldStrategy::Contiguous).unwrap_err(),
            FitError::InvalidFoldCount { folds: 1 }
        );
    }
}
