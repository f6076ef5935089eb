//! Forward-chaining splits: every test fold lies strictly after its training rows.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fold {
    pub train: Range<usize>,
    pub test: Range<usize>,
}

/// Expanding-window splitter. With `k` splits the rows are cut into `k + 1`
/// equal blocks (the remainder goes to the first training block); fold `i`
/// trains on everything before block `i + 1` and tests on that block.
#[derive(Debug, Clone, Copy)]
pub struct TimeSeriesSplit {
    n_splits: usize,
}

impl TimeSeriesSplit {
    pub fn new(n_splits: usize) -> Result<Self> {
        if n_splits < 2 {
            return Err(PipelineError::Evaluation(format!(
                "need at least 2 splits, got {n_splits}"
            )));
        }
        Ok(Self { n_splits })
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    pub fn split(&self, n_samples: usize) -> Result<Vec<Fold>> {
        let n_folds = self.n_splits + 1;
        if n_folds > n_samples {
            return Err(PipelineError::Evaluation(format!(
                "cannot make {n_folds} folds from {n_samples} rows"
            )));
        }
        let test_size = n_samples / n_folds;
        let first = n_samples - self.n_splits * test_size;
        Ok((0..self.n_splits)
            .map(|i| {
                let start = first + i * test_size;
                Fold { train: 0..start, test: start..start + test_size }
            })
            .collect())
    }
}
