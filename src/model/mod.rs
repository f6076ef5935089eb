//! Probabilistic binary classifiers used by the evaluation harness.

mod logistic;

pub use logistic::LogisticRegression;

use crate::error::Result;
use ndarray::{Array1, ArrayView1, ArrayView2};

/// A binary classifier producing attack probabilities. The harness only relies on this.
pub trait Classifier {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, u8>) -> Result<()>;

    /// Probability of the positive class per row, in [0, 1].
    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>>;

    /// Per-feature weights, when the model has them.
    fn coefficients(&self) -> Option<Array1<f64>> {
        None
    }

    fn intercept(&self) -> Option<f64> {
        None
    }
}
