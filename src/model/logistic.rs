//! L2-regularized logistic regression trained by full-batch gradient descent.
//! Features are standardized with the statistics of the training set, and
//! classes can be reweighted inversely to their frequency.

use super::Classifier;
use crate::config::EvalConfig;
use crate::error::{PipelineError, Result};
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

#[derive(Debug, Clone)]
pub struct LogisticRegression {
    max_iter: usize,
    learning_rate: f64,
    c: f64,
    tolerance: f64,
    balanced: bool,
    fitted: Option<Fitted>,
}

#[derive(Debug, Clone)]
struct Fitted {
    mean: Array1<f64>,
    scale: Array1<f64>,
    weights: Array1<f64>,
    bias: f64,
}

impl LogisticRegression {
    pub fn new(config: &EvalConfig) -> Self {
        Self {
            max_iter: config.max_iter,
            learning_rate: config.learning_rate,
            c: config.c,
            tolerance: config.tolerance,
            balanced: config.balanced,
            fitted: None,
        }
    }

    fn sample_weights(&self, y: &Array1<f64>) -> Array1<f64> {
        if !self.balanced {
            return Array1::ones(y.len());
        }
        let n = y.len() as f64;
        let pos = y.sum();
        let neg = n - pos;
        let classes = [pos, neg].iter().filter(|c| **c > 0.0).count() as f64;
        let w_pos = if pos > 0.0 { n / (classes * pos) } else { 0.0 };
        let w_neg = if neg > 0.0 { n / (classes * neg) } else { 0.0 };
        y.mapv(|v| if v > 0.5 { w_pos } else { w_neg })
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, u8>) -> Result<()> {
        let n = x.nrows();
        if n == 0 {
            return Err(PipelineError::Model("cannot fit on an empty training set".into()));
        }
        if y.len() != n {
            return Err(PipelineError::Shape(format!("{} rows, {} labels", n, y.len())));
        }
        if self.c <= 0.0 {
            return Err(PipelineError::Model(format!(
                "regularization C must be positive, got {}",
                self.c
            )));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| PipelineError::Model("no rows to standardize".into()))?;
        let scale = x.std_axis(Axis(0), 0.0).mapv(|s| if s > 0.0 { s } else { 1.0 });
        let z = (&x - &mean) / &scale;

        let target = y.mapv(|v| if v > 0 { 1.0 } else { 0.0 });
        let sw = self.sample_weights(&target);
        let nf = n as f64;

        let mut weights = Array1::<f64>::zeros(x.ncols());
        let mut bias = 0.0;
        let mut iterations = 0;

        for _ in 0..self.max_iter {
            iterations += 1;
            let p = (z.dot(&weights) + bias).mapv(sigmoid);
            let residual = (&p - &target) * &sw;
            let grad_w = z.t().dot(&residual) / nf + &weights / (self.c * nf);
            let grad_b = residual.sum() / nf;

            weights = weights - &grad_w * self.learning_rate;
            bias -= self.learning_rate * grad_b;

            let largest = grad_w.iter().fold(grad_b.abs(), |m, g| m.max(g.abs()));
            if largest < self.tolerance {
                break;
            }
        }

        tracing::debug!(rows = n, iterations, "logistic regression fitted");
        self.fitted = Some(Fitted { mean, scale, weights, bias });
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        let f = self
            .fitted
            .as_ref()
            .ok_or_else(|| PipelineError::Model("predict called before fit".into()))?;
        if x.ncols() != f.weights.len() {
            return Err(PipelineError::Shape(format!(
                "model has {} features, input has {}",
                f.weights.len(),
                x.ncols()
            )));
        }
        let z = (&x - &f.mean) / &f.scale;
        Ok((z.dot(&f.weights) + f.bias).mapv(sigmoid))
    }

    fn coefficients(&self) -> Option<Array1<f64>> {
        self.fitted.as_ref().map(|f| f.weights.clone())
    }

    fn intercept(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.bias)
    }
}
