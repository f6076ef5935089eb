//! Evaluation harness: forward-chaining cross-validation of a classifier over the feature matrix.

mod metrics;
mod split;

pub use metrics::{
    alert_reduction_curve, confidence_histogram, roc_auc, roc_curve, top_error_categories,
    CategoryErrors, HistogramBin, ReductionPoint, RocPoint,
};
pub use split::{Fold, TimeSeriesSplit};

use crate::config::EvalConfig;
use crate::error::{PipelineError, Result};
use crate::features::FeatureMatrix;
use crate::model::Classifier;
use ndarray::{s, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldResult {
    pub fold: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub test_positives: usize,
    /// Undefined when the test block holds a single class
    pub roc_auc: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeight {
    pub feature: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub folds: Vec<FoldResult>,
    /// Mean over folds with a defined ROC-AUC
    pub mean_roc_auc: Option<f64>,
    /// Test-fold targets and probabilities, pooled in fold order
    pub y_true: Vec<u8>,
    pub proba: Vec<f64>,
    pub roc_curve: Vec<RocPoint>,
    pub alert_reduction: Vec<ReductionPoint>,
    pub confidence_histogram: Vec<HistogramBin>,
    /// Empty unless the matrix carries row categories
    pub top_error_categories: Vec<CategoryErrors>,
    /// Weights of the model fitted on the last fold
    pub coefficients: Vec<FeatureWeight>,
    pub intercept: Option<f64>,
}

impl EvaluationReport {
    pub fn fold_aucs(&self) -> Vec<Option<f64>> {
        self.folds.iter().map(|f| f.roc_auc).collect()
    }
}

/// Cross-validate `model` on `(x, y)` with `n_splits` forward-chaining folds.
/// Rows must already be in time order.
pub fn evaluate<C: Classifier>(
    model: &mut C,
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, u8>,
    n_splits: usize,
) -> Result<EvaluationReport> {
    let names: Vec<String> = (0..x.ncols()).map(|i| format!("x{i}")).collect();
    let config = EvalConfig { n_splits, ..EvalConfig::default() };
    run(model, x, y, &config, &names, &[])
}

/// [`evaluate`] over a named matrix with the configured folds and curve settings.
/// Row categories, when present, feed the per-category error breakdown.
pub fn evaluate_matrix<C: Classifier>(
    model: &mut C,
    matrix: &FeatureMatrix,
    config: &EvalConfig,
) -> Result<EvaluationReport> {
    run(
        model,
        matrix.x.view(),
        matrix.y.view(),
        config,
        &matrix.columns,
        &matrix.categories,
    )
}

fn run<C: Classifier>(
    model: &mut C,
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, u8>,
    config: &EvalConfig,
    names: &[String],
    categories: &[String],
) -> Result<EvaluationReport> {
    if x.nrows() != y.len() {
        return Err(PipelineError::Shape(format!("{} rows, {} labels", x.nrows(), y.len())));
    }
    let splitter = TimeSeriesSplit::new(config.n_splits)?;
    let folds = splitter.split(x.nrows())?;
    tracing::info!(rows = x.nrows(), n_splits = splitter.n_splits(), "cross-validation started");

    let mut results = Vec::with_capacity(folds.len());
    let mut y_true = Vec::new();
    let mut proba = Vec::new();

    for (i, fold) in folds.iter().enumerate() {
        let x_train = x.slice(s![fold.train.clone(), ..]);
        let y_train = y.slice(s![fold.train.clone()]);
        let x_test = x.slice(s![fold.test.clone(), ..]);
        let y_test = y.slice(s![fold.test.clone()]);

        model.fit(x_train, y_train)?;
        let p = model.predict_proba(x_test)?;

        let y_fold: Vec<u8> = y_test.to_vec();
        let p_fold: Vec<f64> = p.to_vec();
        let auc = roc_auc(&y_fold, &p_fold);
        match auc {
            Some(v) => tracing::info!(fold = i + 1, roc_auc = v, "fold evaluated"),
            None => tracing::warn!(fold = i + 1, "single-class test fold; ROC-AUC undefined"),
        }

        results.push(FoldResult {
            fold: i + 1,
            train_rows: fold.train.len(),
            test_rows: fold.test.len(),
            test_positives: y_fold.iter().filter(|v| **v > 0).count(),
            roc_auc: auc,
        });
        y_true.extend(y_fold);
        proba.extend(p_fold);
    }

    let defined: Vec<f64> = results.iter().filter_map(|r| r.roc_auc).collect();
    let mean_roc_auc = if defined.is_empty() {
        None
    } else {
        Some(defined.iter().sum::<f64>() / defined.len() as f64)
    };
    if let Some(m) = mean_roc_auc {
        tracing::info!(mean_roc_auc = m, "cross-validation complete");
    }

    let coefficients = model
        .coefficients()
        .map(|w| {
            names
                .iter()
                .zip(w.iter())
                .map(|(n, v)| FeatureWeight { feature: n.clone(), weight: *v })
                .collect()
        })
        .unwrap_or_default();

    // Test folds are contiguous and run to the last row.
    let pooled_from = folds.first().map_or(0, |f| f.test.start);
    let top_errors = if categories.len() == x.nrows() {
        top_error_categories(
            &categories[pooled_from..],
            &y_true,
            &proba,
            config.decision_threshold,
            config.top_error_categories,
        )
    } else {
        Vec::new()
    };

    Ok(EvaluationReport {
        folds: results,
        mean_roc_auc,
        roc_curve: roc_curve(&y_true, &proba),
        alert_reduction: alert_reduction_curve(&y_true, &proba, config.reduction_steps),
        confidence_histogram: confidence_histogram(&proba, config.histogram_bins),
        top_error_categories: top_errors,
        y_true,
        proba,
        coefficients,
        intercept: model.intercept(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LogisticRegression;
    use ndarray::{Array1, Array2};

    fn alternating(n: usize) -> (Array2<f64>, Array1<u8>) {
        let mut x = Array2::zeros((n, 2));
        let mut y = Array1::zeros(n);
        for i in 0..n {
            let attack = i % 3 == 0;
            y[i] = attack as u8;
            x[[i, 0]] = (if attack { 1.0 } else { 0.0 }) + (i % 5) as f64 * 0.01;
            x[[i, 1]] = (i % 7) as f64;
        }
        (x, y)
    }

    #[test]
    fn learns_an_informative_column() {
        let (x, y) = alternating(60);
        let mut m = LogisticRegression::new(&EvalConfig::default());
        let r = evaluate(&mut m, x.view(), y.view(), 3).unwrap();
        assert_eq!(r.folds.len(), 3);
        assert_eq!(r.y_true.len(), 45);
        assert_eq!(r.proba.len(), 45);
        assert!(r.mean_roc_auc.unwrap() > 0.95);
        assert_eq!(r.coefficients.len(), 2);
        assert_eq!(r.alert_reduction.len(), 50);
        assert_eq!(r.confidence_histogram.len(), 50);
        assert_eq!(r.confidence_histogram.iter().map(|b| b.count).sum::<usize>(), 45);
        assert!(r.top_error_categories.is_empty());
        assert!(r.intercept.is_some());
        for f in &r.folds {
            assert!(f.train_rows > 0);
        }
    }

    #[test]
    fn single_class_fold_has_no_auc() {
        let (x, _) = alternating(12);
        let mut y = Array1::<u8>::zeros(12);
        y[0] = 1;
        let mut m = LogisticRegression::new(&EvalConfig::default());
        let r = evaluate(&mut m, x.view(), y.view(), 3).unwrap();
        assert!(r.fold_aucs().iter().all(Option::is_none));
        assert_eq!(r.mean_roc_auc, None);
        assert!(r.roc_curve.is_empty());
    }

    #[test]
    fn too_many_splits_is_an_error() {
        let (x, y) = alternating(3);
        let mut m = LogisticRegression::new(&EvalConfig::default());
        let r = evaluate(&mut m, x.view(), y.view(), 3);
        assert!(matches!(r, Err(PipelineError::Evaluation(_))));
    }

    #[test]
    fn matrix_categories_feed_error_breakdown() {
        let (x, y) = alternating(60);
        let columns = vec!["signal".to_string(), "noise".to_string()];
        let mut matrix = FeatureMatrix::new(columns, x, y).unwrap();
        // Flipped targets on rows the informative column gets right are certain errors.
        matrix.categories = (0..60).map(|i| format!("cat-{}", i % 2)).collect();
        for i in [20usize, 40, 50] {
            matrix.y[i] = 1 - matrix.y[i];
        }
        let mut m = LogisticRegression::new(&EvalConfig::default());
        let r = evaluate_matrix(&mut m, &matrix, &EvalConfig::default()).unwrap();
        let total: usize = r.top_error_categories.iter().map(|c| c.errors).sum();
        assert!(total >= 3, "{:?}", r.top_error_categories);
        assert!(r.top_error_categories.len() <= 2);
        assert!(r.top_error_categories.windows(2).all(|w| w[0].errors >= w[1].errors));
        assert_eq!(r.coefficients[0].feature, "signal");
    }
}
