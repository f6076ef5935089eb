//! Discrimination metrics over predicted attack probabilities.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Area under the ROC curve via the rank-sum statistic, ties sharing the average rank.
/// `None` unless both classes are present.
pub fn roc_auc(y_true: &[u8], scores: &[f64]) -> Option<f64> {
    if y_true.len() != scores.len() {
        return None;
    }
    let n_pos = y_true.iter().filter(|y| **y > 0).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // Ranks are 1-based; the tied block i..=j shares their mean.
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &k in &order[i..=j] {
            if y_true[k] > 0 {
                rank_sum_pos += avg_rank;
            }
        }
        i = j + 1;
    }

    let p = n_pos as f64;
    let n = n_neg as f64;
    Some((rank_sum_pos - p * (p + 1.0) / 2.0) / (p * n))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    pub fpr: f64,
    pub tpr: f64,
    /// Scores at or above this are called attacks; infinite for the origin.
    pub threshold: f64,
}

/// ROC curve with one point per distinct score, highest threshold first.
pub fn roc_curve(y_true: &[u8], scores: &[f64]) -> Vec<RocPoint> {
    let n_pos = y_true.iter().filter(|y| **y > 0).count();
    let n_neg = y_true.len() - n_pos;
    if y_true.len() != scores.len() || n_pos == 0 || n_neg == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut points = vec![RocPoint { fpr: 0.0, tpr: 0.0, threshold: f64::INFINITY }];
    let (mut tp, mut fp) = (0usize, 0usize);
    let mut i = 0;
    while i < order.len() {
        let threshold = scores[order[i]];
        while i < order.len() && scores[order[i]] == threshold {
            if y_true[order[i]] > 0 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        points.push(RocPoint {
            fpr: fp as f64 / n_neg as f64,
            tpr: tp as f64 / n_pos as f64,
            threshold,
        });
    }
    points
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReductionPoint {
    pub threshold: f64,
    /// Share of alerts that would be suppressed (predicted benign)
    pub alert_reduction: f64,
    /// Share of true attacks that would be suppressed
    pub false_negative_rate: f64,
}

/// Alert reduction against missed attacks for `steps` thresholds evenly spaced on [0, 1].
pub fn alert_reduction_curve(y_true: &[u8], proba: &[f64], steps: usize) -> Vec<ReductionPoint> {
    if y_true.is_empty() || y_true.len() != proba.len() || steps == 0 {
        return Vec::new();
    }
    let n = y_true.len() as f64;
    let positives = y_true.iter().filter(|y| **y > 0).count().max(1) as f64;

    (0..steps)
        .map(|i| {
            let threshold = if steps == 1 { 0.0 } else { i as f64 / (steps - 1) as f64 };
            let mut suppressed = 0usize;
            let mut missed = 0usize;
            for (y, p) in y_true.iter().zip(proba) {
                if *p < threshold {
                    suppressed += 1;
                    if *y > 0 {
                        missed += 1;
                    }
                }
            }
            ReductionPoint {
                threshold,
                alert_reduction: suppressed as f64 / n,
                false_negative_rate: missed as f64 / positives,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width histogram of probabilities over [0, 1]; the last bin is closed.
/// Non-finite or out-of-range values are not counted.
pub fn confidence_histogram(proba: &[f64], bins: usize) -> Vec<HistogramBin> {
    if bins == 0 {
        return Vec::new();
    }
    let width = 1.0 / bins as f64;
    let mut counts = vec![0usize; bins];
    for p in proba.iter().filter(|p| (0.0..=1.0).contains(*p)) {
        let i = ((p * bins as f64) as usize).min(bins - 1);
        counts[i] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: i as f64 * width,
            upper: if i + 1 == bins { 1.0 } else { (i + 1) as f64 * width },
            count,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryErrors {
    pub category: String,
    /// False positives plus false negatives at the decision threshold
    pub errors: usize,
}

/// Categories with the most misclassified alerts at `threshold`, most errors first.
/// Ties are broken by category name.
pub fn top_error_categories(
    categories: &[String],
    y_true: &[u8],
    proba: &[f64],
    threshold: f64,
    top_k: usize,
) -> Vec<CategoryErrors> {
    if categories.len() != y_true.len() || y_true.len() != proba.len() {
        return Vec::new();
    }
    let mut errors: HashMap<&str, usize> = HashMap::new();
    for ((c, y), p) in categories.iter().zip(y_true).zip(proba) {
        let predicted = u8::from(*p >= threshold);
        if predicted != u8::from(*y > 0) {
            *errors.entry(c.as_str()).or_insert(0) += 1;
        }
    }
    let mut ranked: Vec<CategoryErrors> = errors
        .into_iter()
        .map(|(category, errors)| CategoryErrors { category: category.to_string(), errors })
        .collect();
    ranked.sort_by(|a, b| b.errors.cmp(&a.errors).then_with(|| a.category.cmp(&b.category)));
    ranked.truncate(top_k);
    ranked
}
