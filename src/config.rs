//! Pipeline configuration. Every section has defaults; a missing or broken file is not fatal.

use crate::error::{PipelineError, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Source log ingestion
    pub ingest: IngestConfig,
    /// Temporal feature parameters
    pub features: FeaturesConfig,
    /// Classifier and cross-validation
    pub eval: EvalConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// File extension of alert dumps inside the input directory
    pub extension: String,
    /// Placeholder for a missing category or entity
    pub unknown_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Trailing window length in seconds (default: one day)
    pub window_secs: i64,
    /// Value of `days_since_*` for a key that has not been seen
    pub recency_sentinel: i64,
    pub recency_scope: RecencyScope,
}

/// How far back `days_since_*` looks for the previous sighting of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecencyScope {
    /// Any earlier record of the run.
    #[default]
    Run,
    /// Only records still inside the trailing window.
    Window,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Number of forward-chaining folds
    pub n_splits: usize,
    /// Gradient descent iterations for the logistic regression
    pub max_iter: usize,
    pub learning_rate: f64,
    /// Inverse L2 regularization strength
    pub c: f64,
    /// Stop once the largest gradient component falls below this
    pub tolerance: f64,
    /// Reweight classes inversely to their frequency
    pub balanced: bool,
    /// Number of thresholds for the alert-reduction curve
    pub reduction_steps: usize,
    /// Bins of the pooled confidence histogram
    pub histogram_bins: usize,
    /// Probability at or above which an alert is predicted as an attack
    pub decision_threshold: f64,
    /// How many categories the error breakdown keeps
    pub top_error_categories: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            extension: "json".to_string(),
            unknown_key: "UNKNOWN".to_string(),
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            window_secs: 24 * 60 * 60,
            recency_sentinel: 999,
            recency_scope: RecencyScope::Run,
        }
    }
}

impl FeaturesConfig {
    /// The trailing window as a duration; it must be positive and fit in a `Duration`.
    pub fn window(&self) -> Result<Duration> {
        if self.window_secs <= 0 {
            return Err(PipelineError::Config(format!(
                "features.window_secs must be positive, got {}",
                self.window_secs
            )));
        }
        Duration::try_seconds(self.window_secs).ok_or_else(|| {
            PipelineError::Config(format!(
                "features.window_secs {} is out of range",
                self.window_secs
            ))
        })
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            n_splits: 3,
            max_iter: 500,
            learning_rate: 0.5,
            c: 1.0,
            tolerance: 1e-6,
            balanced: true,
            reduction_steps: 50,
            histogram_bins: 50,
            decision_threshold: 0.5,
            top_error_categories: 10,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl PipelineConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str::<PipelineConfig>(&data) {
                Ok(c) => c.validated(),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "invalid config; using defaults"
                    );
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "unreadable config; using defaults"
                );
                Self::default()
            }
        }
    }

    /// Replace sections with unusable values by their defaults.
    fn validated(mut self) -> Self {
        if let Err(e) = self.features.window() {
            tracing::warn!(error = %e, "using default features section");
            self.features = FeaturesConfig::default();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let c: PipelineConfig =
            serde_json::from_str(r#"{"features":{"window_secs":3600,"recency_scope":"window"}}"#)
                .unwrap();
        assert_eq!(c.features.window_secs, 3600);
        assert_eq!(c.features.recency_sentinel, 999);
        assert_eq!(c.features.recency_scope, RecencyScope::Window);
        assert_eq!(c.eval.n_splits, 3);
    }

    #[test]
    fn unusable_window_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        for window_secs in ["-3600", "0", "9223372036854775807"] {
            let path = dir.path().join("config.json");
            let body = format!(
                r#"{{"features":{{"window_secs":{window_secs},"recency_sentinel":7}}}}"#
            );
            std::fs::write(&path, body).unwrap();
            let c = PipelineConfig::load(&path);
            assert_eq!(c.features.window_secs, 86_400, "{window_secs}");
            assert_eq!(c.features.recency_sentinel, 999);
            assert!(c.features.window().is_ok());
        }
    }
}
