//! End-to-end batch run: ingest → label → features → cross-validated evaluation.
//! Each stage is also callable on its own so the CLI can resume from a table on disk.

use crate::collectors::{
    drop_invalid, sort_by_timestamp, AlertRecord, CollectorPipeline, IngestReport,
};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::eval::{evaluate_matrix, EvaluationReport};
use crate::features::{FeatureExtractor, FeatureMatrix};
use crate::labels::{AttackWindows, LabelSummary, Labeler};
use crate::model::LogisticRegression;
use crate::storage;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ALERTS_FILE: &str = "alerts.csv";
pub const LABELED_FILE: &str = "alerts_labeled.csv";
pub const FEATURES_FILE: &str = "features.csv";
pub const REPORT_FILE: &str = "report.json";

/// What one full run produced, small enough to print as a single JSON line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ingest: IngestReport,
    pub labels: LabelSummary,
    pub rows: usize,
    pub columns: usize,
    pub positives: usize,
    pub matrix_sha256: String,
    pub fold_roc_auc: Vec<Option<f64>>,
    pub mean_roc_auc: Option<f64>,
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// All alert files of `dir`, concatenated and time-sorted.
    pub fn ingest(&self, dir: &Path) -> Result<(Vec<AlertRecord>, IngestReport)> {
        let (records, report) = CollectorPipeline::new(&self.config.ingest).load_dir(dir)?;
        tracing::info!(
            files = report.files_read,
            failed = report.files_failed,
            malformed = report.malformed_lines,
            rows = report.rows,
            "ingestion complete"
        );
        Ok((records, report))
    }

    pub fn label(&self, records: &mut [AlertRecord], windows: AttackWindows) -> LabelSummary {
        let summary = Labeler::new(windows).label_all(records);
        tracing::info!(
            attack = summary.total.attack,
            benign = summary.total.benign,
            "labels assigned"
        );
        summary
    }

    /// Drop rows without a usable timestamp, re-sort, and build the matrix.
    pub fn features(&self, records: Vec<AlertRecord>) -> Result<FeatureMatrix> {
        let (mut records, dropped) = drop_invalid(records);
        if dropped > 0 {
            tracing::warn!(dropped, "rows without timestamp excluded from features");
        }
        sort_by_timestamp(&mut records);
        FeatureExtractor::new(self.config.features.clone()).build(&records)
    }

    pub fn evaluate(&self, matrix: &FeatureMatrix) -> Result<EvaluationReport> {
        let mut model = LogisticRegression::new(&self.config.eval);
        evaluate_matrix(&mut model, matrix, &self.config.eval)
    }

    /// Full run writing every intermediate table plus the report into `out_dir`.
    pub fn run(&self, input_dir: &Path, windows_path: &Path, out_dir: &Path) -> Result<RunSummary> {
        std::fs::create_dir_all(out_dir)?;

        let (mut records, ingest) = self.ingest(input_dir)?;
        storage::write_alerts(&out_dir.join(ALERTS_FILE), &records)?;

        let windows = storage::read_attack_windows(windows_path)?;
        let labels = self.label(&mut records, windows);
        storage::write_alerts(&out_dir.join(LABELED_FILE), &records)?;

        let matrix = self.features(records)?;
        storage::write_feature_matrix(&out_dir.join(FEATURES_FILE), &matrix)?;

        let report = self.evaluate(&matrix)?;
        storage::write_json(&out_dir.join(REPORT_FILE), &report)?;

        Ok(RunSummary {
            ingest,
            labels,
            rows: matrix.n_rows(),
            columns: matrix.n_cols(),
            positives: matrix.positives(),
            matrix_sha256: matrix.digest(),
            fold_roc_auc: report.fold_aucs(),
            mean_roc_auc: report.mean_roc_auc,
        })
    }
}
