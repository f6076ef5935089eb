//! aact-features: labeled, temporally-aware feature matrices from AMiner and Wazuh alerts.
//!
//! Modular structure:
//! - [`collectors`]: Alert record model and JSON-lines ingestion for both detectors
//! - [`labels`]: Ground-truth labeling from attack windows and keyword tables
//! - [`features`]: Static indicators and trailing-window temporal aggregates
//! - [`model`]: Classifier trait and logistic regression
//! - [`eval`]: Forward-chaining cross-validation, ROC and alert-reduction curves
//! - [`storage`]: CSV/JSON artifacts
//! - [`pipeline`]: Stage orchestration
//! - [`logging`]: Structured logging

pub mod collectors;
pub mod config;
pub mod error;
pub mod eval;
pub mod features;
pub mod labels;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod storage;

pub use collectors::{AlertRecord, CollectorPipeline, EventLabel, SourceAttributes};
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use eval::EvaluationReport;
pub use features::{FeatureExtractor, FeatureMatrix, TemporalFeatures, WindowedAggregator};
pub use labels::Labeler;
pub use logging::StructuredLogger;
pub use model::{Classifier, LogisticRegression};
pub use pipeline::{Pipeline, RunSummary};
