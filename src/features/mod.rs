//! Feature engineering: static per-record indicators and trailing-window aggregates.

mod pipeline;
mod static_features;
mod temporal;

pub use pipeline::FeatureExtractor;
pub use static_features::{
    KeywordRule, StaticFeatureExtractor, TextField, CATEGORY_RULES, RAW_LOG_RULES, STATIC_COLUMNS,
};
pub use temporal::{
    build_temporal_features, TemporalFeatures, WindowedAggregator, TEMPORAL_COLUMNS,
};

use crate::error::{PipelineError, Result};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use sha2::{Digest, Sha256};

/// Model input: one row per alert in time order, named columns, binary target.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub x: Array2<f64>,
    pub y: Array1<u8>,
    /// Row timestamps when known (absent for matrices read back from disk without them)
    pub timestamps: Vec<DateTime<Utc>>,
    /// Row alert categories, same convention as `timestamps`
    pub categories: Vec<String>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>, x: Array2<f64>, y: Array1<u8>) -> Result<Self> {
        if x.ncols() != columns.len() {
            return Err(PipelineError::Shape(format!(
                "{} columns named, {} in data",
                columns.len(),
                x.ncols()
            )));
        }
        if x.nrows() != y.len() {
            return Err(PipelineError::Shape(format!("{} rows, {} labels", x.nrows(), y.len())));
        }
        Ok(Self {
            columns,
            x,
            y,
            timestamps: Vec::new(),
            categories: Vec::new(),
        })
    }

    pub fn n_rows(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.x.ncols()
    }

    pub fn positives(&self) -> usize {
        self.y.iter().filter(|v| **v > 0).count()
    }

    /// SHA-256 over the values and targets; equal digests mean bit-identical matrices.
    pub fn digest(&self) -> String {
        let mut h = Sha256::new();
        for c in &self.columns {
            h.update(c.as_bytes());
            h.update([0u8]);
        }
        for v in self.x.iter() {
            h.update(v.to_bits().to_le_bytes());
        }
        h.update(self.y.as_slice().unwrap_or(&[]));
        format!("{:x}", h.finalize())
    }
}
