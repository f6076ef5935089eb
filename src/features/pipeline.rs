//! Feature extraction pipeline: labeled records → time order → static + windowed
//! columns → matrix.

use super::{
    build_temporal_features, FeatureMatrix, StaticFeatureExtractor, STATIC_COLUMNS,
    TEMPORAL_COLUMNS,
};
use crate::collectors::AlertRecord;
use crate::config::FeaturesConfig;
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};

pub struct FeatureExtractor {
    config: FeaturesConfig,
    static_features: StaticFeatureExtractor,
}

impl FeatureExtractor {
    pub fn new(config: FeaturesConfig) -> Self {
        Self {
            config,
            static_features: StaticFeatureExtractor::new(),
        }
    }

    /// Static columns followed by temporal columns.
    pub fn columns(&self) -> Vec<String> {
        STATIC_COLUMNS
            .iter()
            .chain(TEMPORAL_COLUMNS.iter())
            .map(|c| c.to_string())
            .collect()
    }

    /// Build the full matrix. Rows come out sorted by timestamp (stable), whatever
    /// the input order, so downstream splits are forward in time.
    pub fn build(&self, records: &[AlertRecord]) -> Result<FeatureMatrix> {
        let temporal = build_temporal_features(records, &self.config)?;

        let mut order: Vec<usize> = (0..records.len()).collect();
        order.sort_by_key(|&i| records[i].timestamp);

        let columns = self.columns();
        let width = columns.len();
        let mut data = Vec::with_capacity(records.len() * width);
        let mut y = Vec::with_capacity(records.len());
        let mut timestamps = Vec::with_capacity(records.len());
        let mut categories = Vec::with_capacity(records.len());

        for &i in &order {
            let r = &records[i];
            data.extend(self.static_features.extract(r));
            data.extend(temporal[i].to_row());
            // Validated by build_temporal_features.
            y.push(r.y().unwrap_or(0));
            if let Some(ts) = r.timestamp {
                timestamps.push(ts);
            }
            categories.push(r.category.clone());
        }

        let x = Array2::from_shape_vec((records.len(), width), data)
            .map_err(|e| PipelineError::Shape(e.to_string()))?;
        let mut matrix = FeatureMatrix::new(columns, x, Array1::from(y))?;
        matrix.timestamps = timestamps;
        matrix.categories = categories;

        tracing::info!(
            rows = matrix.n_rows(),
            cols = matrix.n_cols(),
            positives = matrix.positives(),
            "feature matrix built"
        );
        Ok(matrix)
    }

    pub fn config(&self) -> &FeaturesConfig {
        &self.config
    }
}
