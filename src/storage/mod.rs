//! On-disk tabular artifacts produced and consumed by the pipeline stages.

mod tabular;

pub use tabular::{
    read_alerts, read_attack_windows, read_feature_matrix, write_alerts, write_feature_matrix,
    write_json,
};
