//! CSV tables: parsed alerts, labeled alerts, attack windows and the feature matrix.
//! Timestamps are written as RFC 3339; a cell that does not parse reads back as `None`.

use crate::collectors::{
    parse_mixed_timestamp, parse_unix_seconds, AlertRecord, AlertSource, EventLabel,
    SourceAttributes,
};
use crate::error::{PipelineError, Result};
use crate::features::FeatureMatrix;
use crate::labels::{AttackWindow, AttackWindows};
use chrono::{DateTime, SecondsFormat, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct AlertRow {
    timestamp: Option<String>,
    category: String,
    entity: String,
    scenario: String,
    source: AlertSource,
    raw_log: String,
    aminer_component_type: Option<String>,
    aminer_training_mode: u8,
    aminer_new_event: u8,
    wazuh_level: Option<i64>,
    wazuh_antivirus: u8,
    wazuh_update: u8,
    event_label: Option<EventLabel>,
    y: Option<u8>,
}

impl From<&AlertRecord> for AlertRow {
    fn from(r: &AlertRecord) -> Self {
        let mut row = AlertRow {
            timestamp: r.timestamp.map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            category: r.category.clone(),
            entity: r.entity.clone(),
            scenario: r.scenario.clone(),
            source: r.source(),
            raw_log: r.raw_log.clone(),
            aminer_component_type: None,
            aminer_training_mode: 0,
            aminer_new_event: 0,
            wazuh_level: None,
            wazuh_antivirus: 0,
            wazuh_update: 0,
            event_label: r.label,
            y: r.y(),
        };
        match &r.attributes {
            SourceAttributes::Aminer { component_type, training_mode, new_event } => {
                row.aminer_component_type = component_type.clone();
                row.aminer_training_mode = *training_mode as u8;
                row.aminer_new_event = *new_event as u8;
            }
            SourceAttributes::Wazuh { level, antivirus, update } => {
                row.wazuh_level = *level;
                row.wazuh_antivirus = *antivirus as u8;
                row.wazuh_update = *update as u8;
            }
        }
        row
    }
}

impl From<AlertRow> for AlertRecord {
    fn from(row: AlertRow) -> Self {
        let attributes = match row.source {
            AlertSource::Aminer => SourceAttributes::Aminer {
                component_type: row.aminer_component_type,
                training_mode: row.aminer_training_mode > 0,
                new_event: row.aminer_new_event > 0,
            },
            AlertSource::Wazuh => SourceAttributes::Wazuh {
                level: row.wazuh_level,
                antivirus: row.wazuh_antivirus > 0,
                update: row.wazuh_update > 0,
            },
        };
        // The label column wins; a bare `y` is accepted for hand-made tables.
        let label = row.event_label.or(row.y.map(EventLabel::from_y));
        AlertRecord {
            timestamp: row.timestamp.as_deref().and_then(parse_mixed_timestamp),
            category: row.category,
            entity: row.entity,
            scenario: row.scenario,
            raw_log: row.raw_log,
            attributes,
            label,
        }
    }
}

pub fn write_alerts(path: &Path, records: &[AlertRecord]) -> Result<()> {
    let mut w = csv::Writer::from_path(path)?;
    for r in records {
        w.serialize(AlertRow::from(r))?;
    }
    w.flush()?;
    tracing::info!(path = %path.display(), rows = records.len(), "alerts written");
    Ok(())
}

/// Read an alerts table. Rows whose timestamp does not parse are kept with `None`.
pub fn read_alerts(path: &Path) -> Result<Vec<AlertRecord>> {
    let mut r = csv::Reader::from_path(path)?;
    let mut out = Vec::new();
    for row in r.deserialize::<AlertRow>() {
        out.push(AlertRecord::from(row?));
    }
    Ok(out)
}

#[derive(Debug, Deserialize)]
struct WindowRow {
    scenario: String,
    start: f64,
    end: f64,
    attack: String,
}

fn unix_to_utc(secs: f64) -> Option<DateTime<Utc>> {
    parse_unix_seconds(&serde_json::Value::from(secs))
}

/// Attack windows from `scenario,start,end,attack` with unix-second bounds.
pub fn read_attack_windows(path: &Path) -> Result<AttackWindows> {
    let mut r = csv::Reader::from_path(path)?;
    let mut windows = AttackWindows::new();
    for (i, row) in r.deserialize::<WindowRow>().enumerate() {
        let row = row?;
        let (Some(start), Some(end)) = (unix_to_utc(row.start), unix_to_utc(row.end)) else {
            tracing::warn!(row = i + 1, "attack window with invalid bounds skipped");
            continue;
        };
        windows.insert(row.scenario, AttackWindow { start, end, attack: row.attack });
    }
    tracing::info!(path = %path.display(), windows = windows.len(), "attack windows loaded");
    Ok(windows)
}

const TIMESTAMP_COLUMN: &str = "timestamp";
const CATEGORY_COLUMN: &str = "category";

/// Matrix as CSV: optional leading `timestamp` and `category`, the feature
/// columns, trailing `y`.
pub fn write_feature_matrix(path: &Path, matrix: &FeatureMatrix) -> Result<()> {
    let with_ts = matrix.timestamps.len() == matrix.n_rows();
    let with_cat = matrix.categories.len() == matrix.n_rows();
    let mut w = csv::Writer::from_path(path)?;

    let mut header: Vec<String> = Vec::with_capacity(matrix.n_cols() + 3);
    if with_ts {
        header.push(TIMESTAMP_COLUMN.to_string());
    }
    if with_cat {
        header.push(CATEGORY_COLUMN.to_string());
    }
    header.extend(matrix.columns.iter().cloned());
    header.push("y".to_string());
    w.write_record(&header)?;

    for (i, row) in matrix.x.outer_iter().enumerate() {
        let mut record: Vec<String> = Vec::with_capacity(header.len());
        if with_ts {
            record.push(matrix.timestamps[i].to_rfc3339_opts(SecondsFormat::AutoSi, true));
        }
        if with_cat {
            record.push(matrix.categories[i].clone());
        }
        record.extend(row.iter().map(|v| v.to_string()));
        record.push(matrix.y[i].to_string());
        w.write_record(&record)?;
    }
    w.flush()?;
    tracing::info!(
        path = %path.display(),
        rows = matrix.n_rows(),
        cols = matrix.n_cols(),
        "feature matrix written"
    );
    Ok(())
}

pub fn read_feature_matrix(path: &Path) -> Result<FeatureMatrix> {
    let mut r = csv::Reader::from_path(path)?;
    let header: Vec<String> = r.headers()?.iter().map(String::from).collect();
    if header.last().map(|h| h != "y").unwrap_or(true) {
        return Err(PipelineError::Shape("feature table must end with a `y` column".into()));
    }
    let ts_col = header.iter().position(|h| h == TIMESTAMP_COLUMN).filter(|&i| i == 0);
    let first = usize::from(ts_col.is_some());
    let cat_col = header
        .iter()
        .position(|h| h == CATEGORY_COLUMN)
        .filter(|&i| i == first);
    let first = first + usize::from(cat_col.is_some());
    let columns: Vec<String> = header[first..header.len() - 1].to_vec();

    let mut data = Vec::new();
    let mut y = Vec::new();
    let mut timestamps = Vec::new();
    let mut categories = Vec::new();
    for (i, rec) in r.records().enumerate() {
        let rec = rec?;
        if rec.len() != header.len() {
            return Err(PipelineError::Shape(format!(
                "row {} has {} cells, expected {}",
                i + 1,
                rec.len(),
                header.len()
            )));
        }
        if let Some(ts) = ts_col.and_then(|c| parse_mixed_timestamp(&rec[c])) {
            timestamps.push(ts);
        }
        if let Some(c) = cat_col {
            categories.push(rec[c].to_string());
        }
        for cell in rec.iter().skip(first).take(columns.len()) {
            let v: f64 = cell.trim().parse().map_err(|_| {
                PipelineError::Shape(format!("row {}: `{}` is not a number", i + 1, cell))
            })?;
            data.push(v);
        }
        let target: u8 = rec[header.len() - 1]
            .trim()
            .parse()
            .map_err(|_| PipelineError::Shape(format!("row {}: invalid target", i + 1)))?;
        y.push(target);
    }

    let x = Array2::from_shape_vec((y.len(), columns.len()), data)
        .map_err(|e| PipelineError::Shape(e.to_string()))?;
    let mut matrix = FeatureMatrix::new(columns, x, Array1::from(y))?;
    if timestamps.len() == matrix.n_rows() {
        matrix.timestamps = timestamps;
    }
    if categories.len() == matrix.n_rows() {
        matrix.categories = categories;
    }
    Ok(matrix)
}

/// Pretty JSON document (reports, summaries).
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let data = serde_json::to_string_pretty(value)?;
    std::fs::write(path, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn labeled_alerts_survive_a_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.csv");
        let t = Utc.with_ymd_and_hms(2022, 1, 21, 10, 0, 0).unwrap();
        let rows = vec![
            AlertRecord::new(
                t,
                "sshd, auth",
                "10.0.0.1",
                SourceAttributes::Wazuh { level: Some(5), antivirus: false, update: true },
            )
                .with_scenario("fox")
                .with_raw_log("line with \"quotes\"\nand newline")
                .with_label(EventLabel::Attack),
            AlertRecord::new(
                t,
                "New event type",
                "aminer",
                SourceAttributes::Aminer {
                    component_type: Some("X".into()),
                    training_mode: true,
                    new_event: true,
                },
            )
            .with_scenario("fox"),
        ];
        write_alerts(&path, &rows).unwrap();
        let back = read_alerts(&path).unwrap();
        assert_eq!(back, rows);
    }

    #[test]
    fn attack_windows_from_unix_seconds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.csv");
        std::fs::write(
            &path,
            "scenario,start,end,attack\n\
             fox,1642723200,1642726800,network_scans\n\
             fox,1642720000.5,1642721000,dirb\n",
        )
        .unwrap();
        let w = read_attack_windows(&path).unwrap();
        assert_eq!(w.len(), 2);
        let fox = w.for_scenario("fox");
        assert_eq!(fox[0].attack, "dirb");
        assert_eq!(fox[1].start, Utc.timestamp_opt(1642723200, 0).unwrap());
    }

    #[test]
    fn feature_matrix_round_trip_keeps_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.csv");
        let x = ndarray::array![[0.1, 2.0], [1.0 / 3.0, 999.0]];
        let mut m =
            FeatureMatrix::new(vec!["a".into(), "b".into()], x, ndarray::array![0, 1]).unwrap();
        let t = Utc.with_ymd_and_hms(2022, 1, 21, 10, 0, 0).unwrap();
        m.timestamps = vec![t, t];
        m.categories = vec!["sshd, auth".into(), "New event".into()];
        write_feature_matrix(&path, &m).unwrap();
        let back = read_feature_matrix(&path).unwrap();
        assert_eq!(back.columns, m.columns);
        assert_eq!(back.digest(), m.digest());
        assert_eq!(back.timestamps, m.timestamps);
        assert_eq!(back.categories, m.categories);
        assert_eq!(back, m);
    }
}
