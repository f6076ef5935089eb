//! Alert collectors: AMiner and Wazuh JSON-lines dumps turned into flat alert records.
//! Every file of an input directory is read, rows are concatenated, invalid
//! timestamps are dropped and the whole set is re-sorted by time.

mod aminer;
mod timestamp;
mod wazuh;

use crate::config::IngestConfig;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader};
use std::path::Path;
use walkdir::WalkDir;

pub use aminer::AminerCollector;
pub use timestamp::{parse_mixed_timestamp, parse_unix_seconds};
pub use wazuh::WazuhCollector;

/// One alert as seen by every downstream stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// `None` marks a timestamp that could not be normalized to UTC.
    pub timestamp: Option<DateTime<Utc>>,
    pub category: String,
    pub entity: String,
    pub scenario: String,
    pub raw_log: String,
    pub attributes: SourceAttributes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<EventLabel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSource {
    Aminer,
    Wazuh,
}

impl AlertSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSource::Aminer => "aminer",
            AlertSource::Wazuh => "wazuh",
        }
    }
}

/// Detector-specific fields; only the static feature extractor reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SourceAttributes {
    Aminer {
        component_type: Option<String>,
        training_mode: bool,
        new_event: bool,
    },
    Wazuh {
        level: Option<i64>,
        antivirus: bool,
        update: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLabel {
    Attack,
    Benign,
}

impl EventLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventLabel::Attack => "attack",
            EventLabel::Benign => "benign",
        }
    }

    /// Binary target: 1 = attack, 0 = benign.
    pub fn y(&self) -> u8 {
        match self {
            EventLabel::Attack => 1,
            EventLabel::Benign => 0,
        }
    }

    pub fn from_y(y: u8) -> Self {
        if y == 0 {
            EventLabel::Benign
        } else {
            EventLabel::Attack
        }
    }
}

impl AlertRecord {
    pub fn new(
        timestamp: DateTime<Utc>,
        category: impl Into<String>,
        entity: impl Into<String>,
        attributes: SourceAttributes,
    ) -> Self {
        Self {
            timestamp: Some(timestamp),
            category: category.into(),
            entity: entity.into(),
            scenario: String::new(),
            raw_log: String::new(),
            attributes,
            label: None,
        }
    }

    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = scenario.into();
        self
    }

    pub fn with_raw_log(mut self, raw_log: impl Into<String>) -> Self {
        self.raw_log = raw_log.into();
        self
    }

    pub fn with_label(mut self, label: EventLabel) -> Self {
        self.label = Some(label);
        self
    }

    pub fn source(&self) -> AlertSource {
        match self.attributes {
            SourceAttributes::Aminer { .. } => AlertSource::Aminer,
            SourceAttributes::Wazuh { .. } => AlertSource::Wazuh,
        }
    }

    /// Binary label, if the labeler has run.
    pub fn y(&self) -> Option<u8> {
        self.label.map(|l| l.y())
    }
}

/// Counters reported by a directory load; none of these conditions abort ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub files_read: usize,
    pub files_failed: usize,
    pub malformed_lines: usize,
    pub unrecognized_lines: usize,
    pub dropped_invalid_timestamp: usize,
    pub rows: usize,
}

/// Orchestrates both source parsers over a directory of alert dumps.
pub struct CollectorPipeline {
    pub aminer: AminerCollector,
    pub wazuh: WazuhCollector,
    config: IngestConfig,
}

impl CollectorPipeline {
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            aminer: AminerCollector::new(config.unknown_key.clone()),
            wazuh: WazuhCollector::new(config.unknown_key.clone()),
            config: config.clone(),
        }
    }

    /// Load every matching file under `dir`, then drop invalid rows and sort by time.
    /// A file that cannot be read is counted and skipped.
    pub fn load_dir(&self, dir: &Path) -> Result<(Vec<AlertRecord>, IngestReport)> {
        if !dir.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("input directory {} not found", dir.display()),
            )
            .into());
        }
        let mut report = IngestReport::default();
        let mut rows = Vec::new();

        for entry in WalkDir::new(dir)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() || !self.matches_extension(path) {
                continue;
            }
            tracing::info!(file = %path.display(), "reading alert file");
            match self.load_file(path, &mut report) {
                Ok(mut file_rows) => {
                    report.files_read += 1;
                    rows.append(&mut file_rows);
                }
                Err(e) => {
                    report.files_failed += 1;
                    tracing::warn!(
                        file = %path.display(),
                        error = %e,
                        "skipping unreadable alert file"
                    );
                }
            }
        }

        let (mut rows, dropped) = drop_invalid(rows);
        sort_by_timestamp(&mut rows);
        report.dropped_invalid_timestamp = dropped;
        report.rows = rows.len();
        if dropped > 0 {
            tracing::warn!(dropped, "dropped alerts with invalid timestamps");
        }
        Ok((rows, report))
    }

    /// Parse one JSON-lines file. Malformed or unrecognized lines are counted, not fatal.
    pub fn load_file(&self, path: &Path, report: &mut IngestReport) -> Result<Vec<AlertRecord>> {
        let scenario = scenario_from_path(path);
        let file = std::fs::File::open(path)?;
        let mut out = Vec::new();
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match self.parse_line(&line, &scenario) {
                Ok(Some(record)) => out.push(record),
                Ok(None) => report.unrecognized_lines += 1,
                Err(e) => {
                    report.malformed_lines += 1;
                    tracing::debug!(
                        file = %path.display(),
                        line = lineno + 1,
                        error = %e,
                        "malformed alert line"
                    );
                }
            }
        }
        Ok(out)
    }

    /// Dispatch a single line to the parser of the detector that wrote it.
    pub fn parse_line(
        &self,
        line: &str,
        scenario: &str,
    ) -> std::result::Result<Option<AlertRecord>, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(line)?;
        if value.get("AnalysisComponent").is_some() {
            self.aminer.parse(value, scenario).map(Some)
        } else if value.get("@timestamp").is_some() {
            self.wazuh.parse(value, scenario).map(Some)
        } else {
            Ok(None)
        }
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(&self.config.extension))
            .unwrap_or(false)
    }
}

/// Scenario name: file stem up to the first underscore.
pub fn scenario_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.split_once('_') {
        Some((head, _)) => head.to_string(),
        None => stem,
    }
}

/// Remove rows whose timestamp could not be normalized.
/// Returns the kept rows and the dropped count.
pub fn drop_invalid(records: Vec<AlertRecord>) -> (Vec<AlertRecord>, usize) {
    let before = records.len();
    let kept: Vec<AlertRecord> = records.into_iter().filter(|r| r.timestamp.is_some()).collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

/// Stable sort by timestamp ascending; rows without a timestamp go last.
pub fn sort_by_timestamp(records: &mut [AlertRecord]) {
    records.sort_by(|a, b| match (a.timestamp, b.timestamp) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const AMINER_LINE: &str = concat!(
        r#"{"LogData":{"DetectionTimestamp":[1642723200.5],"RawLogData":["GET /wp-login.php"]},"#,
        r#""AnalysisComponent":{"AnalysisComponentName":"New value detector","#,
        r#""AnalysisComponentType":"NewMatchPathValueDetector","TrainingMode":true},"#,
        r#""AMiner":{"ID":"aminer-1"}}"#,
    );
    const WAZUH_LINE: &str = concat!(
        r#"{"@timestamp":"2022-01-21T01:00:00.000+0000","#,
        r#""rule":{"description":"sshd: authentication failed","level":5,"#,
        r#""groups":["sshd","authentication_failed"]},"#,
        r#""agent":{"ip":"10.0.0.5"},"full_log":"Failed password for root"}"#,
    );

    fn pipeline() -> CollectorPipeline {
        CollectorPipeline::new(&IngestConfig::default())
    }

    #[test]
    fn scenario_is_prefix_before_underscore() {
        assert_eq!(scenario_from_path(Path::new("/data/fox_aminer.json")), "fox");
        assert_eq!(scenario_from_path(Path::new("harrison.json")), "harrison");
    }

    #[test]
    fn dispatches_by_detector() {
        let p = pipeline();
        let a = p.parse_line(AMINER_LINE, "fox").unwrap().unwrap();
        assert_eq!(a.source(), AlertSource::Aminer);
        assert_eq!(a.category, "New value detector");
        assert_eq!(a.entity, "aminer-1");
        assert_eq!(a.scenario, "fox");

        let w = p.parse_line(WAZUH_LINE, "fox").unwrap().unwrap();
        assert_eq!(w.source(), AlertSource::Wazuh);
        assert_eq!(w.entity, "10.0.0.5");
        assert_eq!(w.timestamp, Some(Utc.with_ymd_and_hms(2022, 1, 21, 1, 0, 0).unwrap()));

        assert!(p.parse_line(r#"{"other":1}"#, "fox").unwrap().is_none());
        assert!(p.parse_line("not json", "fox").is_err());
    }

    #[test]
    fn sort_is_stable_and_puts_missing_last() {
        let t = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        let attrs = SourceAttributes::Wazuh { level: None, antivirus: false, update: false };
        let mut missing = AlertRecord::new(t, "c", "x", attrs.clone());
        missing.timestamp = None;
        let mut rows = vec![
            missing,
            AlertRecord::new(t, "first", "e", attrs.clone()),
            AlertRecord::new(t - chrono::Duration::hours(1), "early", "e", attrs.clone()),
            AlertRecord::new(t, "second", "e", attrs),
        ];
        sort_by_timestamp(&mut rows);
        let cats: Vec<&str> = rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(cats, vec!["early", "first", "second", "c"]);

        let (kept, dropped) = drop_invalid(rows);
        assert_eq!(kept.len(), 3);
        assert_eq!(dropped, 1);
    }
}
