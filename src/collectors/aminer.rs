//! AMiner anomaly reports (one JSON object per line).

use super::{parse_unix_seconds, AlertRecord, SourceAttributes};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AminerReport {
    #[serde(rename = "LogData")]
    log_data: LogData,
    #[serde(rename = "AnalysisComponent")]
    component: AnalysisComponent,
    #[serde(rename = "AMiner")]
    aminer: AminerInstance,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LogData {
    #[serde(rename = "DetectionTimestamp")]
    detection_timestamp: Vec<serde_json::Value>,
    #[serde(rename = "RawLogData")]
    raw_log_data: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnalysisComponent {
    #[serde(rename = "AnalysisComponentName")]
    name: Option<String>,
    #[serde(rename = "AnalysisComponentType")]
    component_type: Option<String>,
    #[serde(rename = "TrainingMode")]
    training_mode: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AminerInstance {
    #[serde(rename = "ID")]
    id: Option<String>,
}

pub struct AminerCollector {
    unknown_key: String,
}

impl AminerCollector {
    pub fn new(unknown_key: String) -> Self {
        Self { unknown_key }
    }

    /// Map one report to a record. The detection timestamp is in unix seconds.
    pub fn parse(
        &self,
        value: serde_json::Value,
        scenario: &str,
    ) -> Result<AlertRecord, serde_json::Error> {
        let report: AminerReport = serde_json::from_value(value)?;
        let timestamp = report
            .log_data
            .detection_timestamp
            .first()
            .and_then(parse_unix_seconds);
        let category = report
            .component
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.unknown_key.clone());
        let entity = report
            .aminer
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| self.unknown_key.clone());
        let raw_log = report.log_data.raw_log_data.into_iter().next().unwrap_or_default();
        let new_event = category.to_lowercase().contains("new event");

        Ok(AlertRecord {
            timestamp,
            category,
            entity,
            scenario: scenario.to_string(),
            raw_log,
            attributes: SourceAttributes::Aminer {
                component_type: report.component.component_type,
                training_mode: report.component.training_mode,
                new_event,
            },
            label: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back() {
        let c = AminerCollector::new("UNKNOWN".into());
        let v = serde_json::json!({
            "AnalysisComponent": {"AnalysisComponentName": "AMiner: New event type"}
        });
        let r = c.parse(v, "s").unwrap();
        assert_eq!(r.timestamp, None);
        assert_eq!(r.entity, "UNKNOWN");
        assert_eq!(r.raw_log, "");
        match r.attributes {
            SourceAttributes::Aminer { new_event, training_mode, .. } => {
                assert!(new_event);
                assert!(!training_mode);
            }
            _ => panic!("expected aminer attributes"),
        }
    }
}
