//! Wazuh alerts (one JSON object per line, `@timestamp` in mixed ISO formats).

use super::{parse_mixed_timestamp, AlertRecord, SourceAttributes};
use serde::Deserialize;

const ANTIVIRUS_GROUPS: [&str; 3] = ["clamd", "freshclam", "virus"];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WazuhAlert {
    #[serde(rename = "@timestamp")]
    timestamp: Option<String>,
    rule: Rule,
    agent: Agent,
    predecoder: Predecoder,
    full_log: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Rule {
    description: Option<String>,
    level: Option<i64>,
    groups: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Agent {
    ip: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Predecoder {
    hostname: Option<String>,
}

pub struct WazuhCollector {
    unknown_key: String,
}

impl WazuhCollector {
    pub fn new(unknown_key: String) -> Self {
        Self { unknown_key }
    }

    /// Map one alert to a record. Entity is the agent IP, else the predecoded hostname.
    pub fn parse(
        &self,
        value: serde_json::Value,
        scenario: &str,
    ) -> Result<AlertRecord, serde_json::Error> {
        let alert: WazuhAlert = serde_json::from_value(value)?;
        let timestamp = alert.timestamp.as_deref().and_then(parse_mixed_timestamp);
        let category = alert
            .rule
            .description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| self.unknown_key.clone());
        let entity = alert
            .agent
            .ip
            .filter(|ip| !ip.is_empty())
            .or(alert.predecoder.hostname.filter(|h| !h.is_empty()))
            .unwrap_or_else(|| self.unknown_key.clone());
        let antivirus = alert
            .rule
            .groups
            .iter()
            .any(|g| ANTIVIRUS_GROUPS.contains(&g.as_str()));
        let update = category.to_lowercase().contains("update");

        Ok(AlertRecord {
            timestamp,
            category,
            entity,
            scenario: scenario.to_string(),
            raw_log: alert.full_log,
            attributes: SourceAttributes::Wazuh {
                level: alert.rule.level,
                antivirus,
                update,
            },
            label: None,
        })
    }
}
