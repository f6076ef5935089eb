//! Ground-truth labeling: scenario-scoped attack windows plus keyword relevance.
//!
//! Precedence is fixed: an always-benign keyword wins over everything, then
//! an attack window of the record's scenario whose attack type's keywords
//! match the text, and otherwise the record is benign.

pub mod keywords;

use crate::collectors::{AlertRecord, EventLabel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub use keywords::{contains_any, relevance_keywords, ALWAYS_BENIGN, ATTACK_RELEVANCE};

/// A labeled interval (inclusive on both ends) during which one attack was running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub attack: String,
}

impl AttackWindow {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }
}

/// Attack windows keyed by scenario, each list ordered by start time.
#[derive(Debug, Clone, Default)]
pub struct AttackWindows {
    by_scenario: HashMap<String, Vec<AttackWindow>>,
}

impl AttackWindows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, scenario: impl Into<String>, window: AttackWindow) {
        let list = self.by_scenario.entry(scenario.into()).or_default();
        let pos = list.partition_point(|w| w.start <= window.start);
        list.insert(pos, window);
    }

    pub fn for_scenario(&self, scenario: &str) -> &[AttackWindow] {
        self.by_scenario.get(scenario).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn scenarios(&self) -> impl Iterator<Item = &str> {
        self.by_scenario.keys().map(String::as_str)
    }

    /// Total number of windows across scenarios.
    pub fn len(&self) -> usize {
        self.by_scenario.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Label one record against the attack windows of its scenario.
pub fn label(record: &AlertRecord, windows: &AttackWindows) -> EventLabel {
    let combined = format!("{} {}", record.category, record.raw_log).to_lowercase();

    if contains_any(&combined, ALWAYS_BENIGN) {
        return EventLabel::Benign;
    }

    let Some(ts) = record.timestamp else {
        return EventLabel::Benign;
    };

    let relevant = windows
        .for_scenario(&record.scenario)
        .iter()
        .filter(|w| w.contains(ts))
        .any(|w| contains_any(&combined, relevance_keywords(&w.attack)));

    if relevant {
        EventLabel::Attack
    } else {
        EventLabel::Benign
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCounts {
    pub attack: usize,
    pub benign: usize,
}

impl LabelCounts {
    fn add(&mut self, label: EventLabel) {
        match label {
            EventLabel::Attack => self.attack += 1,
            EventLabel::Benign => self.benign += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSummary {
    pub total: LabelCounts,
    pub by_scenario: BTreeMap<String, LabelCounts>,
    /// Scenarios that have attack windows but no alerts, sorted
    pub unmatched_scenarios: Vec<String>,
}

pub struct Labeler {
    windows: AttackWindows,
}

impl Labeler {
    pub fn new(windows: AttackWindows) -> Self {
        Self { windows }
    }

    pub fn label(&self, record: &AlertRecord) -> EventLabel {
        label(record, &self.windows)
    }

    /// Attach labels in place and tally them per scenario.
    pub fn label_all(&self, records: &mut [AlertRecord]) -> LabelSummary {
        let mut summary = LabelSummary::default();
        for record in records.iter_mut() {
            let l = self.label(record);
            record.label = Some(l);
            summary.total.add(l);
            summary.by_scenario.entry(record.scenario.clone()).or_default().add(l);
        }
        for (scenario, counts) in &summary.by_scenario {
            tracing::info!(
                scenario = %scenario,
                attack = counts.attack,
                benign = counts.benign,
                "labeled scenario"
            );
        }
        for scenario in self.windows.scenarios() {
            if !summary.by_scenario.contains_key(scenario) {
                tracing::warn!(
                    scenario = %scenario,
                    "attack windows for a scenario with no alerts"
                );
                summary.unmatched_scenarios.push(scenario.to_string());
            }
        }
        summary.unmatched_scenarios.sort();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::SourceAttributes;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 1, 21, 12, 0, 0).unwrap()
    }

    fn windows() -> AttackWindows {
        let mut w = AttackWindows::new();
        w.insert(
            "fox",
            AttackWindow {
                start: t0(),
                end: t0() + Duration::hours(1),
                attack: "network_scans".into(),
            },
        );
        w.insert(
            "fox",
            AttackWindow {
                start: t0() + Duration::hours(3),
                end: t0() + Duration::hours(4),
                attack: "cracking".into(),
            },
        );
        w
    }

    fn record(offset_min: i64, category: &str, raw: &str) -> AlertRecord {
        AlertRecord::new(
            t0() + Duration::minutes(offset_min),
            category,
            "host",
            SourceAttributes::Wazuh { level: Some(5), antivirus: false, update: false },
        )
        .with_scenario("fox")
        .with_raw_log(raw)
    }

    #[test]
    fn relevant_alert_inside_window_is_attack() {
        let l = Labeler::new(windows());
        assert_eq!(l.label(&record(30, "Nmap scan", "")), EventLabel::Attack);
        assert_eq!(l.label(&record(200, "sshd", "Failed password")), EventLabel::Attack);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let l = Labeler::new(windows());
        assert_eq!(l.label(&record(0, "port scan", "")), EventLabel::Attack);
        assert_eq!(l.label(&record(60, "port scan", "")), EventLabel::Attack);
        assert_eq!(l.label(&record(61, "port scan", "")), EventLabel::Benign);
    }

    #[test]
    fn irrelevant_text_inside_window_is_benign() {
        let l = Labeler::new(windows());
        assert_eq!(l.label(&record(30, "disk usage", "df")), EventLabel::Benign);
    }

    #[test]
    fn always_benign_overrides_window() {
        let l = Labeler::new(windows());
        assert_eq!(l.label(&record(30, "nmap scan", "CRON job")), EventLabel::Benign);
    }

    #[test]
    fn other_scenario_and_missing_timestamp_are_benign() {
        let l = Labeler::new(windows());
        let other = record(30, "nmap scan", "").with_scenario("harrison");
        assert_eq!(l.label(&other), EventLabel::Benign);
        let mut no_ts = record(30, "nmap scan", "");
        no_ts.timestamp = None;
        assert_eq!(l.label(&no_ts), EventLabel::Benign);
    }

    #[test]
    fn label_all_tallies() {
        let mut w = windows();
        w.insert(
            "harrison",
            AttackWindow { start: t0(), end: t0(), attack: "dirb".into() },
        );
        let l = Labeler::new(w);
        let mut rows = vec![
            record(30, "nmap scan", ""),
            record(30, "df", ""),
            record(500, "nmap", ""),
        ];
        let s = l.label_all(&mut rows);
        assert_eq!(s.total, LabelCounts { attack: 1, benign: 2 });
        assert_eq!(s.by_scenario["fox"].attack, 1);
        assert_eq!(s.unmatched_scenarios, vec!["harrison".to_string()]);
        assert!(rows.iter().all(|r| r.label.is_some()));
    }
}
