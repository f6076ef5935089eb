//! Per-record indicators with no cross-record state.

use crate::collectors::{AlertRecord, AlertSource, SourceAttributes};
use crate::labels::contains_any;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Category,
    RawLog,
}

/// A named 0/1 column set when the chosen field contains any keyword.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub name: &'static str,
    pub field: TextField,
    pub keywords: &'static [&'static str],
}

pub const CATEGORY_RULES: &[KeywordRule] = &[
    KeywordRule { name: "cat_scan", field: TextField::Category, keywords: &["scan"] },
    KeywordRule {
        name: "cat_auth",
        field: TextField::Category,
        keywords: &["auth", "login", "ssh", "pam"],
    },
    KeywordRule {
        name: "cat_web",
        field: TextField::Category,
        keywords: &["web", "http", "wp", "apache", "nginx"],
    },
];

pub const RAW_LOG_RULES: &[KeywordRule] = &[
    KeywordRule {
        name: "proto_http",
        field: TextField::RawLog,
        keywords: &["http", "get", "post"],
    },
    KeywordRule { name: "proto_ssh", field: TextField::RawLog, keywords: &["ssh"] },
    KeywordRule { name: "is_cron", field: TextField::RawLog, keywords: &["cron"] },
    KeywordRule {
        name: "is_auth_event",
        field: TextField::RawLog,
        keywords: &["auth", "login", "pam"],
    },
    KeywordRule { name: "is_cred_event", field: TextField::RawLog, keywords: &["cred"] },
    KeywordRule { name: "is_uid0", field: TextField::RawLog, keywords: &["uid=0"] },
    KeywordRule { name: "is_success", field: TextField::RawLog, keywords: &["res=success"] },
];

/// Wazuh rules at or below this level count as low-severity.
const WAZUH_LOW_LEVEL: i64 = 3;

/// Column names of [`StaticFeatureExtractor::extract`], in order.
pub const STATIC_COLUMNS: [&str; 17] = [
    "cat_scan",
    "cat_auth",
    "cat_web",
    "source_aminer",
    "source_wazuh",
    "proto_http",
    "proto_ssh",
    "is_cron",
    "is_auth_event",
    "is_cred_event",
    "is_uid0",
    "is_success",
    "aminer_new_event",
    "aminer_training_mode",
    "wazuh_low_level",
    "wazuh_antivirus",
    "wazuh_update",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct StaticFeatureExtractor;

impl StaticFeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &STATIC_COLUMNS
    }

    pub fn extract(&self, record: &AlertRecord) -> Vec<f64> {
        let mut out = Vec::with_capacity(STATIC_COLUMNS.len());
        for rule in CATEGORY_RULES {
            out.push(flag(apply(rule, record)));
        }
        out.push(flag(record.source() == AlertSource::Aminer));
        out.push(flag(record.source() == AlertSource::Wazuh));
        for rule in RAW_LOG_RULES {
            out.push(flag(apply(rule, record)));
        }

        let (new_event, training_mode) = match &record.attributes {
            SourceAttributes::Aminer { new_event, training_mode, .. } => {
                (*new_event, *training_mode)
            }
            SourceAttributes::Wazuh { .. } => (false, false),
        };
        out.push(flag(new_event));
        out.push(flag(training_mode));

        let (low_level, antivirus, update) = match &record.attributes {
            SourceAttributes::Wazuh { level, antivirus, update } => {
                (level.unwrap_or(0) <= WAZUH_LOW_LEVEL, *antivirus, *update)
            }
            SourceAttributes::Aminer { .. } => (false, false, false),
        };
        out.push(flag(low_level));
        out.push(flag(antivirus));
        out.push(flag(update));
        out
    }
}

fn apply(rule: &KeywordRule, record: &AlertRecord) -> bool {
    let text = match rule.field {
        TextField::Category => &record.category,
        TextField::RawLog => &record.raw_log,
    };
    contains_any(text, rule.keywords)
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}
