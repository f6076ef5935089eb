//! Trailing-window aggregates per alert category and per entity.
//!
//! Records are consumed in timestamp order. For each one the window is first
//! evicted down to `[t - window, t]`, the features are read from the remaining
//! counters, and only then is the record itself added. A record therefore never
//! sees itself or anything after it.

use crate::collectors::AlertRecord;
use crate::config::{FeaturesConfig, RecencyScope};
use crate::error::{PipelineError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Column names of [`TemporalFeatures::to_row`], in order.
pub const TEMPORAL_COLUMNS: [&str; 6] = [
    "cat_count_1d",
    "cat_rate_1d",
    "ent_count_1d",
    "ent_rate_1d",
    "days_since_cat_seen",
    "days_since_ent_seen",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemporalFeatures {
    /// Prior in-window records with the same category
    pub cat_count_1d: u64,
    /// Attack fraction among those; 0.0 when there are none
    pub cat_rate_1d: f64,
    pub ent_count_1d: u64,
    pub ent_rate_1d: f64,
    /// Whole days since the category was last seen, or the sentinel
    pub days_since_cat_seen: i64,
    pub days_since_ent_seen: i64,
}

impl TemporalFeatures {
    pub fn to_row(&self) -> [f64; 6] {
        [
            self.cat_count_1d as f64,
            self.cat_rate_1d,
            self.ent_count_1d as f64,
            self.ent_rate_1d,
            self.days_since_cat_seen as f64,
            self.days_since_ent_seen as f64,
        ]
    }
}

#[derive(Debug, Clone)]
struct WindowEntry {
    ts: DateTime<Utc>,
    category: String,
    entity: String,
    y: u8,
}

/// Per-key totals and positives over the window, plus last sighting per key.
#[derive(Debug, Default)]
struct KeyCounters {
    total: HashMap<String, u64>,
    positive: HashMap<String, u64>,
    last_seen: HashMap<String, DateTime<Utc>>,
}

impl KeyCounters {
    fn add(&mut self, key: &str, y: u8, ts: DateTime<Utc>) {
        *self.total.entry(key.to_string()).or_insert(0) += 1;
        if y > 0 {
            *self.positive.entry(key.to_string()).or_insert(0) += 1;
        }
        self.last_seen.insert(key.to_string(), ts);
    }

    fn remove(&mut self, key: &str, y: u8) {
        if let Some(n) = self.total.get_mut(key) {
            *n -= 1;
            if *n == 0 {
                self.total.remove(key);
            }
        }
        if y > 0 {
            if let Some(n) = self.positive.get_mut(key) {
                *n -= 1;
                if *n == 0 {
                    self.positive.remove(key);
                }
            }
        }
    }

    fn count(&self, key: &str) -> u64 {
        self.total.get(key).copied().unwrap_or(0)
    }

    fn rate(&self, key: &str) -> f64 {
        let total = self.count(key);
        if total == 0 {
            return 0.0;
        }
        self.positive.get(key).copied().unwrap_or(0) as f64 / total as f64
    }

    fn days_since(&self, key: &str, now: DateTime<Utc>, scope: RecencyScope, sentinel: i64) -> i64 {
        if scope == RecencyScope::Window && self.count(key) == 0 {
            return sentinel;
        }
        match self.last_seen.get(key) {
            Some(prev) => (now - *prev).num_days(),
            None => sentinel,
        }
    }

    fn clear(&mut self) {
        self.total.clear();
        self.positive.clear();
        self.last_seen.clear();
    }
}

/// Single-run sliding window state. Owned by one caller; `reset` starts over.
#[derive(Debug)]
pub struct WindowedAggregator {
    window: Duration,
    sentinel: i64,
    scope: RecencyScope,
    entries: VecDeque<WindowEntry>,
    category: KeyCounters,
    entity: KeyCounters,
    last_ts: Option<DateTime<Utc>>,
    observed: usize,
}

impl WindowedAggregator {
    /// Fails on a non-positive or unrepresentable `window_secs`.
    pub fn new(config: &FeaturesConfig) -> Result<Self> {
        Ok(Self {
            window: config.window()?,
            sentinel: config.recency_sentinel,
            scope: config.recency_scope,
            entries: VecDeque::new(),
            category: KeyCounters::default(),
            entity: KeyCounters::default(),
            last_ts: None,
            observed: 0,
        })
    }

    /// Default settings with a different window length.
    pub fn with_window(window: Duration) -> Result<Self> {
        if window <= Duration::zero() {
            return Err(PipelineError::Config(format!(
                "window must be positive, got {}s",
                window.num_seconds()
            )));
        }
        let mut agg = Self::new(&FeaturesConfig::default())?;
        agg.window = window;
        Ok(agg)
    }

    /// Features for one record as of its own timestamp, then absorb it.
    /// Fails if `ts` is earlier than the previously observed timestamp.
    pub fn observe(
        &mut self,
        ts: DateTime<Utc>,
        category: &str,
        entity: &str,
        y: u8,
    ) -> Result<TemporalFeatures> {
        if let Some(last) = self.last_ts {
            if ts < last {
                return Err(PipelineError::UnsortedInput { index: self.observed });
            }
        }

        let cutoff = ts.checked_sub_signed(self.window).ok_or_else(|| {
            PipelineError::InvalidRecord {
                index: self.observed,
                reason: format!("timestamp {ts} has no window start"),
            }
        })?;
        self.evict(cutoff);

        let features = TemporalFeatures {
            cat_count_1d: self.category.count(category),
            cat_rate_1d: self.category.rate(category),
            ent_count_1d: self.entity.count(entity),
            ent_rate_1d: self.entity.rate(entity),
            days_since_cat_seen: self.category.days_since(category, ts, self.scope, self.sentinel),
            days_since_ent_seen: self.entity.days_since(entity, ts, self.scope, self.sentinel),
        };

        self.entries.push_back(WindowEntry {
            ts,
            category: category.to_string(),
            entity: entity.to_string(),
            y,
        });
        self.category.add(category, y, ts);
        self.entity.add(entity, y, ts);
        self.last_ts = Some(ts);
        self.observed += 1;

        Ok(features)
    }

    fn evict(&mut self, cutoff: DateTime<Utc>) {
        while self.entries.front().map_or(false, |e| e.ts < cutoff) {
            if let Some(old) = self.entries.pop_front() {
                self.category.remove(&old.category, old.y);
                self.entity.remove(&old.entity, old.y);
            }
        }
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.category.clear();
        self.entity.clear();
        self.last_ts = None;
        self.observed = 0;
    }

    /// Entries currently inside the window.
    pub fn window_len(&self) -> usize {
        self.entries.len()
    }
}

/// Temporal features for a batch. Records are validated, stable-sorted by
/// timestamp and streamed through one aggregator; the result is aligned with
/// the input order.
pub fn build_temporal_features(
    records: &[AlertRecord],
    config: &FeaturesConfig,
) -> Result<Vec<TemporalFeatures>> {
    let mut keyed = Vec::with_capacity(records.len());
    for (index, r) in records.iter().enumerate() {
        let ts = r.timestamp.ok_or_else(|| PipelineError::InvalidRecord {
            index,
            reason: "missing timestamp".to_string(),
        })?;
        let y = r.y().ok_or_else(|| PipelineError::InvalidRecord {
            index,
            reason: "missing label".to_string(),
        })?;
        keyed.push((ts, index, y));
    }
    keyed.sort_by_key(|(ts, _, _)| *ts);

    let mut agg = WindowedAggregator::new(config)?;
    let mut out: Vec<Option<TemporalFeatures>> = vec![None; records.len()];
    for (ts, index, y) in keyed {
        let r = &records[index];
        let features = agg.observe(ts, &r.category, &r.entity, y).map_err(|e| match e {
            // Report the caller's position, not the sorted one.
            PipelineError::InvalidRecord { reason, .. } => {
                PipelineError::InvalidRecord { index, reason }
            }
            other => other,
        })?;
        out[index] = Some(features);
    }
    tracing::debug!(
        rows = records.len(),
        window_left = agg.window_len(),
        "temporal features built"
    );

    Ok(out.into_iter().flatten().collect())
}
