//! Property-based tests for the trailing-window aggregates.
//!
//! Generated alert streams are checked against a brute-force recount, and
//! the no-look-ahead guarantee is checked by truncating the stream.

use aact_features::{
    collectors::{AlertRecord, EventLabel, SourceAttributes},
    config::{FeaturesConfig, RecencyScope},
    features::{build_temporal_features, FeatureExtractor, TemporalFeatures},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

const DAY: i64 = 86_400;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 1, 15, 0, 0, 0).unwrap()
}

// (seconds after base, category index, entity index, attack?)
fn stream_strategy() -> impl Strategy<Value = Vec<(i64, u8, u8, bool)>> {
    prop::collection::vec((0..5 * DAY, 0u8..4, 0u8..3, any::<bool>()), 1..60).prop_map(|mut v| {
        v.sort_by_key(|(t, _, _, _)| *t);
        v
    })
}

fn to_records(stream: &[(i64, u8, u8, bool)]) -> Vec<AlertRecord> {
    stream
        .iter()
        .map(|(t, c, e, attack)| {
            let label = if *attack { EventLabel::Attack } else { EventLabel::Benign };
            AlertRecord::new(
                base() + Duration::seconds(*t),
                format!("category-{c}"),
                format!("10.0.0.{e}"),
                SourceAttributes::Wazuh { level: Some(5), antivirus: false, update: false },
            )
            .with_label(label)
        })
        .collect()
}

fn brute_force(records: &[AlertRecord], i: usize, window: Duration) -> (u64, u64, u64, u64) {
    let t = records[i].timestamp.unwrap();
    let prior = records[..i].iter().filter(|r| r.timestamp.unwrap() >= t - window);
    let (mut cat, mut cat_pos, mut ent, mut ent_pos) = (0, 0, 0, 0);
    for r in prior {
        let pos = u64::from(r.y().unwrap());
        if r.category == records[i].category {
            cat += 1;
            cat_pos += pos;
        }
        if r.entity == records[i].entity {
            ent += 1;
            ent_pos += pos;
        }
    }
    (cat, cat_pos, ent, ent_pos)
}

fn rate(pos: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        pos as f64 / total as f64
    }
}

proptest! {
    #[test]
    fn counts_and_rates_match_a_recount(stream in stream_strategy()) {
        let records = to_records(&stream);
        let config = FeaturesConfig::default();
        let feats = build_temporal_features(&records, &config).unwrap();
        let window = Duration::seconds(config.window_secs);

        for (i, f) in feats.iter().enumerate() {
            let (cat, cat_pos, ent, ent_pos) = brute_force(&records, i, window);
            prop_assert_eq!(f.cat_count_1d, cat);
            prop_assert_eq!(f.ent_count_1d, ent);
            prop_assert!((f.cat_rate_1d - rate(cat_pos, cat)).abs() < 1e-12);
            prop_assert!((f.ent_rate_1d - rate(ent_pos, ent)).abs() < 1e-12);
            prop_assert!((0.0..=1.0).contains(&f.cat_rate_1d));
            prop_assert!((0.0..=1.0).contains(&f.ent_rate_1d));
        }
    }

    #[test]
    fn later_records_never_change_earlier_features(stream in stream_strategy(), cut in 0usize..60) {
        let records = to_records(&stream);
        let cut = cut.min(records.len());
        let config = FeaturesConfig::default();
        let full = build_temporal_features(&records, &config).unwrap();
        let prefix = build_temporal_features(&records[..cut], &config).unwrap();
        prop_assert_eq!(&full[..cut], &prefix[..]);
    }

    #[test]
    fn sentinel_only_for_first_sighting(stream in stream_strategy()) {
        let records = to_records(&stream);
        let config = FeaturesConfig {
            recency_scope: RecencyScope::Run,
            ..FeaturesConfig::default()
        };
        let feats = build_temporal_features(&records, &config).unwrap();

        for (i, f) in feats.iter().enumerate() {
            let cat_seen = records[..i].iter().any(|r| r.category == records[i].category);
            let ent_seen = records[..i].iter().any(|r| r.entity == records[i].entity);
            prop_assert_eq!(f.days_since_cat_seen == config.recency_sentinel, !cat_seen);
            prop_assert_eq!(f.days_since_ent_seen == config.recency_sentinel, !ent_seen);
            if cat_seen {
                prop_assert!(f.days_since_cat_seen >= 0 && f.days_since_cat_seen < 5);
            }
        }
    }

    #[test]
    fn window_scope_forgets_evicted_keys(stream in stream_strategy()) {
        let records = to_records(&stream);
        let config = FeaturesConfig {
            recency_scope: RecencyScope::Window,
            ..FeaturesConfig::default()
        };
        let feats = build_temporal_features(&records, &config).unwrap();

        for f in &feats {
            prop_assert_eq!(f.days_since_cat_seen == config.recency_sentinel, f.cat_count_1d == 0);
            prop_assert_eq!(f.days_since_ent_seen == config.recency_sentinel, f.ent_count_1d == 0);
        }
    }

    #[test]
    fn shuffled_input_gives_the_same_features_per_record(stream in stream_strategy()) {
        let records = to_records(&stream);
        let config = FeaturesConfig::default();
        let sorted = build_temporal_features(&records, &config).unwrap();

        // Distinct timestamps keep the stable order unambiguous after reversal.
        let distinct = records.windows(2).all(|w| w[0].timestamp != w[1].timestamp);
        prop_assume!(distinct);
        let reversed: Vec<AlertRecord> = records.iter().rev().cloned().collect();
        let mut back: Vec<TemporalFeatures> = build_temporal_features(&reversed, &config).unwrap();
        back.reverse();
        prop_assert_eq!(sorted, back);
    }

    #[test]
    fn matrix_build_is_idempotent(stream in stream_strategy()) {
        let records = to_records(&stream);
        let extractor = FeatureExtractor::new(FeaturesConfig::default());
        let a = extractor.build(&records).unwrap();
        let b = extractor.build(&records).unwrap();
        prop_assert_eq!(a.digest(), b.digest());
        prop_assert_eq!(a.n_rows(), records.len());
    }
}
