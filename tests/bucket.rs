use serde_json::Map;

use match_panel::bucket::{filter_by_bucket, list_buckets, normalize_half_bucket};
use match_panel::normalize::MatchRecord;

fn record(id: &str, handicap: &str) -> MatchRecord {
    MatchRecord {
        id: id.to_string(),
        home_team: String::new(),
        away_team: String::new(),
        handicap: handicap.to_string(),
        goal_line: "N/A".to_string(),
        score: None,
        display_time: None,
        resolved_time: None,
        extra: Map::new(),
    }
}

#[test]
fn buckets_snap_to_half_increments() {
    assert_eq!(normalize_half_bucket("0").as_deref(), Some("0"));
    assert_eq!(normalize_half_bucket("+0.25").as_deref(), Some("0.5"));
    assert_eq!(normalize_half_bucket("-0.25").as_deref(), Some("-0.5"));
    assert_eq!(normalize_half_bucket("-0.75").as_deref(), Some("-1"));
    assert_eq!(normalize_half_bucket("1.5").as_deref(), Some("1.5"));
    assert_eq!(normalize_half_bucket(" 2 ").as_deref(), Some("2"));
}

#[test]
fn split_lines_average_before_bucketing() {
    assert_eq!(normalize_half_bucket("0/0.5").as_deref(), Some("0.5"));
    assert_eq!(normalize_half_bucket("1/1.5").as_deref(), Some("1.5"));
    assert_eq!(normalize_half_bucket("-0.5/-1").as_deref(), Some("-1"));
}

#[test]
fn unparseable_handicaps_are_none() {
    for raw in ["", "   ", "abc", "N/A", "0/x", "nan"] {
        assert_eq!(normalize_half_bucket(raw), None, "{raw}");
    }
}

#[test]
fn bucketing_is_deterministic() {
    for raw in ["0.25", "-1.75", "0/0.5"] {
        assert_eq!(normalize_half_bucket(raw), normalize_half_bucket(raw));
    }
}

#[test]
fn list_buckets_sorts_numerically_not_lexically() {
    let records = vec![
        record("a", "2"),
        record("b", "10"),
        record("c", "-0.5"),
        record("d", "0.5"),
        record("e", "junk"),
    ];
    assert_eq!(list_buckets(&records), ["-0.5", "0.5", "2", "10"]);
}

#[test]
fn list_buckets_dedupes_equivalent_lines() {
    let records = vec![record("a", "0.25"), record("b", "0/0.5"), record("c", "0.5")];
    assert_eq!(list_buckets(&records), ["0.5"]);
}

#[test]
fn empty_needle_returns_everything_unchanged() {
    let records = vec![record("a", "0.25"), record("b", "junk")];
    for needle in ["", "   "] {
        let (rows, error) = filter_by_bucket(&records, needle);
        assert_eq!(rows.len(), records.len());
        assert!(error.is_none());
    }
}

#[test]
fn unknown_needle_reports_error_and_leaves_data_alone() {
    let records = vec![record("a", "0.25"), record("b", "-0.5")];
    let (rows, error) = filter_by_bucket(&records, "abc");
    assert_eq!(rows.len(), records.len());
    let message = error.expect("an error message");
    assert!(message.contains("abc"));
}

#[test]
fn filtering_by_own_handicap_always_includes_record() {
    let records = vec![record("a", "0.25"), record("b", "2")];
    let (rows, error) = filter_by_bucket(&records, "0.25");
    assert!(error.is_none());
    assert!(rows.iter().any(|r| r.id == "a"));

    // The canonical bucket itself matches too.
    let bucket = normalize_half_bucket("0.25").expect("bucket");
    let (rows, _) = filter_by_bucket(&records, &bucket);
    assert!(rows.iter().any(|r| r.id == "a"));
}

#[test]
fn filtering_preserves_input_order() {
    let records = vec![
        record("a", "0.5"),
        record("b", "1"),
        record("c", "0.25"),
        record("d", "0.75"),
    ];
    let (rows, _) = filter_by_bucket(&records, "0.5");
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["a", "c"]);
}
