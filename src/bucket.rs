use std::cmp::Ordering;

use crate::normalize::MatchRecord;

// Canonical half-increment bucket for a free-form handicap string.
// Split ("quarter") lines like "0/0.5" average their two sides first.
pub fn normalize_half_bucket(raw: &str) -> Option<String> {
    let value = parse_handicap_value(raw)?;
    let bucket = (value * 2.0).round() / 2.0;
    Some(format_bucket(bucket))
}

pub fn list_buckets(records: &[MatchRecord]) -> Vec<String> {
    let mut buckets: Vec<(f64, String)> = Vec::new();
    for record in records {
        let Some(bucket) = normalize_half_bucket(&record.handicap) else {
            continue;
        };
        if buckets.iter().any(|(_, existing)| *existing == bucket) {
            continue;
        }
        let value = bucket.parse::<f64>().unwrap_or(0.0);
        buckets.push((value, bucket));
    }
    buckets.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    buckets.into_iter().map(|(_, bucket)| bucket).collect()
}

pub fn filter_by_bucket(
    records: &[MatchRecord],
    needle: &str,
) -> (Vec<MatchRecord>, Option<String>) {
    let trimmed = needle.trim();
    if trimmed.is_empty() {
        return (records.to_vec(), None);
    }
    let Some(wanted) = normalize_half_bucket(trimmed) else {
        let message = format!("Unrecognised handicap value '{trimmed}'");
        return (records.to_vec(), Some(message));
    };
    let filtered = records
        .iter()
        .filter(|record| normalize_half_bucket(&record.handicap).as_deref() == Some(wanted.as_str()))
        .cloned()
        .collect();
    (filtered, None)
}

fn parse_handicap_value(raw: &str) -> Option<f64> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    if let Some((left, right)) = text.split_once('/') {
        let left = parse_simple(left)?;
        let right = parse_simple(right)?;
        return Some((left + right) / 2.0);
    }
    parse_simple(text)
}

fn parse_simple(part: &str) -> Option<f64> {
    let cleaned = part.trim().trim_start_matches('+');
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn format_bucket(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value:.1}")
    }
}
