use std::collections::HashSet;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use log::debug;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMode {
    Upcoming,
    Finished,
}

#[derive(Debug, Clone)]
pub struct MatchRecord {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub handicap: String,
    pub goal_line: String,
    pub score: Option<String>,
    pub display_time: Option<String>,
    pub resolved_time: Option<DateTime<Utc>>,
    // Attributes the feed carries that the pipeline does not interpret
    // (league, venue, round, ...). Kept verbatim for downstream consumers.
    pub extra: Map<String, Value>,
}

const TYPED_KEYS: [&str; 7] = [
    "id",
    "home_team",
    "away_team",
    "handicap",
    "goal_line",
    "score",
    "time",
];

const FULL_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
];

// Year-implied short forms; the year is filled in at parse time.
const SHORT_FORMATS: [&str; 2] = ["%Y %d/%m %H:%M", "%Y %d-%m %H:%M"];

pub fn parse_feed_datetime(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    for fmt in FULL_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.and_utc());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    for fmt in SHORT_FORMATS {
        let with_year = format!("{} {}", now.year(), text);
        if let Ok(dt) = NaiveDateTime::parse_from_str(&with_year, fmt) {
            return Some(dt.and_utc());
        }
    }
    None
}

pub fn normalize_and_partition(
    raw: &[Value],
    mode: FeedMode,
    now: DateTime<Utc>,
) -> Vec<MatchRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut prepared: Vec<MatchRecord> = Vec::new();

    for item in raw {
        let Some(fields) = item.as_object() else {
            debug!("dropping non-object feed entry");
            continue;
        };
        let id = field_text(fields, "id")
            .map(|text| text.trim().to_string())
            .unwrap_or_default();
        if id.is_empty() || !seen.insert(id.clone()) {
            continue;
        }

        let resolved_time = resolve_time(fields, now);
        let display_time = field_text(fields, "time")
            .filter(|text| !text.is_empty())
            .or_else(|| resolved_time.map(|dt| synthesize_display_time(dt, mode)));

        let mut extra = fields.clone();
        for key in TYPED_KEYS {
            extra.remove(key);
        }

        prepared.push(MatchRecord {
            id,
            home_team: field_text(fields, "home_team").unwrap_or_default(),
            away_team: field_text(fields, "away_team").unwrap_or_default(),
            handicap: field_text(fields, "handicap").unwrap_or_else(|| "N/A".to_string()),
            goal_line: field_text(fields, "goal_line").unwrap_or_else(|| "N/A".to_string()),
            score: field_text(fields, "score"),
            display_time,
            resolved_time,
            extra,
        });
    }

    match mode {
        FeedMode::Upcoming => {
            prepared.retain(|record| record.resolved_time.is_none_or(|dt| dt >= now));
            prepared.sort_by_key(|record| {
                (
                    record.resolved_time.is_none(),
                    record.resolved_time.unwrap_or(DateTime::<Utc>::MAX_UTC),
                )
            });
        }
        FeedMode::Finished => {
            // Descending over the composite key, which also flips the
            // missing-time flag: records without a resolvable time land at
            // the front of the finished list. Matches the feed's long-
            // standing observable ordering; see DESIGN.md before changing.
            prepared.sort_by(|a, b| {
                let key = |record: &MatchRecord| {
                    (
                        record.resolved_time.is_none(),
                        record.resolved_time.unwrap_or(DateTime::<Utc>::MIN_UTC),
                    )
                };
                key(b).cmp(&key(a))
            });
        }
    }

    prepared
}

fn resolve_time(fields: &Map<String, Value>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let candidate = field_text(fields, "time_obj")
        .filter(|text| !text.trim().is_empty())
        .or_else(|| field_text(fields, "match_datetime").filter(|text| !text.trim().is_empty()))
        .or_else(|| {
            let date = field_text(fields, "match_date").filter(|text| !text.trim().is_empty())?;
            let time = field_text(fields, "match_time").filter(|text| !text.trim().is_empty())?;
            Some(format!("{date} {time}"))
        })?;
    parse_feed_datetime(&candidate, now)
}

fn synthesize_display_time(dt: DateTime<Utc>, mode: FeedMode) -> String {
    match mode {
        FeedMode::Upcoming => dt.format("%H:%M").to_string(),
        FeedMode::Finished => dt.format("%d/%m %H:%M").to_string(),
    }
}

fn field_text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(num) => Some(num.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
