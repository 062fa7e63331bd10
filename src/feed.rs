use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::debug;
use serde::Deserialize;
use serde_json::Value;

use crate::normalize::{FeedMode, MatchRecord, normalize_and_partition};

const DATA_FILE_CANDIDATES: [&str; 2] = ["data/data.json", "data.json"];

#[derive(Debug, Default, Deserialize)]
pub struct RawFeed {
    #[serde(default, rename = "upcoming_matches")]
    pub upcoming: Vec<Value>,
    #[serde(default, rename = "finished_matches")]
    pub finished: Vec<Value>,
}

pub fn data_file_path() -> PathBuf {
    if let Some(path) = opt_env("PANEL_DATA_FILE") {
        return PathBuf::from(path);
    }
    for candidate in DATA_FILE_CANDIDATES {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return path;
        }
    }
    PathBuf::from(DATA_FILE_CANDIDATES[1])
}

// The scraper owns the document format; anything unreadable or
// wrong-shaped degrades to an empty feed rather than an error.
pub fn load_feed(path: &Path) -> RawFeed {
    let Ok(raw) = fs::read_to_string(path) else {
        debug!("feed file {} not readable, using empty feed", path.display());
        return RawFeed::default();
    };
    match serde_json::from_str::<RawFeed>(&raw) {
        Ok(feed) => feed,
        Err(err) => {
            debug!(
                "feed file {} is not a valid feed document ({err}), using empty feed",
                path.display()
            );
            RawFeed::default()
        }
    }
}

pub fn load_and_prepare(path: &Path, now: DateTime<Utc>) -> (Vec<MatchRecord>, Vec<MatchRecord>) {
    let feed = load_feed(path);
    (
        normalize_and_partition(&feed.upcoming, FeedMode::Upcoming, now),
        normalize_and_partition(&feed.finished, FeedMode::Finished, now),
    )
}

pub fn opt_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|val| {
        let trimmed = val.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
