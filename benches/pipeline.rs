use chrono::{DateTime, TimeZone, Utc};
use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};
use std::hint::black_box;

use match_panel::bucket::{filter_by_bucket, list_buckets};
use match_panel::normalize::{FeedMode, normalize_and_partition};

const FEED_LEN: usize = 2_000;
const HANDICAPS: [&str; 5] = ["0", "0.25", "-0.5", "0/0.5", "n/a"];

fn bench_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap()
}

fn synthetic_feed() -> Vec<Value> {
    (0..FEED_LEN)
        .map(|idx| {
            let day = 1 + idx % 28;
            let hour = idx % 24;
            let minute = idx % 60;
            json!({
                "id": format!("m-{idx}"),
                "home_team": format!("Home {idx}"),
                "away_team": format!("Away {idx}"),
                "handicap": HANDICAPS[idx % HANDICAPS.len()],
                "goal_line": "2.5",
                "match_date": format!("2099-03-{day:02}"),
                "match_time": format!("{hour:02}:{minute:02}"),
            })
        })
        .collect()
}

fn bench_normalize_upcoming(c: &mut Criterion) {
    let feed = synthetic_feed();
    let now = bench_now();
    c.bench_function("normalize_upcoming", |b| {
        b.iter(|| {
            let records = normalize_and_partition(black_box(&feed), FeedMode::Upcoming, now);
            black_box(records.len());
        })
    });
}

fn bench_normalize_finished(c: &mut Criterion) {
    let feed = synthetic_feed();
    let now = bench_now();
    c.bench_function("normalize_finished", |b| {
        b.iter(|| {
            let records = normalize_and_partition(black_box(&feed), FeedMode::Finished, now);
            black_box(records.len());
        })
    });
}

fn bench_bucket_filter(c: &mut Criterion) {
    let feed = synthetic_feed();
    let records = normalize_and_partition(&feed, FeedMode::Finished, bench_now());
    c.bench_function("bucket_filter", |b| {
        b.iter(|| {
            let (rows, _) = filter_by_bucket(black_box(&records), "0.25");
            black_box(rows.len());
        })
    });
}

fn bench_list_buckets(c: &mut Criterion) {
    let feed = synthetic_feed();
    let records = normalize_and_partition(&feed, FeedMode::Finished, bench_now());
    c.bench_function("list_buckets", |b| {
        b.iter(|| {
            let buckets = list_buckets(black_box(&records));
            black_box(buckets.len());
        })
    });
}

criterion_group!(
    pipeline,
    bench_normalize_upcoming,
    bench_normalize_finished,
    bench_bucket_filter,
    bench_list_buckets
);
criterion_main!(pipeline);
