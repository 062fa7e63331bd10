use std::env;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;

use match_panel::analysis::{AnalysisCache, AnalysisOutcome, DEFAULT_ANALYSIS_TTL};
use match_panel::analysis_fetch::EndpointSource;
use match_panel::bucket::{filter_by_bucket, list_buckets};
use match_panel::feed::{data_file_path, load_and_prepare, opt_env};
use match_panel::normalize::MatchRecord;
use match_panel::prepare::PreparationGate;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<()> {
    if args.first().map(String::as_str) == Some("analysis") {
        let match_id = args
            .get(1)
            .context("usage: match_panel analysis <match-id>")?;
        return run_analysis(match_id);
    }
    let filter = args.first().cloned().unwrap_or_default();
    run_panel(&filter)
}

fn run_panel(filter: &str) -> Result<()> {
    let path = data_file_path();
    let now = Utc::now();
    let (upcoming, finished) = load_and_prepare(&path, now);
    println!(
        "feed {} ({} upcoming, {} finished)",
        path.display(),
        upcoming.len(),
        finished.len()
    );
    print_section("upcoming", &upcoming, filter);
    print_section("finished", &finished, filter);
    Ok(())
}

fn print_section(label: &str, records: &[MatchRecord], filter: &str) {
    let buckets = list_buckets(records);
    let (rows, filter_error) = filter_by_bucket(records, filter);
    println!();
    println!("== {label}: {} of {} matches", rows.len(), records.len());
    if !buckets.is_empty() {
        println!("   handicap buckets: {}", buckets.join(", "));
    }
    if let Some(message) = filter_error {
        println!("   {message}");
    }
    for record in rows {
        println!(
            "   {:<12} {} vs {}  AH {}  O/U {}  {}",
            record.display_time.as_deref().unwrap_or("--:--"),
            record.home_team,
            record.away_team,
            record.handicap,
            record.goal_line,
            record.score.as_deref().unwrap_or("--"),
        );
    }
}

fn run_analysis(match_id: &str) -> Result<()> {
    let source = EndpointSource::from_env().context("PANEL_ANALYSIS_BASE_URL is not set")?;
    let ttl = opt_env("PANEL_ANALYSIS_TTL_SECS")
        .and_then(|raw| raw.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_ANALYSIS_TTL);
    let mut cache = AnalysisCache::new(source).with_ttl(ttl);
    if let Some(gate) = PreparationGate::from_env() {
        cache = cache.with_gate(gate);
    }
    match cache.get_analysis(match_id) {
        AnalysisOutcome::Rich { payload } => {
            println!("tier: rich");
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        AnalysisOutcome::Light { payload, warning } => {
            println!("tier: light ({warning})");
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        AnalysisOutcome::Unavailable { error } => {
            println!("no analysis available: {error}");
        }
    }
    Ok(())
}
