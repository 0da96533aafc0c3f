use chrono::Local;
use dayblocks_core::productivity::{inputs_for_day, ProductivityScorer, ProductivitySnapshot};
use dayblocks_core::{duration, Config, DayBackend};
use serde_json::json;

use super::{backend, print_json, CliResult};

pub async fn run(config: &Config, local: bool, json: bool) -> CliResult {
    let backend = backend(config)?;
    let snapshot = if local {
        let (sessions, sleep) = tokio::try_join!(backend.sessions(), backend.sleep_records())?;
        let mut malformed = Vec::new();
        let inputs = inputs_for_day(
            &sessions,
            &sleep,
            Local::now().date_naive(),
            config.scoring.default_sleep_hours,
            &mut malformed,
        );
        let mut snapshot = ProductivityScorer::new(config.scoring.penalty).score(inputs);
        snapshot.malformed = malformed;
        snapshot
    } else {
        ProductivitySnapshot::from_report(&backend.productivity().await?)
    };

    if json {
        return print_json(&json!({
            "total_productive_time": duration::format_hms(snapshot.total_productive_seconds),
            "total_awake_time": duration::format_hms(snapshot.total_awake_seconds),
            "sleep_duration": duration::format_hms(snapshot.sleep_seconds),
            "sleep_quality": snapshot.sleep_quality.label(),
            "base_productivity": snapshot.display_base(),
            "sleep_penalty": snapshot.display_penalty(),
            "productivity_percentage": snapshot.display_percentage(),
            "malformed": snapshot.malformed,
        }));
    }

    println!(
        "Productive: {} of {} awake",
        duration::format_hm(snapshot.total_productive_seconds),
        duration::format_hm(snapshot.total_awake_seconds)
    );
    println!(
        "Sleep:      {} ({})",
        duration::format_human(snapshot.sleep_seconds),
        snapshot.sleep_quality
    );
    println!("Base:       {:.1}%", snapshot.display_base());
    println!("Penalty:    -{:.1}%", snapshot.display_penalty());
    println!("Score:      {:.1}%", snapshot.display_percentage());
    for text in &snapshot.malformed {
        eprintln!("warning: unreadable duration {text:?} counted as zero");
    }
    Ok(())
}
