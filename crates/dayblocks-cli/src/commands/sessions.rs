use dayblocks_core::productivity::daily_totals;
use dayblocks_core::{duration, Config, DayBackend};

use super::{backend, print_json, CliResult};

pub async fn run(config: &Config, json: bool) -> CliResult {
    let sessions = backend(config)?.sessions().await?;
    let mut malformed = Vec::new();
    let days = daily_totals(&sessions, &mut malformed);

    if json {
        print_json(&days)?;
    } else {
        for day in &days {
            println!("{}  {}", day.date, duration::format_hm(day.total_seconds));
            for slice in &day.sessions {
                println!(
                    "    {}  {}",
                    slice.start_time.format("%H:%M"),
                    duration::format_hms(slice.seconds)
                );
            }
        }
    }
    for text in &malformed {
        eprintln!("warning: unreadable duration {text:?} counted as zero");
    }
    Ok(())
}
