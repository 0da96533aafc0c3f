use chrono::Local;
use dayblocks_core::productivity::todays_sleep;
use dayblocks_core::{duration, Config, DayBackend, SleepQuality};

use super::{backend, CliResult};

pub async fn run(config: &Config) -> CliResult {
    let records = backend(config)?.sleep_records().await?;
    match todays_sleep(&records, Local::now().date_naive()) {
        Some(record) => {
            let seconds = record.duration as f64;
            println!(
                "{} - {}: {} ({})",
                record.start_time.format("%H:%M"),
                record.end_time.format("%H:%M"),
                duration::format_human(seconds),
                SleepQuality::from_seconds(seconds)
            );
        }
        None => println!("No sleep recorded for today."),
    }
    Ok(())
}
