use chrono::{Datelike, Local};
use dayblocks_core::productivity::MonthlyCompletions;
use dayblocks_core::{Config, DayBackend};
use serde_json::json;

use super::{backend, print_json, CliResult};

pub async fn run(config: &Config, year: Option<i32>, month: Option<u32>, json: bool) -> CliResult {
    let today = Local::now().date_naive();
    let year = year.unwrap_or(today.year());
    let month = month.unwrap_or(today.month());

    let records = backend(config)?.monthly_completions().await?;
    let grid = MonthlyCompletions::new(&records, year, month)
        .ok_or_else(|| format!("invalid month: {year}-{month}"))?;

    if json {
        return print_json(&json!({
            "year": grid.year(),
            "month": grid.month(),
            "rows": grid.rows(),
            "fully_completed_days": grid.fully_completed_days(),
            "fully_completed_tasks": grid.fully_completed_tasks(),
        }));
    }

    let width = grid.tasks().iter().map(|t| t.chars().count()).max().unwrap_or(4).max(4);
    let header: String = (1..=grid.days_in_month()).map(|d| format!("{:>3}", d)).collect();
    println!("{:<width$}{header}", "Task");
    for row in grid.rows() {
        let cells: String = row
            .days
            .iter()
            .map(|done| if *done { "  x" } else { "  ." })
            .collect();
        println!("{:<width$}{cells}", row.task);
    }

    let full_days = grid.fully_completed_days();
    if full_days.is_empty() {
        println!("No day with every task done.");
    } else {
        let days: Vec<String> = full_days.iter().map(u32::to_string).collect();
        println!("Every task done on: {}", days.join(", "));
    }
    Ok(())
}
