use dayblocks_core::{duration, Config, DayBackend};
use serde::Serialize;

use super::{backend, print_json, CliResult};

#[derive(Serialize)]
struct BlockLine<'a> {
    index: usize,
    project: &'a str,
    budget: String,
    completed: bool,
    current: bool,
}

pub async fn run(config: &Config, json: bool) -> CliResult {
    let sequence = backend(config)?
        .today_sequence()
        .await?
        .into_sequence(config.sequence.block_budget_seconds)?;
    let current = sequence.current_block_index();

    let lines: Vec<BlockLine<'_>> = sequence
        .blocks()
        .iter()
        .enumerate()
        .map(|(index, block)| BlockLine {
            index,
            project: &block.project_name,
            budget: duration::format_hm(block.budget_seconds as f64),
            completed: sequence.is_completed(index),
            current: index == current,
        })
        .collect();

    if json {
        return print_json(&lines);
    }

    println!(
        "Sequence {} ({}/{} done)",
        sequence.sequence_id(),
        sequence.completed_count(),
        sequence.len()
    );
    for line in &lines {
        let mark = if line.completed {
            "x"
        } else if line.current {
            ">"
        } else {
            " "
        };
        println!("[{mark}] {:>2}. {:<24} {}", line.index, line.project, line.budget);
    }
    if sequence.is_finished() {
        println!("All blocks done.");
    }
    Ok(())
}
