//! Interactive driver for today's sequence.
//!
//! Reads one command per line from stdin and prints every engine event as a
//! JSON line on stdout.

use std::time::Duration;

use dayblocks_core::sequence::SequenceHandle;
use dayblocks_core::{Config, DayBackend, SequenceEngine, SequenceRunner, SessionTracker, Ticker};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use super::{backend, CliResult};

const HELP: &str = "commands: start [project] | complete [index] | end | status | retry | quit";

#[derive(Debug, PartialEq)]
enum Input {
    StartBlock,
    StartSession(String),
    Complete(Option<usize>),
    End,
    Status,
    Retry,
    Help,
    Quit,
}

fn parse_input(line: &str) -> Result<Option<Input>, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();
    let input = match (command, arg) {
        ("start", None) => Input::StartBlock,
        ("start", Some(project)) => Input::StartSession(project.to_string()),
        ("complete" | "done", None) => Input::Complete(None),
        ("complete" | "done", Some(index)) => Input::Complete(Some(
            index
                .parse()
                .map_err(|_| format!("not a block index: {index}"))?,
        )),
        ("end" | "stop", None) => Input::End,
        ("status", None) => Input::Status,
        ("retry", None) => Input::Retry,
        ("help", _) => Input::Help,
        ("quit" | "exit", None) => Input::Quit,
        _ => return Err(format!("unknown command: {}", line.trim())),
    };
    Ok(Some(input))
}

async fn dispatch(handle: &SequenceHandle, input: Input) -> CliResult {
    match input {
        Input::StartBlock => {
            handle.start_block().await?;
        }
        Input::StartSession(project) => {
            handle.start_session(project).await?;
        }
        Input::Complete(index) => {
            handle.complete_block(index).await?;
        }
        Input::End => {
            handle.end_session().await?;
        }
        Input::Status => {
            handle.snapshot().await?;
        }
        Input::Retry => {
            let count = handle.retry_unsynced().await?;
            eprintln!("re-sent {count} block completion(s)");
        }
        Input::Help => eprintln!("{HELP}"),
        Input::Quit => {}
    }
    Ok(())
}

pub async fn run(config: &Config) -> CliResult {
    let backend = backend(config)?;
    let sequence = backend
        .today_sequence()
        .await?
        .into_sequence(config.sequence.block_budget_seconds)?;
    info!(sequence_id = %sequence.sequence_id(), blocks = sequence.len(), "loaded today's sequence");

    let tracker = SessionTracker::new(backend.clone());
    let (engine, confirmations) = SequenceEngine::new(sequence, tracker, backend);
    let ticker = Ticker::new();
    let (handle, runner) = SequenceRunner::spawn(engine, confirmations, &ticker);
    let tick_task = ticker.start(Duration::from_millis(config.sequence.tick_interval_ms));

    let mut events = handle.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!(%e, "could not encode event"),
                },
                Err(RecvError::Lagged(missed)) => warn!(missed, "event output fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    handle.snapshot().await?;
    eprintln!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            Ok(None) => {}
            Ok(Some(Input::Quit)) => break,
            Ok(Some(input)) => {
                if let Err(e) = dispatch(&handle, input).await {
                    eprintln!("error: {e}");
                }
            }
            Err(e) => eprintln!("error: {e}"),
        }
    }

    tick_task.abort();
    handle.shutdown().await?;
    let engine = runner.await?;
    drop(handle);
    printer.await?;

    let unsynced = engine.unsynced_blocks();
    if !unsynced.is_empty() {
        warn!(?unsynced, "exiting with block completions the server has not recorded");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_input("start"), Ok(Some(Input::StartBlock)));
        assert_eq!(
            parse_input("start side-project"),
            Ok(Some(Input::StartSession("side-project".into())))
        );
        assert_eq!(parse_input("complete"), Ok(Some(Input::Complete(None))));
        assert_eq!(parse_input("  complete 2 "), Ok(Some(Input::Complete(Some(2)))));
        assert_eq!(parse_input("end"), Ok(Some(Input::End)));
        assert_eq!(parse_input("quit"), Ok(Some(Input::Quit)));
        assert_eq!(parse_input("   "), Ok(None));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_input("complete two").is_err());
        assert!(parse_input("fly").is_err());
        assert!(parse_input("end now").is_err());
    }
}
