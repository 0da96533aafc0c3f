//! Integration tests for the single-writer sequence runner.

mod common;

use std::time::Duration;

use common::{clock, engine, FakeBackend};
use dayblocks_core::{
    BlockState, CompletionReason, Event, SequenceError, SequenceRunner, Ticker,
};
use tokio::sync::broadcast;

async fn next_matching(
    rx: &mut broadcast::Receiver<Event>,
    pred: impl Fn(&Event) -> bool,
) -> Event {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = rx.recv().await.expect("event stream open");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("event arrives")
}

#[tokio::test]
async fn ticks_drive_a_block_to_completion() {
    let backend = FakeBackend::new();
    let (engine, confirmations) = engine(&backend, &clock(), &[3, 5]);
    let ticker = Ticker::new();
    let (handle, task) = SequenceRunner::spawn(engine, confirmations, &ticker);
    let mut events = handle.subscribe();

    let started = handle.start_block().await.unwrap();
    assert!(matches!(started, Event::BlockStarted { block_index: 0, .. }));
    next_matching(&mut events, |e| matches!(e, Event::SessionConfirmed { .. })).await;

    for _ in 0..3 {
        ticker.fire();
    }
    let completed = next_matching(&mut events, |e| matches!(e, Event::BlockCompleted { .. })).await;
    assert!(matches!(
        completed,
        Event::BlockCompleted {
            block_index: 0,
            reason: CompletionReason::BudgetExhausted,
            next_block: 1,
            ..
        }
    ));

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.current_block, 1);
    assert_eq!(snapshot.blocks[0].state, BlockState::Completed);

    handle.shutdown().await.unwrap();
    let engine = task.await.unwrap();
    assert_eq!(engine.sequence().completed(), &[true, false]);
}

#[tokio::test]
async fn commands_complete_the_current_block_by_default() {
    let backend = FakeBackend::new();
    let (engine, confirmations) = engine(&backend, &clock(), &[10, 10]);
    let ticker = Ticker::new();
    let (handle, _task) = SequenceRunner::spawn(engine, confirmations, &ticker);

    handle.start_block().await.unwrap();
    let events = handle.complete_block(None).await.unwrap();
    assert!(matches!(
        events.first(),
        Some(Event::BlockCompleted {
            block_index: 0,
            reason: CompletionReason::Explicit,
            ..
        })
    ));
    assert_eq!(
        handle.complete_block(Some(5)).await.unwrap_err(),
        SequenceError::OutOfBounds { index: 5, len: 2 }
    );
    assert_eq!(handle.retry_unsynced().await.unwrap(), 0);
}

#[tokio::test]
async fn end_session_returns_block_to_pending() {
    let backend = FakeBackend::new();
    let (engine, confirmations) = engine(&backend, &clock(), &[10]);
    let ticker = Ticker::new();
    let (handle, _task) = SequenceRunner::spawn(engine, confirmations, &ticker);

    handle.start_block().await.unwrap();
    handle.end_session().await.unwrap();
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.blocks[0].state, BlockState::Pending);
    assert!(snapshot.active_session.is_none());
}

#[tokio::test]
async fn handle_reports_stopped_after_shutdown() {
    let backend = FakeBackend::new();
    let (engine, confirmations) = engine(&backend, &clock(), &[10]);
    let ticker = Ticker::new();
    let (handle, task) = SequenceRunner::spawn(engine, confirmations, &ticker);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
    assert_eq!(handle.snapshot().await.unwrap_err(), SequenceError::Stopped);
}

#[tokio::test]
async fn completing_the_current_block_of_a_finished_day_fails() {
    let backend = FakeBackend::new();
    let (engine, confirmations) = engine(&backend, &clock(), &[10]);
    let ticker = Ticker::new();
    let (handle, _task) = SequenceRunner::spawn(engine, confirmations, &ticker);

    handle.complete_block(None).await.unwrap();
    assert_eq!(
        handle.complete_block(None).await.unwrap_err(),
        SequenceError::SequenceFinished
    );
    assert!(handle.complete_block(Some(0)).await.unwrap().is_empty());
}
