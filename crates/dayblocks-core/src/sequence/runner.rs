//! Actor that owns a [`SequenceEngine`] and serializes everything it does.
//!
//! Ticks, confirmations and commands are all applied on one task, so the
//! engine never sees two transitions at once. Callers talk to it through a
//! cloneable [`SequenceHandle`].

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::engine::{ConfirmationReceiver, SequenceEngine};
use super::view::SequenceSnapshot;
use crate::error::SequenceError;
use crate::events::Event;
use crate::ticker::{Tick, Ticker};

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 256;

type Reply<T> = oneshot::Sender<Result<T, SequenceError>>;

/// Requests a [`SequenceHandle`] sends to the runner.
#[derive(Debug)]
pub enum Command {
    StartBlock { reply: Reply<Event> },
    StartSession { project_id: String, reply: Reply<Event> },
    /// `None` completes the current block.
    CompleteBlock { index: Option<usize>, reply: Reply<Vec<Event>> },
    EndSession { reply: Reply<Vec<Event>> },
    RetryUnsynced { reply: Reply<usize> },
    Snapshot { reply: Reply<SequenceSnapshot> },
    Shutdown,
}

pub struct SequenceRunner {
    engine: SequenceEngine,
    confirmations: ConfirmationReceiver,
    ticks: broadcast::Receiver<Tick>,
    commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<Event>,
}

impl SequenceRunner {
    /// Move `engine` onto its own task, driven by `ticker`.
    ///
    /// The join handle yields the engine back once the runner shuts down.
    pub fn spawn(
        engine: SequenceEngine,
        confirmations: ConfirmationReceiver,
        ticker: &Ticker,
    ) -> (SequenceHandle, JoinHandle<SequenceEngine>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let runner = Self {
            engine,
            confirmations,
            ticks: ticker.subscribe(),
            commands: cmd_rx,
            events: events.clone(),
        };
        let handle = SequenceHandle {
            tx: cmd_tx,
            events,
        };
        (handle, tokio::spawn(runner.run()))
    }

    async fn run(self) -> SequenceEngine {
        let Self {
            mut engine,
            mut confirmations,
            mut ticks,
            mut commands,
            events,
        } = self;
        info!(sequence_id = %engine.sequence().sequence_id(), "sequence runner started");
        let mut ticks_open = true;
        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => handle(&mut engine, &events, cmd),
                },
                Some(confirmation) = confirmations.recv() => {
                    publish(&events, engine.apply_confirmation(confirmation));
                }
                tick = ticks.recv(), if ticks_open => match tick {
                    Ok(_) => publish(&events, engine.tick()),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        debug!(missed, "replaying lagged ticks");
                        for _ in 0..missed {
                            publish(&events, engine.tick());
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        warn!("ticker closed, countdown paused");
                        ticks_open = false;
                    }
                },
            }
        }
        info!("sequence runner stopped");
        engine
    }
}

fn handle(engine: &mut SequenceEngine, events: &broadcast::Sender<Event>, cmd: Command) {
    match cmd {
        Command::StartBlock { reply } => {
            let result = engine.start_current_block();
            if let Ok(event) = &result {
                publish(events, vec![event.clone()]);
            }
            let _ = reply.send(result);
        }
        Command::StartSession { project_id, reply } => {
            let result = engine.start_session(project_id);
            if let Ok(event) = &result {
                publish(events, vec![event.clone()]);
            }
            let _ = reply.send(result);
        }
        Command::CompleteBlock { index, reply } => {
            let result = match index {
                Some(index) => engine.complete_block(index),
                None if engine.is_finished() => Err(SequenceError::SequenceFinished),
                None => engine.complete_block(engine.current_block_index()),
            };
            if let Ok(emitted) = &result {
                publish(events, emitted.clone());
            }
            let _ = reply.send(result);
        }
        Command::EndSession { reply } => {
            let result = engine.stop_session();
            if let Ok(emitted) = &result {
                publish(events, emitted.clone());
            }
            let _ = reply.send(result);
        }
        Command::RetryUnsynced { reply } => {
            let _ = reply.send(Ok(engine.retry_unsynced()));
        }
        Command::Snapshot { reply } => {
            let snapshot = engine.snapshot();
            publish(
                events,
                vec![Event::Snapshot {
                    snapshot: snapshot.clone(),
                    at: Utc::now(),
                }],
            );
            let _ = reply.send(Ok(snapshot));
        }
        Command::Shutdown => {}
    }
}

fn publish(events: &broadcast::Sender<Event>, emitted: Vec<Event>) {
    for event in emitted {
        // No subscribers is fine.
        let _ = events.send(event);
    }
}

/// Cloneable client for a running [`SequenceRunner`].
#[derive(Clone)]
pub struct SequenceHandle {
    tx: mpsc::Sender<Command>,
    events: broadcast::Sender<Event>,
}

impl SequenceHandle {
    /// Receive every event the runner publishes from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub async fn start_block(&self) -> Result<Event, SequenceError> {
        self.request(|reply| Command::StartBlock { reply }).await
    }

    pub async fn start_session(&self, project_id: impl Into<String>) -> Result<Event, SequenceError> {
        let project_id = project_id.into();
        self.request(|reply| Command::StartSession { project_id, reply })
            .await
    }

    /// Complete `index`, or the current block when `None`.
    pub async fn complete_block(&self, index: Option<usize>) -> Result<Vec<Event>, SequenceError> {
        self.request(|reply| Command::CompleteBlock { index, reply })
            .await
    }

    pub async fn end_session(&self) -> Result<Vec<Event>, SequenceError> {
        self.request(|reply| Command::EndSession { reply }).await
    }

    pub async fn retry_unsynced(&self) -> Result<usize, SequenceError> {
        self.request(|reply| Command::RetryUnsynced { reply }).await
    }

    pub async fn snapshot(&self) -> Result<SequenceSnapshot, SequenceError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn shutdown(&self) -> Result<(), SequenceError> {
        debug!("SequenceHandle::shutdown: called");
        self.tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| SequenceError::Stopped)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, SequenceError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| SequenceError::Stopped)?;
        reply_rx.await.map_err(|_| SequenceError::Stopped)?
    }
}

impl std::fmt::Debug for SequenceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}
