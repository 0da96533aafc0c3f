//! Sequence engine implementation.
//!
//! The engine walks the day's blocks in order. Like the session tracker it
//! has no internal thread: the caller invokes `tick()` once per second and
//! feeds backend confirmations back in through `apply_confirmation()`.
//!
//! ## Block States
//!
//! ```text
//! Pending -> Active -> Completed
//! ```
//!
//! `Active -> Pending` only happens when the backend rejects the start or
//! the session is stopped without completing the block.
//!
//! ## Usage
//!
//! ```ignore
//! let (mut engine, mut confirmations) = SequenceEngine::new(sequence, tracker, backend);
//! engine.start_current_block()?;
//! // In a loop:
//! engine.tick();                        // once per second
//! engine.apply_confirmation(c);         // for each c from `confirmations`
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::countdown::{Countdown, CountdownTick};
use super::model::{BlockState, DailySequence};
use super::view::{BlockView, SequenceSnapshot};
use crate::api::{CompleteBlockRequest, DayBackend};
use crate::duration;
use crate::error::{SequenceError, SessionError};
use crate::events::{CompletionReason, Event};
use crate::session::{PendingEnd, ProvisionalSession, Session, SessionId, SessionTracker};

/// Outcome of a backend round-trip, delivered back into the engine.
///
/// Session confirmations carry the id the session had when the request was
/// issued, so a result for an older session never touches a newer one.
#[derive(Debug)]
pub enum Confirmation {
    SessionStarted {
        session_id: SessionId,
        block_index: Option<usize>,
        result: Result<Session, SessionError>,
    },
    SessionEnded {
        session_id: SessionId,
        block_index: Option<usize>,
        result: Result<Session, SessionError>,
    },
    BlockSynced {
        block_index: usize,
        result: Result<(), String>,
    },
}

pub type ConfirmationReceiver = mpsc::UnboundedReceiver<Confirmation>;

/// A running countdown and the session that armed it.
#[derive(Debug)]
struct Armed {
    countdown: Countdown,
    session_id: SessionId,
}

/// Owns the day's sequence and drives its blocks through the session tracker.
pub struct SequenceEngine {
    sequence: DailySequence,
    /// First incomplete block; `len` when finished. Only moves forward.
    current: usize,
    /// Armed while the current block is Active.
    countdown: Option<Armed>,
    tracker: SessionTracker,
    backend: Arc<dyn DayBackend>,
    /// Blocks completed locally whose backend confirmation failed.
    unsynced: BTreeSet<usize>,
    confirmations: mpsc::UnboundedSender<Confirmation>,
}

impl SequenceEngine {
    pub fn new(
        sequence: DailySequence,
        tracker: SessionTracker,
        backend: Arc<dyn DayBackend>,
    ) -> (Self, ConfirmationReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let current = sequence.current_block_index();
        let engine = Self {
            sequence,
            current,
            countdown: None,
            tracker,
            backend,
            unsynced: BTreeSet::new(),
            confirmations: tx,
        };
        (engine, rx)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn sequence(&self) -> &DailySequence {
        &self.sequence
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    pub fn current_block_index(&self) -> usize {
        self.current
    }

    pub fn is_finished(&self) -> bool {
        self.current >= self.sequence.len()
    }

    pub fn block_state(&self, index: usize) -> Option<BlockState> {
        if index >= self.sequence.len() {
            return None;
        }
        Some(if self.sequence.is_completed(index) {
            BlockState::Completed
        } else if self.countdown.as_ref().is_some_and(|a| a.countdown.block_index() == index) {
            BlockState::Active
        } else {
            BlockState::Pending
        })
    }

    /// Seconds left on the current block.
    pub fn remaining_seconds(&self) -> u64 {
        match &self.countdown {
            Some(armed) => armed.countdown.remaining_seconds(),
            None => self
                .sequence
                .block(self.current)
                .map(|b| b.budget_seconds)
                .unwrap_or(0),
        }
    }

    pub fn unsynced_blocks(&self) -> Vec<usize> {
        self.unsynced.iter().copied().collect()
    }

    pub fn snapshot(&self) -> SequenceSnapshot {
        let blocks = self
            .sequence
            .blocks()
            .iter()
            .enumerate()
            .map(|(index, block)| BlockView {
                index,
                project_id: block.project_id.clone(),
                project_name: block.project_name.clone(),
                budget_seconds: block.budget_seconds,
                state: self.block_state(index).unwrap_or(BlockState::Pending),
            })
            .collect();
        let remaining = self.remaining_seconds();
        SequenceSnapshot {
            sequence_id: self.sequence.sequence_id().to_string(),
            current_block: self.current,
            finished: self.is_finished(),
            blocks,
            remaining_seconds: remaining,
            remaining_clock: duration::format_clock(remaining as f64),
            active_session: self.tracker.active_session(),
            elapsed_seconds: self.tracker.elapsed_seconds(),
            unsynced_blocks: self.unsynced_blocks(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start the timer for the current block and arm its countdown.
    pub fn start_current_block(&mut self) -> Result<Event, SequenceError> {
        let index = self.current;
        let block = self
            .sequence
            .block(index)
            .cloned()
            .ok_or(SequenceError::SequenceFinished)?;

        let provisional = self.tracker.start_block_session(
            block.project_id.clone(),
            self.sequence.sequence_id(),
            index,
        )?;
        let session_id = provisional.session().session_id.clone();
        self.countdown = Some(Armed {
            countdown: Countdown::new(index, block.budget_seconds),
            session_id: session_id.clone(),
        });
        info!(block_index = index, project_id = %block.project_id, "block started");

        let event = Event::BlockStarted {
            block_index: index,
            project_id: block.project_id,
            budget_seconds: block.budget_seconds,
            session_id,
            at: Utc::now(),
        };
        self.forward_start(Some(index), provisional);
        Ok(event)
    }

    /// Start a session that is not tied to any block.
    pub fn start_session(&mut self, project_id: impl Into<String>) -> Result<Event, SequenceError> {
        let provisional = self.tracker.start_session(project_id)?;
        let session = provisional.session().clone();
        self.forward_start(None, provisional);
        Ok(Event::SessionStarted {
            session_id: session.session_id,
            project_id: session.project_id,
            at: Utc::now(),
        })
    }

    /// Mark `index` done and move to the next incomplete block after it.
    ///
    /// Completing an already completed block is a no-op and returns no
    /// events. Only the current block may be completed; later ones are
    /// rejected with [`SequenceError::OutOfOrder`].
    pub fn complete_block(&mut self, index: usize) -> Result<Vec<Event>, SequenceError> {
        self.complete(index, CompletionReason::Explicit)
    }

    /// End the running session without completing anything.
    ///
    /// An Active block goes back to Pending with a full countdown.
    pub fn stop_session(&mut self) -> Result<Vec<Event>, SequenceError> {
        let pending = self.tracker.end_session()?;
        let block_index = self.countdown.take().map(|a| a.countdown.block_index());
        debug!(?block_index, "session stopped");
        let event = ended_event(&pending);
        self.forward_end(block_index, pending);
        Ok(vec![event])
    }

    /// Advance the countdown by one second. Completes the block on expiry.
    pub fn tick(&mut self) -> Vec<Event> {
        if !self.tracker.is_active() {
            return Vec::new();
        }
        let Some(Armed { countdown, .. }) = self.countdown.as_mut() else {
            return Vec::new();
        };
        match countdown.tick() {
            CountdownTick::Running { .. } => Vec::new(),
            CountdownTick::Expired => {
                let index = countdown.block_index();
                info!(block_index = index, "block budget exhausted");
                self.complete(index, CompletionReason::BudgetExhausted)
                    .unwrap_or_else(|err| {
                        warn!(block_index = index, %err, "auto-completion failed");
                        Vec::new()
                    })
            }
        }
    }

    /// Apply the result of a backend round-trip.
    pub fn apply_confirmation(&mut self, confirmation: Confirmation) -> Vec<Event> {
        let at = Utc::now();
        match confirmation {
            Confirmation::SessionStarted {
                block_index,
                result: Ok(session),
                ..
            } => vec![Event::SessionConfirmed {
                session_id: session.session_id,
                block_index,
                at,
            }],
            Confirmation::SessionStarted {
                result: Err(SessionError::Cancelled),
                ..
            } => Vec::new(),
            Confirmation::SessionStarted {
                session_id,
                block_index,
                result: Err(err),
            } => {
                if self
                    .countdown
                    .as_ref()
                    .is_some_and(|a| a.session_id == session_id)
                {
                    self.countdown = None;
                }
                vec![Event::SessionStartRolledBack {
                    block_index,
                    reason: err.to_string(),
                    at,
                }]
            }
            Confirmation::SessionEnded { result: Ok(_), .. } => Vec::new(),
            Confirmation::SessionEnded {
                session_id,
                block_index,
                result: Err(err),
            } => {
                let elapsed = self.tracker.elapsed_seconds();
                if let Some(index) = block_index {
                    self.rearm(index, session_id, elapsed);
                }
                vec![Event::SessionEndRolledBack {
                    block_index,
                    elapsed_seconds: elapsed,
                    reason: err.to_string(),
                    at,
                }]
            }
            Confirmation::BlockSynced {
                block_index,
                result: Ok(()),
            } => {
                self.unsynced.remove(&block_index);
                Vec::new()
            }
            Confirmation::BlockSynced {
                block_index,
                result: Err(reason),
            } => {
                self.unsynced.insert(block_index);
                vec![Event::BlockSyncFailed {
                    block_index,
                    reason,
                    at,
                }]
            }
        }
    }

    /// Re-send every completion the backend has not acknowledged.
    pub fn retry_unsynced(&mut self) -> usize {
        let pending = std::mem::take(&mut self.unsynced);
        let count = pending.len();
        for index in pending {
            self.sync_completion(index);
        }
        count
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(
        &mut self,
        index: usize,
        reason: CompletionReason,
    ) -> Result<Vec<Event>, SequenceError> {
        let len = self.sequence.len();
        if index >= len {
            return Err(SequenceError::OutOfBounds { index, len });
        }
        if self.sequence.is_completed(index) {
            debug!(block_index = index, "block already completed");
            return Ok(Vec::new());
        }
        if index != self.current {
            return Err(SequenceError::OutOfOrder {
                index,
                current: self.current,
            });
        }

        // Tear the countdown down first so a late expiry has nothing to fire.
        self.countdown = None;
        self.sequence.mark_completed(index)?;
        self.current = self.sequence.next_incomplete_after(index);
        info!(block_index = index, ?reason, next_block = self.current, "block completed");

        let at = Utc::now();
        let mut events = vec![Event::BlockCompleted {
            block_index: index,
            reason,
            next_block: self.current,
            at,
        }];

        match self.tracker.end_session() {
            Ok(pending) => {
                events.push(ended_event(&pending));
                self.forward_end(Some(index), pending);
            }
            Err(err) => debug!(block_index = index, %err, "no session to end"),
        }

        self.sync_completion(index);

        if self.is_finished() {
            info!(sequence_id = %self.sequence.sequence_id(), "sequence finished");
            events.push(Event::SequenceFinished {
                sequence_id: self.sequence.sequence_id().to_string(),
                at,
            });
        }
        Ok(events)
    }

    /// Resume the countdown of a stopped block whose session came back.
    fn rearm(&mut self, index: usize, session_id: SessionId, elapsed: u64) {
        let restored = self
            .tracker
            .active_session()
            .is_some_and(|s| s.session_id == session_id);
        if self.countdown.is_some()
            || index != self.current
            || self.sequence.is_completed(index)
            || !restored
        {
            return;
        }
        if let Some(block) = self.sequence.block(index) {
            debug!(block_index = index, elapsed, "countdown resumed");
            self.countdown = Some(Armed {
                countdown: Countdown::resumed(index, block.budget_seconds, elapsed),
                session_id,
            });
        }
    }

    fn sync_completion(&self, index: usize) {
        let request = CompleteBlockRequest {
            sequence_id: self.sequence.sequence_id().to_string(),
            block_index: index,
        };
        let backend = Arc::clone(&self.backend);
        let tx = self.confirmations.clone();
        tokio::spawn(async move {
            let result = backend
                .complete_block(&request)
                .await
                .map_err(|err| err.to_string());
            if let Err(reason) = &result {
                warn!(block_index = index, %reason, "block completion not recorded");
            }
            let _ = tx.send(Confirmation::BlockSynced {
                block_index: index,
                result,
            });
        });
    }

    fn forward_start(&self, block_index: Option<usize>, provisional: ProvisionalSession) {
        let tx = self.confirmations.clone();
        let session_id = provisional.session().session_id.clone();
        tokio::spawn(async move {
            let result = provisional.confirmed().await;
            let _ = tx.send(Confirmation::SessionStarted {
                session_id,
                block_index,
                result,
            });
        });
    }

    fn forward_end(&self, block_index: Option<usize>, pending: PendingEnd) {
        let tx = self.confirmations.clone();
        let session_id = pending.session().session_id.clone();
        tokio::spawn(async move {
            let result = pending.confirmed().await;
            let _ = tx.send(Confirmation::SessionEnded {
                session_id,
                block_index,
                result,
            });
        });
    }
}

fn ended_event(pending: &PendingEnd) -> Event {
    let session = pending.session();
    Event::SessionEnded {
        session_id: session.session_id.clone(),
        project_id: session.project_id.clone(),
        duration: session.duration(),
        at: Utc::now(),
    }
}

impl std::fmt::Debug for SequenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceEngine")
            .field("sequence", &self.sequence)
            .field("current", &self.current)
            .field("countdown", &self.countdown)
            .field("unsynced", &self.unsynced)
            .finish()
    }
}
