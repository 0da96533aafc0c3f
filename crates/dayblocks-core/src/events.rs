use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sequence::SequenceSnapshot;
use crate::session::SessionId;

/// Why a block was marked done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// The user (or a caller) completed it.
    Explicit,
    /// Its countdown reached zero.
    BudgetExhausted,
}

/// Every state change in the engine produces an Event.
/// The runner broadcasts them; the CLI prints them as JSON lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A free-standing session started locally.
    SessionStarted {
        session_id: SessionId,
        project_id: String,
        at: DateTime<Utc>,
    },
    /// The backend accepted a session start.
    SessionConfirmed {
        session_id: SessionId,
        block_index: Option<usize>,
        at: DateTime<Utc>,
    },
    /// The backend rejected a session start; the session is gone.
    SessionStartRolledBack {
        block_index: Option<usize>,
        reason: String,
        at: DateTime<Utc>,
    },
    SessionEnded {
        session_id: SessionId,
        project_id: String,
        duration: Option<String>,
        at: DateTime<Utc>,
    },
    /// The backend rejected a session end; the session runs again.
    SessionEndRolledBack {
        block_index: Option<usize>,
        elapsed_seconds: u64,
        reason: String,
        at: DateTime<Utc>,
    },
    BlockStarted {
        block_index: usize,
        project_id: String,
        budget_seconds: u64,
        session_id: SessionId,
        at: DateTime<Utc>,
    },
    BlockCompleted {
        block_index: usize,
        reason: CompletionReason,
        /// Index of the new current block (`len` when finished).
        next_block: usize,
        at: DateTime<Utc>,
    },
    /// The completion is kept locally but the backend has not recorded it.
    BlockSyncFailed {
        block_index: usize,
        reason: String,
        at: DateTime<Utc>,
    },
    SequenceFinished {
        sequence_id: String,
        at: DateTime<Utc>,
    },
    Snapshot {
        snapshot: SequenceSnapshot,
        at: DateTime<Utc>,
    },
}
