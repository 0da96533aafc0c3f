use serde::{Deserialize, Serialize};

use super::model::BlockState;
use crate::session::Session;

/// One block as presented to a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockView {
    pub index: usize,
    pub project_id: String,
    pub project_name: String,
    pub budget_seconds: u64,
    pub state: BlockState,
}

/// Everything a presentation layer needs to draw the day.
///
/// Built by [`SequenceEngine::snapshot`](super::SequenceEngine::snapshot);
/// the engine itself keeps no view state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceSnapshot {
    pub sequence_id: String,
    pub current_block: usize,
    pub finished: bool,
    pub blocks: Vec<BlockView>,
    /// Countdown of the current block, or its full budget when not running.
    pub remaining_seconds: u64,
    /// `remaining_seconds` as `HH:MM:SS`.
    pub remaining_clock: String,
    pub active_session: Option<Session>,
    pub elapsed_seconds: u64,
    pub unsynced_blocks: Vec<usize>,
}
