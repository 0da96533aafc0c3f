use serde::{Deserialize, Serialize};

use crate::error::SequenceError;

/// Default time allotment for a block: three hours.
pub const DEFAULT_BLOCK_BUDGET_SECS: u64 = 3 * 60 * 60;

/// One scheduled unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectBlock {
    pub project_id: String,
    /// Display name; equals `project_id` when the backend only sends names.
    pub project_name: String,
    pub budget_seconds: u64,
}

impl ProjectBlock {
    pub fn new(project_id: impl Into<String>, budget_seconds: u64) -> Self {
        let project_id = project_id.into();
        Self {
            project_name: project_id.clone(),
            project_id,
            budget_seconds,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = name.into();
        self
    }
}

/// Lifecycle of a block.
///
/// ```text
/// Pending -> Active -> Completed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockState {
    Pending,
    Active,
    Completed,
}

/// The day's ordered blocks plus their completion flags.
///
/// `completed` always has the same length as `blocks`; the only way to
/// flip a flag is [`DailySequence::mark_completed`], which never clears one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySequence {
    sequence_id: String,
    blocks: Vec<ProjectBlock>,
    completed: Vec<bool>,
}

impl DailySequence {
    pub fn new(
        sequence_id: impl Into<String>,
        blocks: Vec<ProjectBlock>,
        completed: Vec<bool>,
    ) -> Result<Self, SequenceError> {
        if blocks.len() != completed.len() {
            return Err(SequenceError::LengthMismatch {
                blocks: blocks.len(),
                completed: completed.len(),
            });
        }
        Ok(Self {
            sequence_id: sequence_id.into(),
            blocks,
            completed,
        })
    }

    /// A sequence with nothing completed yet.
    pub fn fresh(sequence_id: impl Into<String>, blocks: Vec<ProjectBlock>) -> Self {
        let completed = vec![false; blocks.len()];
        Self {
            sequence_id: sequence_id.into(),
            blocks,
            completed,
        }
    }

    pub fn sequence_id(&self) -> &str {
        &self.sequence_id
    }

    pub fn blocks(&self) -> &[ProjectBlock] {
        &self.blocks
    }

    pub fn completed(&self) -> &[bool] {
        &self.completed
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, index: usize) -> Option<&ProjectBlock> {
        self.blocks.get(index)
    }

    pub fn is_completed(&self, index: usize) -> bool {
        self.completed.get(index).copied().unwrap_or(false)
    }

    /// First incomplete block, or `len()` when every block is done.
    pub fn current_block_index(&self) -> usize {
        self.completed
            .iter()
            .position(|done| !done)
            .unwrap_or(self.blocks.len())
    }

    /// First incomplete block strictly after `index`, or `len()`.
    ///
    /// Never looks backwards.
    pub fn next_incomplete_after(&self, index: usize) -> usize {
        self.completed
            .iter()
            .enumerate()
            .skip(index.saturating_add(1))
            .find(|(_, done)| !**done)
            .map(|(i, _)| i)
            .unwrap_or(self.blocks.len())
    }

    pub fn is_finished(&self) -> bool {
        self.completed.iter().all(|done| *done)
    }

    /// Returns `false` when the block was already completed.
    pub(crate) fn mark_completed(&mut self, index: usize) -> Result<bool, SequenceError> {
        let len = self.blocks.len();
        let flag = self
            .completed
            .get_mut(index)
            .ok_or(SequenceError::OutOfBounds { index, len })?;
        let newly = !*flag;
        *flag = true;
        Ok(newly)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.iter().filter(|done| **done).count()
    }
}
