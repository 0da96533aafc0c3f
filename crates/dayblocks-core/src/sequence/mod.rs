//! Daily sequence of project blocks.
//!
//! [`DailySequence`] holds the day's data, [`SequenceEngine`] drives it,
//! and [`SequenceRunner`] hosts the engine on its own task.

mod countdown;
mod engine;
mod model;
mod runner;
mod view;

pub use countdown::{Countdown, CountdownTick};
pub use engine::{Confirmation, ConfirmationReceiver, SequenceEngine};
pub use model::{BlockState, DailySequence, ProjectBlock, DEFAULT_BLOCK_BUDGET_SECS};
pub use runner::{Command, SequenceHandle, SequenceRunner};
pub use view::{BlockView, SequenceSnapshot};
