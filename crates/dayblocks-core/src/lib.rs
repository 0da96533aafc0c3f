//! # Dayblocks Core Library
//!
//! Core logic for dayblocks: a day is an ordered list of project blocks,
//! each with a time budget, worked through one at a time while a single
//! session timer tracks the work against an authoritative backend.
//!
//! ## Architecture
//!
//! - **Session Tracker**: at most one active session, started and ended
//!   optimistically and confirmed (or rolled back) in the background
//! - **Sequence Engine**: walks the day's blocks in order, auto-completing a
//!   block when its countdown runs out; hosted by a single-writer runner
//! - **Productivity**: scoring from productive, awake and sleep time plus
//!   aggregation over raw session, sleep and completion records
//! - **API**: wire contracts and the HTTP backend
//!
//! ## Key Components
//!
//! - [`SessionTracker`]: optimistic single-session state machine
//! - [`SequenceEngine`] / [`SequenceRunner`]: block scheduling
//! - [`ProductivityScorer`]: productivity percentage and sleep quality
//! - [`Config`]: configuration management
//! - [`DayBackend`]: trait for the authoritative backend

pub mod api;
pub mod clock;
pub mod config;
pub mod duration;
pub mod error;
pub mod events;
pub mod productivity;
pub mod sequence;
pub mod session;
pub mod ticker;

pub use api::{DayBackend, HttpBackend};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{ApiError, ConfigError, CoreError, DurationError, SequenceError, SessionError};
pub use events::{CompletionReason, Event};
pub use productivity::{ProductivityScorer, ProductivitySnapshot, SleepQuality};
pub use sequence::{
    BlockState, DailySequence, ProjectBlock, SequenceEngine, SequenceHandle, SequenceRunner,
    SequenceSnapshot,
};
pub use session::{Session, SessionId, SessionTracker};
pub use ticker::{Tick, Ticker};
