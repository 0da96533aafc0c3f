//! Boundary with the authoritative backend: wire contracts, the
//! [`DayBackend`] trait and its HTTP implementation.

mod backend;
pub mod contracts;
mod http;

pub use backend::DayBackend;
pub use contracts::{
    CompleteBlockRequest, CompletionRecord, ProductivityReport, SequenceProject, SequenceResponse,
    SessionRecord, SleepRecord, StartSessionRequest, StartSessionResponse,
};
pub use http::HttpBackend;
