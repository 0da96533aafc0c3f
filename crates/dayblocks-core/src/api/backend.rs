use async_trait::async_trait;

use super::contracts::{
    CompleteBlockRequest, CompletionRecord, ProductivityReport, SequenceResponse, SessionRecord,
    SleepRecord, StartSessionRequest, StartSessionResponse,
};
use crate::error::ApiError;

/// The authoritative side of every operation.
///
/// The engine and tracker only ever talk to this trait; [`HttpBackend`]
/// is the production implementation.
///
/// [`HttpBackend`]: super::HttpBackend
#[async_trait]
pub trait DayBackend: Send + Sync {
    /// Today's sequence.
    async fn today_sequence(&self) -> Result<SequenceResponse, ApiError>;

    /// Persist a new session and return its authoritative identity.
    async fn start_session(
        &self,
        request: &StartSessionRequest,
    ) -> Result<StartSessionResponse, ApiError>;

    /// Close the session with the given authoritative id.
    async fn end_session(&self, session_id: &str) -> Result<(), ApiError>;

    /// Mark a block done server-side.
    async fn complete_block(&self, request: &CompleteBlockRequest) -> Result<(), ApiError>;

    /// Today's already-penalized productivity figures.
    async fn productivity(&self) -> Result<ProductivityReport, ApiError>;

    async fn sleep_records(&self) -> Result<Vec<SleepRecord>, ApiError>;

    async fn sessions(&self) -> Result<Vec<SessionRecord>, ApiError>;

    async fn monthly_completions(&self) -> Result<Vec<CompletionRecord>, ApiError>;
}
