//! Shared test helpers: an in-memory backend with switchable failures.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Semaphore;

use dayblocks_core::api::{
    CompleteBlockRequest, CompletionRecord, DayBackend, ProductivityReport, SequenceResponse,
    SessionRecord, SleepRecord, StartSessionRequest, StartSessionResponse,
};
use dayblocks_core::sequence::{ConfirmationReceiver, DailySequence, ProjectBlock, SequenceEngine};
use dayblocks_core::{ApiError, Event, ManualClock, SessionTracker};

#[derive(Debug, Default)]
struct Recorded {
    next_id: u64,
    starts: Vec<StartSessionRequest>,
    ends: Vec<String>,
    completions: Vec<CompleteBlockRequest>,
}

/// Backend that answers from memory.
///
/// Every failure switch makes the matching call return HTTP 500. With
/// `hold_starts` on, start requests wait until `release_start` is called.
#[derive(Debug)]
pub struct FakeBackend {
    recorded: Mutex<Recorded>,
    pub fail_start: AtomicBool,
    pub fail_end: AtomicBool,
    pub fail_complete: AtomicBool,
    hold_starts: AtomicBool,
    start_gate: Semaphore,
}

fn server_error(endpoint: &str) -> ApiError {
    ApiError::Status {
        endpoint: endpoint.to_string(),
        status: 500,
        body: "boom".into(),
    }
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            recorded: Mutex::new(Recorded::default()),
            fail_start: AtomicBool::new(false),
            fail_end: AtomicBool::new(false),
            fail_complete: AtomicBool::new(false),
            hold_starts: AtomicBool::new(false),
            start_gate: Semaphore::new(0),
        })
    }

    pub fn set(flag: &AtomicBool, on: bool) {
        flag.store(on, Ordering::SeqCst);
    }

    pub fn hold_starts(&self) {
        self.hold_starts.store(true, Ordering::SeqCst);
    }

    /// Let one held start request through.
    pub fn release_start(&self) {
        self.start_gate.add_permits(1);
    }

    pub fn starts(&self) -> Vec<StartSessionRequest> {
        self.recorded.lock().unwrap().starts.clone()
    }

    pub fn ends(&self) -> Vec<String> {
        self.recorded.lock().unwrap().ends.clone()
    }

    pub fn completions(&self) -> Vec<CompleteBlockRequest> {
        self.recorded.lock().unwrap().completions.clone()
    }
}

#[async_trait]
impl DayBackend for FakeBackend {
    async fn today_sequence(&self) -> Result<SequenceResponse, ApiError> {
        Err(server_error("today-sequence"))
    }

    async fn start_session(
        &self,
        request: &StartSessionRequest,
    ) -> Result<StartSessionResponse, ApiError> {
        self.recorded.lock().unwrap().starts.push(request.clone());
        if self.hold_starts.load(Ordering::SeqCst) {
            self.start_gate.acquire().await.unwrap().forget();
        }
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(server_error("start-session"));
        }
        let mut recorded = self.recorded.lock().unwrap();
        recorded.next_id += 1;
        Ok(StartSessionResponse {
            id: recorded.next_id.to_string(),
            start_time: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            project_id: None,
        })
    }

    async fn end_session(&self, session_id: &str) -> Result<(), ApiError> {
        self.recorded.lock().unwrap().ends.push(session_id.to_string());
        if self.fail_end.load(Ordering::SeqCst) {
            return Err(server_error("end-session"));
        }
        Ok(())
    }

    async fn complete_block(&self, request: &CompleteBlockRequest) -> Result<(), ApiError> {
        self.recorded.lock().unwrap().completions.push(request.clone());
        if self.fail_complete.load(Ordering::SeqCst) {
            return Err(server_error("complete-block"));
        }
        Ok(())
    }

    async fn productivity(&self) -> Result<ProductivityReport, ApiError> {
        Ok(ProductivityReport::default())
    }

    async fn sleep_records(&self) -> Result<Vec<SleepRecord>, ApiError> {
        Ok(Vec::new())
    }

    async fn sessions(&self) -> Result<Vec<SessionRecord>, ApiError> {
        Ok(Vec::new())
    }

    async fn monthly_completions(&self) -> Result<Vec<CompletionRecord>, ApiError> {
        Ok(Vec::new())
    }
}

pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()))
}

pub fn tracker(backend: &Arc<FakeBackend>, clock: &Arc<ManualClock>) -> SessionTracker {
    SessionTracker::with_clock(backend.clone(), clock.clone())
}

/// Engine over fresh blocks `p0`, `p1`, ... with the given budgets.
pub fn engine(
    backend: &Arc<FakeBackend>,
    clock: &Arc<ManualClock>,
    budgets: &[u64],
) -> (SequenceEngine, ConfirmationReceiver) {
    let blocks = budgets
        .iter()
        .enumerate()
        .map(|(i, budget)| ProjectBlock::new(format!("p{i}"), *budget))
        .collect();
    let sequence = DailySequence::fresh("seq-1", blocks);
    SequenceEngine::new(sequence, tracker(backend, clock), backend.clone())
}

/// Receive `count` confirmations and apply them, returning every event produced.
pub async fn settle(
    engine: &mut SequenceEngine,
    confirmations: &mut ConfirmationReceiver,
    count: usize,
) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..count {
        let confirmation = tokio::time::timeout(Duration::from_secs(5), confirmations.recv())
            .await
            .expect("confirmation arrives")
            .expect("channel open");
        events.extend(engine.apply_confirmation(confirmation));
    }
    events
}
