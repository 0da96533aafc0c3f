//! Single active session with optimistic start/end.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Provisional --confirmed--> Confirmed --end--> Idle
//!                     |                          |
//!                  failed -> Idle          end failed -> Confirmed (restored)
//! ```
//!
//! Every local transition happens synchronously under one lock and bumps
//! a generation counter. The backend round-trip runs on a spawned task; when
//! it settles, its result is applied only if the generation it was issued
//! under is still current. The lock is never held across an await.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::model::{Session, SessionId};
use crate::api::{DayBackend, StartSessionRequest, StartSessionResponse};
use crate::clock::{Clock, SystemClock};
use crate::error::{ApiError, SessionError};

type ConfirmationRx = oneshot::Receiver<Result<Session, SessionError>>;

#[derive(Debug, Default)]
struct TrackerState {
    active: Option<Session>,
    generation: u64,
    next_provisional: u64,
}

/// Owns the one "currently active" session.
///
/// Cloning is cheap; every clone sees the same state.
#[derive(Clone)]
pub struct SessionTracker {
    state: Arc<Mutex<TrackerState>>,
    backend: Arc<dyn DayBackend>,
    clock: Arc<dyn Clock>,
}

/// A session that is running locally while its start is being confirmed.
#[derive(Debug)]
pub struct ProvisionalSession {
    session: Session,
    confirmation: ConfirmationRx,
}

impl ProvisionalSession {
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Wait for the backend. On failure the tracker has already rolled back.
    pub async fn confirmed(self) -> Result<Session, SessionError> {
        self.confirmation
            .await
            .unwrap_or_else(|_| Err(SessionError::start_failed("confirmation task dropped")))
    }
}

/// A session that was ended locally while the end is being confirmed.
#[derive(Debug)]
pub struct PendingEnd {
    session: Session,
    confirmation: ConfirmationRx,
}

impl PendingEnd {
    /// The closed session as it looked when ended locally.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Wait for the backend. On failure the tracker has already restored the session.
    pub async fn confirmed(self) -> Result<Session, SessionError> {
        self.confirmation
            .await
            .unwrap_or_else(|_| Err(SessionError::end_failed("confirmation task dropped")))
    }
}

impl SessionTracker {
    pub fn new(backend: Arc<dyn DayBackend>) -> Self {
        Self::with_clock(backend, Arc::new(SystemClock))
    }

    pub fn with_clock(backend: Arc<dyn DayBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(TrackerState::default())),
            backend,
            clock,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_active(&self) -> bool {
        self.lock().active.is_some()
    }

    pub fn active_session(&self) -> Option<Session> {
        self.lock().active.clone()
    }

    /// Seconds since the active session's local start; 0 when idle.
    ///
    /// Recomputed from the clock on every call.
    pub fn elapsed_seconds(&self) -> u64 {
        let now = self.clock.now();
        self.lock()
            .active
            .as_ref()
            .map(|s| s.elapsed_seconds(now))
            .unwrap_or(0)
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a free-standing session for `project_id`.
    pub fn start_session(
        &self,
        project_id: impl Into<String>,
    ) -> Result<ProvisionalSession, SessionError> {
        let project_id = project_id.into();
        let request = StartSessionRequest::for_project(project_id.clone());
        self.begin_start(project_id, request)
    }

    /// Start a session bound to a block of a sequence.
    pub fn start_block_session(
        &self,
        project_id: impl Into<String>,
        sequence_id: impl Into<String>,
        block_index: usize,
    ) -> Result<ProvisionalSession, SessionError> {
        let request = StartSessionRequest::for_block(sequence_id, block_index);
        self.begin_start(project_id.into(), request)
    }

    /// End the active session immediately and confirm in the background.
    ///
    /// A session whose start is still unconfirmed has no server id yet; it
    /// is closed locally and the late start confirmation closes the
    /// server-side session instead.
    pub fn end_session(&self) -> Result<PendingEnd, SessionError> {
        let (previous, generation) = {
            let mut state = self.lock();
            let previous = state.active.take().ok_or(SessionError::NoActiveSession)?;
            state.generation += 1;
            (previous, state.generation)
        };

        let mut ended = previous.clone();
        ended.end_time = Some(self.clock.now());
        let (tx, rx) = oneshot::channel();

        match previous.session_id.confirmed().map(str::to_owned) {
            None => {
                debug!(session_id = %previous.session_id, "ended unconfirmed session locally");
                let _ = tx.send(Ok(ended.clone()));
            }
            Some(id) => {
                debug!(session_id = %id, "ending session");
                let tracker = self.clone();
                let closed = ended.clone();
                tokio::spawn(async move {
                    let outcome = match tracker.backend.end_session(&id).await {
                        Ok(()) => {
                            info!(session_id = %id, "session end confirmed");
                            Ok(closed)
                        }
                        Err(err) => {
                            let restored = tracker.restore(generation, previous);
                            warn!(session_id = %id, %err, restored, "session end failed");
                            Err(SessionError::end_failed(err.to_string()))
                        }
                    };
                    let _ = tx.send(outcome);
                });
            }
        }

        Ok(PendingEnd {
            session: ended,
            confirmation: rx,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_start(
        &self,
        project_id: String,
        request: StartSessionRequest,
    ) -> Result<ProvisionalSession, SessionError> {
        let (session, generation) = {
            let mut state = self.lock();
            if state.active.is_some() {
                return Err(SessionError::AlreadyActive);
            }
            state.next_provisional += 1;
            state.generation += 1;
            let session = Session::provisional(state.next_provisional, project_id, self.clock.now());
            state.active = Some(session.clone());
            (session, state.generation)
        };
        debug!(session_id = %session.session_id, project_id = %session.project_id, "session started locally");

        let (tx, rx) = oneshot::channel();
        let tracker = self.clone();
        let provisional = session.clone();
        tokio::spawn(async move {
            let result = tracker.backend.start_session(&request).await;
            let outcome = tracker.settle_start(generation, provisional, result).await;
            let _ = tx.send(outcome);
        });

        Ok(ProvisionalSession {
            session,
            confirmation: rx,
        })
    }

    async fn settle_start(
        &self,
        generation: u64,
        provisional: Session,
        result: Result<StartSessionResponse, ApiError>,
    ) -> Result<Session, SessionError> {
        match result {
            Ok(started) => {
                let applied = {
                    let mut state = self.lock();
                    let current = state.generation == generation;
                    match state.active.as_mut() {
                        Some(active) if current && active.session_id == provisional.session_id => {
                            // Identity comes from the server; the clock keeps the local epoch.
                            active.session_id = SessionId::Confirmed(started.id.clone());
                            active.server_start_time = Some(started.start_time);
                            Some(active.clone())
                        }
                        _ => None,
                    }
                };
                match applied {
                    Some(session) => {
                        info!(session_id = %started.id, "session start confirmed");
                        Ok(session)
                    }
                    None => {
                        warn!(session_id = %started.id, "start confirmed after local end, closing it");
                        if let Err(err) = self.backend.end_session(&started.id).await {
                            warn!(session_id = %started.id, %err, "failed to close orphaned session");
                        }
                        Err(SessionError::Cancelled)
                    }
                }
            }
            Err(err) => {
                let rolled_back = {
                    let mut state = self.lock();
                    let ours = state.generation == generation
                        && state
                            .active
                            .as_ref()
                            .is_some_and(|a| a.session_id == provisional.session_id);
                    if ours {
                        state.active = None;
                        state.generation += 1;
                    }
                    ours
                };
                if !rolled_back {
                    debug!(session_id = %provisional.session_id, %err, "start failed after local end");
                    return Err(SessionError::Cancelled);
                }
                warn!(session_id = %provisional.session_id, %err, "session start failed");
                Err(SessionError::start_failed(err.to_string()))
            }
        }
    }

    /// Put `previous` back after a failed end, unless something else happened since.
    fn restore(&self, generation: u64, previous: Session) -> bool {
        let mut state = self.lock();
        if state.generation == generation && state.active.is_none() {
            state.active = Some(previous);
            state.generation += 1;
            true
        } else {
            false
        }
    }
}

impl std::fmt::Debug for SessionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SessionTracker")
            .field("active", &state.active)
            .field("generation", &state.generation)
            .finish()
    }
}
