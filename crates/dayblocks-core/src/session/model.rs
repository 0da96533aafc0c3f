use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::duration;

/// Identity of a session.
///
/// A session is `Provisional` from the moment the tracker starts it until the
/// backend confirms it, at which point the id is replaced by the
/// authoritative one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum SessionId {
    Provisional(u64),
    Confirmed(String),
}

impl SessionId {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, SessionId::Confirmed(_))
    }

    pub fn confirmed(&self) -> Option<&str> {
        match self {
            SessionId::Confirmed(id) => Some(id),
            SessionId::Provisional(_) => None,
        }
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionId::Provisional(n) => write!(f, "provisional-{n}"),
            SessionId::Confirmed(id) => f.write_str(id),
        }
    }
}

/// A timed work interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub project_id: String,
    /// Local instant the timer began. Confirmation never moves it.
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Start instant reported by the backend, kept for reference only.
    #[serde(default)]
    pub server_start_time: Option<DateTime<Utc>>,
}

impl Session {
    pub(crate) fn provisional(n: u64, project_id: String, start_time: DateTime<Utc>) -> Self {
        Self {
            session_id: SessionId::Provisional(n),
            project_id,
            start_time,
            end_time: None,
            server_start_time: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }

    /// Whole seconds between start and `now` (or the end, once closed).
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        let until = self.end_time.unwrap_or(now);
        (until - self.start_time).num_seconds().max(0) as u64
    }

    /// `"XhYmZs"` once the session is closed.
    pub fn duration(&self) -> Option<String> {
        let end = self.end_time?;
        let millis = (end - self.start_time).num_milliseconds().max(0);
        Some(duration::format_hms(millis as f64 / 1000.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn duration_is_only_known_once_closed() {
        let start = Utc::now();
        let mut session = Session::provisional(1, "alpha".into(), start);
        assert!(session.duration().is_none());
        assert_eq!(session.elapsed_seconds(start + Duration::seconds(42)), 42);

        session.end_time = Some(start + Duration::seconds(5425));
        assert_eq!(session.duration().as_deref(), Some("1h30m25s"));
        assert_eq!(session.elapsed_seconds(start + Duration::hours(9)), 5425);
    }

    #[test]
    fn elapsed_never_negative() {
        let start = Utc::now();
        let session = Session::provisional(1, "alpha".into(), start);
        assert_eq!(session.elapsed_seconds(start - Duration::seconds(3)), 0);
    }

    #[test]
    fn session_id_display() {
        assert_eq!(SessionId::Provisional(3).to_string(), "provisional-3");
        assert_eq!(SessionId::Confirmed("17".into()).to_string(), "17");
        assert_eq!(SessionId::Confirmed("17".into()).confirmed(), Some("17"));
    }
}
