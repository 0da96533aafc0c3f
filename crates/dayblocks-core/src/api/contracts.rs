//! Request/response contracts for the authoritative backend.
//!
//! Field names follow the wire format exactly (it mixes camelCase and
//! snake_case). Every response type has a `validate` step; payloads that
//! fail it are rejected here instead of leaking into the engine.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ApiError;
use crate::sequence::{DailySequence, ProjectBlock};

/// `GET /today-sequence`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceResponse {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub projects: Vec<SequenceProject>,
    pub completed: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceProject {
    #[serde(default, deserialize_with = "opt_string_or_number", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "projectName")]
    pub project_name: String,
    #[serde(rename = "budgetSeconds", default, skip_serializing_if = "Option::is_none")]
    pub budget_seconds: Option<u64>,
}

impl SequenceResponse {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.completed.len() != self.projects.len() {
            return Err(ApiError::invalid(
                "sequence",
                format!(
                    "{} completion flags for {} projects",
                    self.completed.len(),
                    self.projects.len()
                ),
            ));
        }
        if let Some(i) = self.projects.iter().position(|p| p.project_name.trim().is_empty()) {
            return Err(ApiError::invalid("sequence", format!("project {i} has no name")));
        }
        if self.projects.iter().any(|p| p.budget_seconds == Some(0)) {
            return Err(ApiError::invalid("sequence", "block budget must be positive"));
        }
        Ok(())
    }

    /// Build the engine's sequence. Blocks without their own budget get `default_budget`.
    pub fn into_sequence(self, default_budget: u64) -> Result<DailySequence, ApiError> {
        self.validate()?;
        let blocks = self
            .projects
            .into_iter()
            .map(|p| {
                let budget = p.budget_seconds.unwrap_or(default_budget);
                let id = p.id.unwrap_or_else(|| p.project_name.clone());
                ProjectBlock::new(id, budget).with_name(p.project_name)
            })
            .collect();
        DailySequence::new(self.id, blocks, self.completed)
            .map_err(|e| ApiError::invalid("sequence", e.to_string()))
    }
}

/// `POST /start-session`, in either of its two shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StartSessionRequest {
    Project {
        project_id: String,
    },
    Block {
        #[serde(rename = "sequenceId")]
        sequence_id: String,
        #[serde(rename = "blockIndex")]
        block_index: usize,
    },
}

impl StartSessionRequest {
    pub fn for_project(project_id: impl Into<String>) -> Self {
        StartSessionRequest::Project {
            project_id: project_id.into(),
        }
    }

    pub fn for_block(sequence_id: impl Into<String>, block_index: usize) -> Self {
        StartSessionRequest::Block {
            sequence_id: sequence_id.into(),
            block_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartSessionResponse {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub project_id: Option<String>,
}

impl StartSessionResponse {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.id.trim().is_empty() {
            return Err(ApiError::invalid("start session", "empty session id"));
        }
        Ok(())
    }
}

/// `POST /complete-block`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteBlockRequest {
    #[serde(rename = "sequenceId")]
    pub sequence_id: String,
    #[serde(rename = "blockIndex")]
    pub block_index: usize,
}

/// `GET /productivity-percentage`. Durations are `"XhYmZs"` text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductivityReport {
    pub total_productive_time: String,
    pub total_awake_time: String,
    pub productivity_percentage: f64,
    pub sleep_duration: String,
    pub base_productivity: f64,
}

impl ProductivityReport {
    pub fn validate(&self) -> Result<(), ApiError> {
        if !self.productivity_percentage.is_finite() || !self.base_productivity.is_finite() {
            return Err(ApiError::invalid("productivity", "percentages must be finite"));
        }
        Ok(())
    }
}

impl Default for ProductivityReport {
    fn default() -> Self {
        Self {
            total_productive_time: "0h0m0s".into(),
            total_awake_time: "16h0m0s".into(),
            productivity_percentage: 0.0,
            sleep_duration: "0h0m0s".into(),
            base_productivity: 0.0,
        }
    }
}

/// One entry of `GET /get-sleep`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepRecord {
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    /// Whole seconds. The wire carries either a number or numeric text.
    #[serde(deserialize_with = "seconds_text_or_number")]
    pub duration: u64,
}

/// One entry of `GET /sessions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub project_id: Option<String>,
    pub start_time: DateTime<FixedOffset>,
    #[serde(default)]
    pub end_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub duration: Option<String>,
}

/// One entry of `GET /monthly-completions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    #[serde(rename = "taskText")]
    pub task_text: String,
    #[serde(rename = "completedAt")]
    pub completed_at: DateTime<FixedOffset>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Int(i64),
    Float(f64),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(s) => s,
        TextOrNumber::Int(n) => n.to_string(),
        TextOrNumber::Float(f) => f.to_string(),
    })
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<TextOrNumber> = Option::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        TextOrNumber::Text(s) => s,
        TextOrNumber::Int(n) => n.to_string(),
        TextOrNumber::Float(f) => f.to_string(),
    }))
}

fn seconds_text_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let secs = match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Int(n) => n as f64,
        TextOrNumber::Float(f) => f,
        TextOrNumber::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("duration {s:?} is not a number of seconds")))?,
    };
    if !secs.is_finite() || secs < 0.0 {
        return Err(D::Error::custom(format!("duration {secs} out of range")));
    }
    Ok(secs.trunc() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sequence_response_builds_daily_sequence() {
        let response: SequenceResponse = serde_json::from_value(json!({
            "id": 7,
            "projects": [
                {"projectName": "Thesis"},
                {"projectName": "Website", "id": "p-2", "budgetSeconds": 3600}
            ],
            "completed": [true, false]
        }))
        .unwrap();

        let seq = response.into_sequence(10800).unwrap();
        assert_eq!(seq.sequence_id(), "7");
        assert_eq!(seq.blocks()[0].project_id, "Thesis");
        assert_eq!(seq.blocks()[0].budget_seconds, 10800);
        assert_eq!(seq.blocks()[1].project_id, "p-2");
        assert_eq!(seq.blocks()[1].project_name, "Website");
        assert_eq!(seq.blocks()[1].budget_seconds, 3600);
        assert_eq!(seq.current_block_index(), 1);
    }

    #[test]
    fn sequence_response_rejects_misaligned_flags() {
        let response: SequenceResponse = serde_json::from_value(json!({
            "id": "s",
            "projects": [{"projectName": "Thesis"}],
            "completed": []
        }))
        .unwrap();
        assert!(matches!(
            response.into_sequence(10800),
            Err(ApiError::InvalidPayload { what: "sequence", .. })
        ));
    }

    #[test]
    fn start_request_serializes_both_shapes() {
        let by_project = serde_json::to_value(StartSessionRequest::for_project("42")).unwrap();
        assert_eq!(by_project, json!({"project_id": "42"}));

        let by_block = serde_json::to_value(StartSessionRequest::for_block("seq-1", 2)).unwrap();
        assert_eq!(by_block, json!({"sequenceId": "seq-1", "blockIndex": 2}));
    }

    #[test]
    fn start_response_accepts_numeric_ids() {
        let response: StartSessionResponse = serde_json::from_value(json!({
            "id": 99,
            "startTime": "2024-05-01T09:00:00Z",
            "project_id": 3
        }))
        .unwrap();
        assert_eq!(response.id, "99");
        assert_eq!(response.project_id.as_deref(), Some("3"));
        assert!(response.validate().is_ok());
    }

    #[test]
    fn sleep_duration_accepts_text_or_number() {
        let records: Vec<SleepRecord> = serde_json::from_value(json!([
            {"start_time": "2024-05-01T23:00:00+03:00", "end_time": "2024-05-02T07:00:00+03:00", "duration": "28800"},
            {"start_time": "2024-05-02T23:30:00+03:00", "end_time": "2024-05-03T06:00:00+03:00", "duration": 23400.7}
        ]))
        .unwrap();
        assert_eq!(records[0].duration, 28800);
        assert_eq!(records[1].duration, 23400);
    }

    #[test]
    fn sleep_duration_rejects_garbage() {
        let result: Result<SleepRecord, _> = serde_json::from_value(json!({
            "start_time": "2024-05-01T23:00:00Z",
            "end_time": "2024-05-02T07:00:00Z",
            "duration": "eight hours"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn productivity_report_rejects_non_finite() {
        let report = ProductivityReport {
            base_productivity: f64::INFINITY,
            ..ProductivityReport::default()
        };
        assert!(report.validate().is_err());
    }
}
