use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "task_kind", rename_all = "snake_case")]
pub enum TaskKind {
    ParseJob,
    AnalyzeCandidate,
    SendOutreach,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

/// Error recorded on tasks whose worker stopped reporting.
pub const STALE_TASK_ERROR: &str = "worker stopped before finishing the task";

/// Work item stored in `tasks.payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskPayload {
    ParseJob { job_id: Uuid },
    AnalyzeCandidate { candidate_id: Uuid },
    SendOutreach { outreach_id: Uuid },
}

impl TaskPayload {
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskPayload::ParseJob { .. } => TaskKind::ParseJob,
            TaskPayload::AnalyzeCandidate { .. } => TaskKind::AnalyzeCandidate,
            TaskPayload::SendOutreach { .. } => TaskKind::SendOutreach,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub kind: TaskKind,
    pub payload: JsonValue,
    pub status: TaskStatus,
    pub result: Option<JsonValue>,
    pub error: Option<String>,
    pub callback_url: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(
        payload: &TaskPayload,
        callback_url: Option<String>,
        created_by: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            kind: payload.kind(),
            payload: serde_json::to_value(payload)?,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            callback_url,
            created_by,
            created_at: now,
            started_at: None,
            finished_at: None,
        })
    }

    pub fn decode_payload(&self) -> serde_json::Result<TaskPayload> {
        serde_json::from_value(self.payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips_through_stored_json() {
        let payload = TaskPayload::SendOutreach { outreach_id: Uuid::new_v4() };
        let task = Task::new(&payload, None, None, Utc::now()).unwrap();
        assert_eq!(task.kind, TaskKind::SendOutreach);
        assert_eq!(task.payload["kind"], "send_outreach");
        assert_eq!(task.decode_payload().unwrap(), payload);
    }
}
