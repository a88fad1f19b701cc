//! Data models shared between the task API client and the controllers.
//!
//! Field names are serialized in camelCase to match the task service's
//! JSON wire format.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a task.
///
/// Transitions are `Pending` -> `Completed` (user action) or
/// `Pending` -> `Expired` (deadline passed, applied server-side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Completed,
    Expired,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Expired => "Expired",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "expired" => Ok(Self::Expired),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// A to-do item as returned by the task API.
///
/// The server assigns the identifier, the owner, the timestamps and the
/// initial `Pending` status. Deadlines are epoch milliseconds; `expire_at`
/// drives the server-side TTL that flips overdue tasks to `Expired`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_id: String,
    pub user_id: String,
    pub description: String,
    pub status: TaskStatus,
    pub deadline: i64,
    pub expire_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Payload for `POST /tasks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Payload for `PUT /tasks/{id}`. Both fields are optional; the server
/// applies whichever are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

/// The authenticated identity, as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Sign-in name (an email address).
    pub username: String,
    /// Stable provider-assigned identifier.
    pub user_id: String,
    /// Opaque sign-in metadata, when the provider reports any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_in_details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_round_trips_camel_case() {
        let json = r#"{
            "taskId": "t-1",
            "userId": "u-1",
            "description": "Buy milk",
            "status": "Pending",
            "deadline": 1700000000000,
            "expireAt": 1700003600000
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.task_id, "t-1");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.date, None);

        let back = serde_json::to_value(&task).unwrap();
        assert_eq!(back["taskId"], "t-1");
        assert_eq!(back["expireAt"], 1_700_003_600_000_i64);
        assert!(back.get("date").is_none());
    }

    #[test]
    fn update_request_skips_absent_fields() {
        let req = UpdateTaskRequest {
            description: None,
            status: Some(TaskStatus::Completed),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"status":"Completed"}"#);
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(
            "COMPLETED".parse::<TaskStatus>().unwrap(),
            TaskStatus::Completed
        );
        assert!("done".parse::<TaskStatus>().is_err());
    }
}
