//! Task API client: authenticated CRUD over the remote task service, plus
//! pure presentation helpers for deadlines and status display.

use chrono::{Local, TimeZone, Utc};
use thiserror::Error;

use crate::auth::{AuthError, IdentityClient, IdentityProvider};
use crate::models::{CreateTaskRequest, Task, TaskStatus, UpdateTaskRequest};

/// Errors from the task API client. Every variant carries a displayable
/// message; no classification of HTTP status codes beyond success/failure.
#[derive(Debug, Error)]
pub enum TaskApiError {
    /// Could not obtain a bearer token; the operation never reached the API.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// The server answered with an error; its message is passed through.
    #[error("{0}")]
    Api(String),
    /// The request itself failed (connection, TLS, decoding).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// HTTP client for the task REST API.
///
/// Every operation first obtains a bearer token from the identity client and
/// sends it as `Authorization: Bearer <token>`. Single attempt per call; any
/// failure propagates to the caller.
pub struct TaskClient<P> {
    http: reqwest::Client,
    base_url: String,
    identity: IdentityClient<P>,
}

impl<P> Clone for TaskClient<P> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            identity: self.identity.clone(),
        }
    }
}

impl<P: IdentityProvider> TaskClient<P> {
    pub fn new(base_url: impl Into<String>, identity: IdentityClient<P>) -> Self {
        let base_url = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            identity,
        }
    }

    async fn bearer_token(&self) -> Result<String, TaskApiError> {
        Ok(self.identity.access_token().await?)
    }

    /// All tasks owned by the authenticated identity. Ownership scoping is
    /// enforced server-side.
    pub async fn list(&self) -> Result<Vec<Task>, TaskApiError> {
        let token = self.bearer_token().await?;
        let response = self
            .http
            .get(format!("{}/tasks", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Create a task. The description is trimmed before sending; the server
    /// assigns id, owner, timestamps and the initial `Pending` status.
    pub async fn create(
        &self,
        description: &str,
        date: Option<String>,
    ) -> Result<Task, TaskApiError> {
        let token = self.bearer_token().await?;
        let body = CreateTaskRequest {
            description: description.trim().to_string(),
            date,
        };
        let response = self
            .http
            .post(format!("{}/tasks", self.base_url))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Partial update. The server applies whichever fields are present; the
    /// client does not require at least one.
    pub async fn update(&self, task_id: &str, updates: UpdateTaskRequest) -> Result<(), TaskApiError> {
        let token = self.bearer_token().await?;
        let response = self
            .http
            .put(format!("{}/tasks/{task_id}", self.base_url))
            .bearer_auth(token)
            .json(&updates)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// Delete by identifier.
    pub async fn delete(&self, task_id: &str) -> Result<(), TaskApiError> {
        let token = self.bearer_token().await?;
        let response = self
            .http
            .delete(format!("{}/tasks/{task_id}", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

/// Pass 2xx responses through; otherwise surface the server's message field
/// (or the raw body) as a [`TaskApiError::Api`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TaskApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v["message"]
                .as_str()
                .or_else(|| v["error"].as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("task API returned {status}"));

    tracing::warn!(%status, message, "task API error");
    Err(TaskApiError::Api(message))
}

/// Current time in epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// A task is expired when the server already says so, or when its deadline
/// has passed. Monotonic in time for a fixed deadline.
pub fn is_expired(task: &Task) -> bool {
    is_expired_at(task, now_ms())
}

pub fn is_expired_at(task: &Task, now_ms: i64) -> bool {
    task.status == TaskStatus::Expired || now_ms > task.deadline
}

/// Human-readable time left until `deadline`: "Expired" once the deadline
/// has passed, otherwise whole hours and minutes, or minutes only when less
/// than an hour remains.
pub fn time_remaining(deadline: i64) -> String {
    time_remaining_at(deadline, now_ms())
}

pub fn time_remaining_at(deadline: i64, now_ms: i64) -> String {
    let diff = deadline - now_ms;
    if diff <= 0 {
        return "Expired".to_string();
    }

    let minutes = diff / (1000 * 60);
    let hours = minutes / 60;
    if hours > 0 {
        format!("{}h {}m remaining", hours, minutes % 60)
    } else {
        format!("{minutes}m remaining")
    }
}

/// CSS badge class for a status string, case-insensitive. Anything that is
/// not "completed" or "expired" gets the pending (warning) class.
pub fn status_badge_class(status: &str) -> &'static str {
    match status.to_ascii_lowercase().as_str() {
        "completed" => "badge-success",
        "expired" => "badge-danger",
        _ => "badge-warning",
    }
}

/// Format an epoch-millisecond deadline in local time for display.
pub fn format_deadline(deadline: i64) -> String {
    match Local.timestamp_millis_opt(deadline).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => deadline.to_string(),
    }
}
