//! Shared test doubles: a scripted identity provider and an in-process
//! task API server.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};

use taskdeck::auth::{
    IdentityProvider, ProviderError, ProviderErrorCode, SignInResult, SignUpResult, SignUpStep,
};
use taskdeck::models::{AuthUser, CreateTaskRequest, Task, TaskStatus, UpdateTaskRequest};

// ---------------------------------------------------------------------------
// Identity provider stub
// ---------------------------------------------------------------------------

struct StubUser {
    password: String,
    confirmed: bool,
}

#[derive(Default)]
struct StubState {
    users: HashMap<String, StubUser>,
    signed_in: Option<String>,
}

/// In-memory identity provider with the same error codes the hosted one
/// reports. Confirmation accepts any six-digit code.
#[derive(Default)]
pub struct StubProvider {
    state: Mutex<StubState>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account, optionally already confirmed.
    pub fn with_user(self, email: &str, password: &str, confirmed: bool) -> Self {
        self.state.lock().unwrap().users.insert(
            email.to_string(),
            StubUser {
                password: password.to_string(),
                confirmed,
            },
        );
        self
    }

    pub fn signed_in_user(&self) -> Option<String> {
        self.state.lock().unwrap().signed_in.clone()
    }
}

fn not_signed_in() -> ProviderError {
    ProviderError::new(ProviderErrorCode::NotAuthorized, "No current session")
}

impl IdentityProvider for StubProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResult, ProviderError> {
        let mut state = self.state.lock().unwrap();
        if state.users.contains_key(email) {
            return Err(ProviderError::new(
                ProviderErrorCode::UsernameExists,
                "User already exists",
            ));
        }
        state.users.insert(
            email.to_string(),
            StubUser {
                password: password.to_string(),
                confirmed: false,
            },
        );
        Ok(SignUpResult {
            is_sign_up_complete: false,
            user_id: Some(format!("sub-{email}")),
            next_step: SignUpStep::ConfirmSignUp,
        })
    }

    async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        let Some(user) = state.users.get_mut(email) else {
            return Err(ProviderError::new(
                ProviderErrorCode::UserNotFound,
                "User does not exist",
            ));
        };
        if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ProviderError::new(
                ProviderErrorCode::CodeMismatch,
                "Invalid code",
            ));
        }
        user.confirmed = true;
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResult, ProviderError> {
        let mut state = self.state.lock().unwrap();
        let Some(user) = state.users.get(email) else {
            return Err(ProviderError::new(
                ProviderErrorCode::UserNotFound,
                "User does not exist",
            ));
        };
        if !user.confirmed {
            return Err(ProviderError::new(
                ProviderErrorCode::UserNotConfirmed,
                "User is not confirmed",
            ));
        }
        if user.password != password {
            return Err(ProviderError::new(
                ProviderErrorCode::NotAuthorized,
                "Incorrect username or password",
            ));
        }
        state.signed_in = Some(email.to_string());
        Ok(SignInResult { is_signed_in: true })
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.state.lock().unwrap().signed_in = None;
        Ok(())
    }

    async fn current_user(&self) -> Result<AuthUser, ProviderError> {
        let state = self.state.lock().unwrap();
        let email = state.signed_in.clone().ok_or_else(not_signed_in)?;
        Ok(AuthUser {
            username: email.clone(),
            user_id: format!("sub-{email}"),
            sign_in_details: None,
        })
    }

    async fn access_token(&self) -> Result<String, ProviderError> {
        let state = self.state.lock().unwrap();
        let email = state.signed_in.clone().ok_or_else(not_signed_in)?;
        Ok(format!("stub-token-{email}"))
    }

    async fn reset_password(&self, email: &str) -> Result<(), ProviderError> {
        let state = self.state.lock().unwrap();
        if !state.users.contains_key(email) {
            return Err(ProviderError::new(
                ProviderErrorCode::UserNotFound,
                "User does not exist",
            ));
        }
        Ok(())
    }

    async fn confirm_reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ProviderError::new(
                ProviderErrorCode::CodeMismatch,
                "Invalid code",
            ));
        }
        let Some(user) = state.users.get_mut(email) else {
            return Err(ProviderError::new(
                ProviderErrorCode::UserNotFound,
                "User does not exist",
            ));
        };
        user.password = new_password.to_string();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Task API stub server
// ---------------------------------------------------------------------------

type TaskStore = Arc<Mutex<Vec<Task>>>;

/// Spawn an in-process task API on an ephemeral port. Returns its base URL
/// and a handle on the backing store.
pub async fn spawn_task_api() -> (String, TaskStore) {
    let store: TaskStore = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{id}", put(update_task).delete(delete_task))
        .layer(middleware::from_fn(require_bearer))
        .with_state(store.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub task API");
    let addr = listener.local_addr().expect("stub task API address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve stub task API");
    });

    (format!("http://{addr}"), store)
}

async fn require_bearer(request: axum::extract::Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|h| h.starts_with("Bearer ") && h.len() > 7);

    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "message": "Missing or invalid Authorization header" })),
        )
            .into_response();
    }
    next.run(request).await
}

async fn list_tasks(State(store): State<TaskStore>) -> Json<Vec<Task>> {
    Json(store.lock().unwrap().clone())
}

async fn create_task(
    State(store): State<TaskStore>,
    Json(request): Json<CreateTaskRequest>,
) -> Json<Task> {
    let now = chrono::Utc::now().timestamp_millis();
    let task = Task {
        task_id: uuid::Uuid::new_v4().to_string(),
        user_id: "user-1".to_string(),
        description: request.description,
        status: TaskStatus::Pending,
        deadline: now + 3_600_000,
        expire_at: now + 7_200_000,
        date: request.date,
    };
    store.lock().unwrap().push(task.clone());
    Json(task)
}

async fn update_task(
    State(store): State<TaskStore>,
    Path(id): Path<String>,
    Json(updates): Json<UpdateTaskRequest>,
) -> Response {
    let mut tasks = store.lock().unwrap();
    let Some(task) = tasks.iter_mut().find(|t| t.task_id == id) else {
        return task_not_found();
    };
    if let Some(description) = updates.description {
        task.description = description;
    }
    if let Some(status) = updates.status {
        task.status = status;
    }
    Json(task.clone()).into_response()
}

async fn delete_task(State(store): State<TaskStore>, Path(id): Path<String>) -> Response {
    let mut tasks = store.lock().unwrap();
    let before = tasks.len();
    tasks.retain(|t| t.task_id != id);
    if tasks.len() == before {
        return task_not_found();
    }
    StatusCode::NO_CONTENT.into_response()
}

fn task_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "message": "Task not found" })),
    )
        .into_response()
}
