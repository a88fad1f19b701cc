//! Task list controller.
//!
//! Owns the local task cache (loaded once, then kept up to date by
//! optimistic mutations), the status filter, at most one in-progress edit
//! and at most one pending delete confirmation. Errors land in a single
//! shared slot that is cleared at the start of each attempt.

use std::str::FromStr;

use super::Field;
use crate::auth::IdentityProvider;
use crate::models::{Task, TaskStatus, UpdateTaskRequest};
use crate::tasks::{self, TaskClient};

/// Status filter over the local task list. `Pending` and `Expired` layer a
/// client-side time check over the server status: a `Pending` task past its
/// deadline counts as expired, not pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Completed,
    Pending,
    Expired,
}

impl FromStr for TaskFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "completed" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            "expired" => Ok(Self::Expired),
            other => Err(format!("unknown filter: {other} (expected all, completed, pending or expired)")),
        }
    }
}

/// Form state for creating a task.
#[derive(Debug, Default)]
pub struct TaskForm {
    pub description: Field,
    pub date: String,
}

/// Form state for editing an existing task.
#[derive(Debug)]
pub struct EditForm {
    pub description: Field,
    pub status: TaskStatus,
}

impl Default for EditForm {
    fn default() -> Self {
        Self {
            description: Field::default(),
            status: TaskStatus::Pending,
        }
    }
}

pub struct TaskListController<P> {
    client: TaskClient<P>,
    pub tasks: Vec<Task>,
    pub form: TaskForm,
    pub edit_form: EditForm,
    filter: TaskFilter,
    editing_task_id: Option<String>,
    pending_delete: Option<String>,
    loading: bool,
    error_message: Option<String>,
}

impl<P: IdentityProvider> TaskListController<P> {
    pub fn new(client: TaskClient<P>) -> Self {
        Self {
            client,
            tasks: Vec::new(),
            form: TaskForm::default(),
            edit_form: EditForm::default(),
            filter: TaskFilter::All,
            editing_task_id: None,
            pending_delete: None,
            loading: false,
            error_message: None,
        }
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn filter(&self) -> TaskFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter;
    }

    pub fn editing_task_id(&self) -> Option<&str> {
        self.editing_task_id.as_deref()
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    /// Replace the local cache with the server's task list.
    pub async fn load(&mut self) -> bool {
        self.loading = true;
        self.error_message = None;

        let ok = match self.client.list().await {
            Ok(tasks) => {
                self.tasks = tasks;
                true
            }
            Err(e) => {
                self.error_message = Some(e.to_string());
                false
            }
        };
        self.loading = false;
        ok
    }

    /// Create a task from the form. Prepends the created task to the local
    /// list (no re-fetch) and clears the form on success.
    pub async fn create_task(&mut self) -> bool {
        if self.form.description.value.trim().is_empty() {
            self.form.description.touched = true;
            return false;
        }

        self.loading = true;
        self.error_message = None;

        let date = match self.form.date.trim() {
            "" => None,
            d => Some(d.to_string()),
        };
        let ok = match self
            .client
            .create(&self.form.description.value, date)
            .await
        {
            Ok(task) => {
                self.tasks.insert(0, task);
                self.form.description.clear();
                self.form.date.clear();
                true
            }
            Err(e) => {
                self.error_message = Some(e.to_string());
                false
            }
        };
        self.loading = false;
        ok
    }

    /// Update a task's status on the server, then mutate the cached task.
    /// Optimistic: there is no rollback if a later call disagrees.
    pub async fn update_status(&mut self, task_id: &str, new_status: TaskStatus) -> bool {
        self.loading = true;
        self.error_message = None;

        let updates = UpdateTaskRequest {
            description: None,
            status: Some(new_status),
        };
        let ok = match self.client.update(task_id, updates).await {
            Ok(()) => {
                if let Some(task) = self.tasks.iter_mut().find(|t| t.task_id == task_id) {
                    task.status = new_status;
                }
                true
            }
            Err(e) => {
                self.error_message = Some(e.to_string());
                false
            }
        };
        self.loading = false;
        ok
    }

    /// Copy the target task's description and status into the edit form.
    pub fn start_edit(&mut self, task_id: &str) {
        if let Some(task) = self.tasks.iter().find(|t| t.task_id == task_id) {
            self.editing_task_id = Some(task.task_id.clone());
            self.edit_form.description = Field::new(task.description.clone());
            self.edit_form.status = task.status;
        }
    }

    /// Validate and persist the edit form, then mutate the cached task in
    /// place and clear the edit state.
    pub async fn save_edit(&mut self) -> bool {
        let Some(task_id) = self.editing_task_id.clone() else {
            return false;
        };
        if self.edit_form.description.value.trim().is_empty() {
            self.edit_form.description.touched = true;
            return false;
        }

        self.loading = true;
        self.error_message = None;

        let updates = UpdateTaskRequest {
            description: Some(self.edit_form.description.value.clone()),
            status: Some(self.edit_form.status),
        };
        let ok = match self.client.update(&task_id, updates.clone()).await {
            Ok(()) => {
                if let Some(task) = self.tasks.iter_mut().find(|t| t.task_id == task_id) {
                    if let Some(description) = updates.description {
                        task.description = description;
                    }
                    if let Some(status) = updates.status {
                        task.status = status;
                    }
                }
                self.cancel_edit();
                true
            }
            Err(e) => {
                self.error_message = Some(e.to_string());
                false
            }
        };
        self.loading = false;
        ok
    }

    /// Discard the edit form without calling the server.
    pub fn cancel_edit(&mut self) {
        self.editing_task_id = None;
        self.edit_form = EditForm::default();
    }

    /// First half of the delete handshake: remember which task the user
    /// asked to delete. Nothing is sent until `confirm_delete`.
    pub fn request_delete(&mut self, task_id: &str) {
        self.pending_delete = Some(task_id.to_string());
    }

    /// Second half: perform the delete and drop the task from the cache.
    pub async fn confirm_delete(&mut self) -> bool {
        let Some(task_id) = self.pending_delete.take() else {
            return false;
        };

        self.loading = true;
        self.error_message = None;

        let ok = match self.client.delete(&task_id).await {
            Ok(()) => {
                self.tasks.retain(|t| t.task_id != task_id);
                true
            }
            Err(e) => {
                self.error_message = Some(e.to_string());
                false
            }
        };
        self.loading = false;
        ok
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// The local list through the current filter.
    pub fn filtered_tasks(&self) -> Vec<&Task> {
        match self.filter {
            TaskFilter::All => self.tasks.iter().collect(),
            TaskFilter::Completed => self
                .tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Completed)
                .collect(),
            TaskFilter::Pending => self
                .tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Pending && !tasks::is_expired(t))
                .collect(),
            TaskFilter::Expired => self
                .tasks
                .iter()
                .filter(|t| tasks::is_expired(t) || t.status == TaskStatus::Expired)
                .collect(),
        }
    }

    pub fn completed_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count()
    }

    pub fn pending_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending && !tasks::is_expired(t))
            .count()
    }

    pub fn expired_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| tasks::is_expired(t) || t.status == TaskStatus::Expired)
            .count()
    }
}
