//! View controllers: form state, validation and service orchestration for
//! the login/registration flow and the task list.

pub mod login;
pub mod task_list;

pub use login::{AuthMode, LoginController, SubmitOutcome};
pub use task_list::{TaskFilter, TaskListController};

/// A single form field with its touched flag. Validation errors are only
/// shown for touched fields; a failed submit touches every field so the
/// inline errors surface.
#[derive(Debug, Clone, Default)]
pub struct Field {
    pub value: String,
    pub touched: bool,
}

impl Field {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            touched: false,
        }
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.touched = false;
    }
}
