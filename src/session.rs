//! Session state shared between the identity client, the route guard and
//! the controllers.
//!
//! Two independently settable observable values: the authenticated flag and
//! the current user. Each is a `tokio::sync::watch` channel, so subscribers
//! always observe the latest value at subscribe time (replay-last) and are
//! woken on every later update. The two cells are deliberately separate;
//! they are updated by sequential calls and carry no atomicity guarantee
//! between them.

use std::sync::Arc;

use tokio::sync::watch;

use crate::models::AuthUser;

struct Cells {
    authenticated: watch::Sender<bool>,
    current_user: watch::Sender<Option<AuthUser>>,
}

/// Cloneable handle to the session state. All clones share the same cells.
#[derive(Clone)]
pub struct SessionStore {
    cells: Arc<Cells>,
}

impl SessionStore {
    /// Create a store in the signed-out state (`false` / `None`).
    pub fn new() -> Self {
        let (authenticated, _) = watch::channel(false);
        let (current_user, _) = watch::channel(None);
        Self {
            cells: Arc::new(Cells {
                authenticated,
                current_user,
            }),
        }
    }

    pub fn authenticated(&self) -> bool {
        *self.cells.authenticated.borrow()
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.cells.current_user.borrow().clone()
    }

    pub fn set_authenticated(&self, value: bool) {
        self.cells.authenticated.send_replace(value);
    }

    pub fn set_current_user(&self, user: Option<AuthUser>) {
        self.cells.current_user.send_replace(user);
    }

    /// Reset both cells to the signed-out state.
    pub fn clear(&self) {
        self.set_authenticated(false);
        self.set_current_user(None);
    }

    /// Subscribe to the authenticated flag. The receiver starts at the
    /// current value; missed updates are not replayed.
    pub fn watch_authenticated(&self) -> watch::Receiver<bool> {
        self.cells.authenticated.subscribe()
    }

    /// Subscribe to the current user.
    pub fn watch_current_user(&self) -> watch::Receiver<Option<AuthUser>> {
        self.cells.current_user.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
