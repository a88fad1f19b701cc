//! Navigation guard for protected views.

use crate::auth::{IdentityClient, IdentityProvider};

/// The three logical routes of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Default view, the task list.
    TaskList,
    /// Explicit `/tasks` alias.
    Tasks,
    /// Public login/register view.
    Login,
}

impl Route {
    pub fn is_protected(&self) -> bool {
        !matches!(self, Self::Login)
    }
}

/// Result of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectToLogin,
}

/// Checks authentication before a protected route activates.
///
/// The check runs fresh on every navigation attempt rather than trusting a
/// cached session flag, so an expired token denies access immediately.
pub struct AuthGuard<P> {
    identity: IdentityClient<P>,
}

impl<P: IdentityProvider> AuthGuard<P> {
    pub fn new(identity: IdentityClient<P>) -> Self {
        Self { identity }
    }

    pub async fn can_activate(&self, route: Route) -> GuardDecision {
        if !route.is_protected() {
            return GuardDecision::Allow;
        }

        // is_authenticated() swallows lookup failures, so a failed check
        // lands on the redirect path like any signed-out user.
        if self.identity.is_authenticated().await {
            GuardDecision::Allow
        } else {
            tracing::debug!(?route, "guard denied navigation, redirecting to login");
            GuardDecision::RedirectToLogin
        }
    }
}
