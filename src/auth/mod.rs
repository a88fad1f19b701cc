//! Identity client: sign-up, confirmation, sign-in/out, password reset and
//! token retrieval against a hosted identity provider.
//!
//! The provider itself sits behind the [`IdentityProvider`] trait; the
//! production implementation is [`provider::CognitoProvider`]. The client
//! normalizes provider error codes into user-facing messages and keeps the
//! [`SessionStore`] up to date after state-changing operations.

pub mod provider;

use std::sync::Arc;

use thiserror::Error;

use crate::models::AuthUser;
use crate::session::SessionStore;

pub use provider::CognitoProvider;

/// Error codes the identity provider can report. Anything outside the known
/// set is carried verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderErrorCode {
    UserNotFound,
    NotAuthorized,
    UserNotConfirmed,
    UsernameExists,
    InvalidParameter,
    CodeMismatch,
    ExpiredCode,
    LimitExceeded,
    Other(String),
}

/// A failed provider call: the raw code plus the provider's own message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub code: ProviderErrorCode,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn other(name: &str, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Other(name.to_string()), message)
    }

    /// Sentence-form message suitable for direct display. Known codes map to
    /// fixed text; unknown codes fall back to the provider's message, or a
    /// generic sentence when that is empty too.
    pub fn user_message(&self) -> String {
        match &self.code {
            ProviderErrorCode::UserNotFound => {
                "User not found. Please check your email or sign up.".to_string()
            }
            ProviderErrorCode::NotAuthorized => "Incorrect password. Please try again.".to_string(),
            ProviderErrorCode::UserNotConfirmed => {
                "Please confirm your email address before signing in.".to_string()
            }
            ProviderErrorCode::UsernameExists => {
                "An account with this email already exists.".to_string()
            }
            ProviderErrorCode::InvalidParameter => {
                "Invalid email or password format.".to_string()
            }
            ProviderErrorCode::CodeMismatch => "Invalid verification code.".to_string(),
            ProviderErrorCode::ExpiredCode => "Verification code has expired.".to_string(),
            ProviderErrorCode::LimitExceeded => {
                "Attempt limit exceeded. Please try again later.".to_string()
            }
            ProviderErrorCode::Other(_) => {
                if self.message.is_empty() {
                    "An error occurred during authentication.".to_string()
                } else {
                    self.message.clone()
                }
            }
        }
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.user_message())
    }
}

impl std::error::Error for ProviderError {}

/// Errors surfaced by [`IdentityClient`]. Every variant carries a message
/// fit for direct display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The provider rejected the operation.
    #[error("{0}")]
    Rejected(String),
    /// No valid session or token is available.
    #[error("No authenticated user")]
    NotAuthenticated,
}

impl From<ProviderError> for AuthError {
    fn from(err: ProviderError) -> Self {
        Self::Rejected(err.user_message())
    }
}

/// Next step the provider requires after a sign-up request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUpStep {
    /// A confirmation code was sent; the account must be confirmed.
    ConfirmSignUp,
    /// Account confirmed, the provider will complete the auto sign-in.
    CompleteAutoSignIn,
    /// Nothing left to do.
    Done,
}

/// Provider-level result of a sign-up call.
#[derive(Debug, Clone)]
pub struct SignUpResult {
    pub is_sign_up_complete: bool,
    pub user_id: Option<String>,
    pub next_step: SignUpStep,
}

/// Provider-level result of a sign-in call.
#[derive(Debug, Clone)]
pub struct SignInResult {
    pub is_signed_in: bool,
}

/// The hosted identity provider boundary.
///
/// Every call is a single attempt: no retries, no backoff. Failures carry a
/// [`ProviderError`] with the provider's error code.
#[allow(async_fn_in_trait)]
pub trait IdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResult, ProviderError>;
    async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<(), ProviderError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResult, ProviderError>;
    async fn sign_out(&self) -> Result<(), ProviderError>;
    async fn current_user(&self) -> Result<AuthUser, ProviderError>;
    /// Bearer token for API calls. Absence of a session is an error here.
    async fn access_token(&self) -> Result<String, ProviderError>;
    async fn reset_password(&self, email: &str) -> Result<(), ProviderError>;
    async fn confirm_reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), ProviderError>;
}

/// Outcome of [`IdentityClient::sign_up`].
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub is_sign_up_complete: bool,
    pub user_id: Option<String>,
    pub next_step: SignUpStep,
    pub message: String,
}

/// Outcome of [`IdentityClient::confirm_sign_up`].
#[derive(Debug, Clone)]
pub struct ConfirmSignUpOutcome {
    pub is_sign_up_complete: bool,
    pub message: String,
}

/// Outcome of [`IdentityClient::sign_in`].
#[derive(Debug, Clone)]
pub struct SignInOutcome {
    pub is_signed_in: bool,
    pub message: String,
}

/// Outcome of the password-reset operations.
#[derive(Debug, Clone)]
pub struct ResetPasswordOutcome {
    pub message: String,
}

/// Wraps an [`IdentityProvider`] with error-message normalization and
/// session-state bookkeeping. Cloning is cheap; clones share the provider
/// and the session store.
pub struct IdentityClient<P> {
    provider: Arc<P>,
    session: SessionStore,
}

impl<P> Clone for IdentityClient<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            session: self.session.clone(),
        }
    }
}

impl<P: IdentityProvider> IdentityClient<P> {
    pub fn new(provider: P, session: SessionStore) -> Self {
        Self {
            provider: Arc::new(provider),
            session,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Register a new identity. Does not mutate session state; the account
    /// typically still needs confirmation.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let result = self.provider.sign_up(email, password).await.map_err(|e| {
            tracing::warn!(error = %e, "sign-up failed");
            AuthError::from(e)
        })?;

        Ok(SignUpOutcome {
            is_sign_up_complete: result.is_sign_up_complete,
            user_id: result.user_id,
            next_step: result.next_step,
            message: "Sign-up successful! Please check your email for verification code."
                .to_string(),
        })
    }

    /// Submit an email confirmation code. Does not sign the user in.
    pub async fn confirm_sign_up(
        &self,
        email: &str,
        code: &str,
    ) -> Result<ConfirmSignUpOutcome, AuthError> {
        self.provider
            .confirm_sign_up(email, code)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "sign-up confirmation failed");
                AuthError::from(e)
            })?;

        Ok(ConfirmSignUpOutcome {
            is_sign_up_complete: true,
            message: "Email verified successfully! You can now sign in.".to_string(),
        })
    }

    /// Authenticate. On success, refreshes the session state (authenticated
    /// flag first, then the current user) before returning.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome, AuthError> {
        let result = self.provider.sign_in(email, password).await.map_err(|e| {
            tracing::warn!(error = %e, "sign-in failed");
            AuthError::from(e)
        })?;

        if result.is_signed_in {
            self.refresh_session().await;
        }

        Ok(SignInOutcome {
            is_signed_in: result.is_signed_in,
            message: "Sign-in successful!".to_string(),
        })
    }

    /// Invalidate the session with the provider, then unconditionally clear
    /// both session-state cells.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let result = self.provider.sign_out().await;
        self.session.clear();
        result.map_err(|e| {
            tracing::warn!(error = %e, "sign-out failed");
            AuthError::from(e)
        })
    }

    /// Look up the active identity. A failed lookup clears the current-user
    /// cell and yields `None`; it is not an error.
    pub async fn current_user(&self) -> Option<AuthUser> {
        match self.provider.current_user().await {
            Ok(user) => {
                self.session.set_current_user(Some(user.clone()));
                Some(user)
            }
            Err(_) => {
                self.session.set_current_user(None);
                None
            }
        }
    }

    /// Bearer token for the task API. Fails when no valid session exists.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        self.provider
            .access_token()
            .await
            .map_err(|_| AuthError::NotAuthenticated)
    }

    /// Whether a current-user lookup succeeds. Never propagates the lookup
    /// failure.
    pub async fn is_authenticated(&self) -> bool {
        self.provider.current_user().await.is_ok()
    }

    /// Start a password-reset challenge. Stateless with respect to session.
    pub async fn reset_password(&self, email: &str) -> Result<ResetPasswordOutcome, AuthError> {
        self.provider
            .reset_password(email)
            .await
            .map_err(AuthError::from)?;
        Ok(ResetPasswordOutcome {
            message: "Password reset code sent to your email.".to_string(),
        })
    }

    /// Complete a password-reset challenge.
    pub async fn confirm_reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<ResetPasswordOutcome, AuthError> {
        self.provider
            .confirm_reset_password(email, code, new_password)
            .await
            .map_err(AuthError::from)?;
        Ok(ResetPasswordOutcome {
            message: "Password reset successfully! You can now sign in with your new password."
                .to_string(),
        })
    }

    /// Re-derive the session state from the provider: set the authenticated
    /// flag, then fetch the current user. The two updates are separate calls;
    /// a subscriber can observe the flag before the user arrives.
    async fn refresh_session(&self) {
        let authenticated = self.is_authenticated().await;
        self.session.set_authenticated(authenticated);

        if authenticated {
            self.current_user().await;
        } else {
            self.session.set_current_user(None);
        }
    }
}
