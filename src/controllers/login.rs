//! Login/registration controller.
//!
//! A two-mode form (login / register) sharing an email+password pair plus a
//! confirmation-code field that becomes required after a sign-up that needs
//! email verification. No network call happens until the form validates.

use super::Field;
use crate::auth::{IdentityClient, IdentityProvider, SignUpStep};

/// Which form the user currently sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

/// What a submit attempt led to. `SignedIn` is the caller's cue to navigate
/// to the task view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; nothing was sent.
    Invalid,
    /// The service call failed; see `error_message`.
    Failed,
    /// Sign-in succeeded.
    SignedIn,
    /// Sign-up succeeded and a confirmation code is now expected.
    AwaitingConfirmation,
    /// Sign-up succeeded with no confirmation step.
    Registered,
    /// The confirmation code was accepted; the user can now sign in.
    Confirmed,
}

pub struct LoginController<P> {
    identity: IdentityClient<P>,
    pub email: Field,
    pub password: Field,
    pub confirmation_code: Field,
    mode: AuthMode,
    needs_confirmation: bool,
    loading: bool,
    error_message: Option<String>,
    success_message: Option<String>,
}

impl<P: IdentityProvider> LoginController<P> {
    pub fn new(identity: IdentityClient<P>) -> Self {
        Self {
            identity,
            email: Field::default(),
            password: Field::default(),
            confirmation_code: Field::default(),
            mode: AuthMode::Login,
            needs_confirmation: false,
            loading: false,
            error_message: None,
            success_message: None,
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn needs_confirmation(&self) -> bool {
        self.needs_confirmation
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn success_message(&self) -> Option<&str> {
        self.success_message.as_deref()
    }

    /// Switch between login and register. Clears both credential fields, the
    /// pending-confirmation flag and all messages, and untouches every field
    /// so stale inline errors disappear.
    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        self.needs_confirmation = false;
        self.error_message = None;
        self.success_message = None;
        self.email.clear();
        self.password.clear();
        self.confirmation_code.clear();
    }

    pub fn email_error(&self) -> Option<&'static str> {
        if self.email.value.is_empty() {
            Some("Email is required")
        } else if !is_valid_email(&self.email.value) {
            Some("Please enter a valid email address")
        } else {
            None
        }
    }

    pub fn password_error(&self) -> Option<&'static str> {
        let password = &self.password.value;
        if password.is_empty() {
            Some("Password is required")
        } else if password.chars().count() < 8 {
            Some("Password must be at least 8 characters long")
        } else if self.mode == AuthMode::Register && !has_required_complexity(password) {
            Some(
                "Password must contain at least one uppercase letter, \
                 one lowercase letter, and one number",
            )
        } else {
            None
        }
    }

    pub fn confirmation_code_error(&self) -> Option<&'static str> {
        if self.needs_confirmation && self.confirmation_code.value.trim().is_empty() {
            Some("Confirmation code is required")
        } else {
            None
        }
    }

    fn is_valid(&self) -> bool {
        self.email_error().is_none()
            && self.password_error().is_none()
            && self.confirmation_code_error().is_none()
    }

    fn mark_all_touched(&mut self) {
        self.email.touched = true;
        self.password.touched = true;
        self.confirmation_code.touched = true;
    }

    /// Submit the form for whatever the current state asks: confirmation
    /// code while one is pending, otherwise sign-in in login mode, sign-up
    /// in register mode.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if !self.is_valid() {
            self.mark_all_touched();
            return SubmitOutcome::Invalid;
        }

        self.loading = true;
        self.error_message = None;
        self.success_message = None;

        let outcome = match self.mode {
            AuthMode::Login if self.needs_confirmation => self.submit_confirmation().await,
            AuthMode::Login => self.submit_sign_in().await,
            AuthMode::Register => self.submit_sign_up().await,
        };

        self.loading = false;
        outcome
    }

    async fn submit_confirmation(&mut self) -> SubmitOutcome {
        let code = self.confirmation_code.value.trim().to_string();
        match self
            .identity
            .confirm_sign_up(&self.email.value, &code)
            .await
        {
            Ok(outcome) => {
                self.success_message = Some(outcome.message);
                self.needs_confirmation = false;
                self.confirmation_code.clear();
                SubmitOutcome::Confirmed
            }
            Err(e) => {
                self.error_message = Some(e.to_string());
                SubmitOutcome::Failed
            }
        }
    }

    async fn submit_sign_in(&mut self) -> SubmitOutcome {
        match self
            .identity
            .sign_in(&self.email.value, &self.password.value)
            .await
        {
            Ok(outcome) if outcome.is_signed_in => SubmitOutcome::SignedIn,
            Ok(_) => {
                self.error_message =
                    Some("Additional sign-in verification is required.".to_string());
                SubmitOutcome::Failed
            }
            Err(e) => {
                self.error_message = Some(e.to_string());
                SubmitOutcome::Failed
            }
        }
    }

    async fn submit_sign_up(&mut self) -> SubmitOutcome {
        match self
            .identity
            .sign_up(&self.email.value, &self.password.value)
            .await
        {
            Ok(outcome) => {
                self.success_message = Some(outcome.message);
                if outcome.next_step == SignUpStep::ConfirmSignUp {
                    // Stay on the login form, but expect the code next.
                    self.needs_confirmation = true;
                    self.mode = AuthMode::Login;
                    SubmitOutcome::AwaitingConfirmation
                } else {
                    self.mode = AuthMode::Login;
                    self.email.clear();
                    self.password.clear();
                    SubmitOutcome::Registered
                }
            }
            Err(e) => {
                self.error_message = Some(e.to_string());
                SubmitOutcome::Failed
            }
        }
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn has_required_complexity(password: &str) -> bool {
    password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
}
