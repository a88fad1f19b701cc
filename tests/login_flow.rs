//! End-to-end login, registration and guard scenarios against the stub
//! identity provider.

mod common;

use common::StubProvider;
use taskdeck::auth::{AuthError, IdentityClient};
use taskdeck::controllers::{AuthMode, LoginController, SubmitOutcome};
use taskdeck::guard::{AuthGuard, GuardDecision, Route};
use taskdeck::session::SessionStore;

fn client_with(provider: StubProvider) -> IdentityClient<StubProvider> {
    IdentityClient::new(provider, SessionStore::new())
}

#[tokio::test]
async fn login_happy_path_sets_session_before_navigation() {
    let identity = client_with(StubProvider::new().with_user("a@b.com", "Abcdef12", true));
    let mut controller = LoginController::new(identity.clone());

    controller.email.set("a@b.com");
    controller.password.set("Abcdef12");

    let outcome = controller.submit().await;
    assert_eq!(outcome, SubmitOutcome::SignedIn);

    // The session was refreshed before submit returned, so the flag and the
    // user are already visible when the caller navigates.
    assert!(identity.session().authenticated());
    let user = identity.session().current_user().expect("current user set");
    assert_eq!(user.username, "a@b.com");
    assert_eq!(user.user_id, "sub-a@b.com");
}

#[tokio::test]
async fn wrong_password_surfaces_mapped_message() {
    let identity = client_with(StubProvider::new().with_user("a@b.com", "Abcdef12", true));
    let mut controller = LoginController::new(identity.clone());

    controller.email.set("a@b.com");
    controller.password.set("WrongPass1");

    assert_eq!(controller.submit().await, SubmitOutcome::Failed);
    assert_eq!(
        controller.error_message(),
        Some("Incorrect password. Please try again.")
    );
    assert!(!identity.session().authenticated());
}

#[tokio::test]
async fn unconfirmed_user_cannot_sign_in() {
    let identity = client_with(StubProvider::new().with_user("new@b.com", "Abcdef12", false));
    let mut controller = LoginController::new(identity);

    controller.email.set("new@b.com");
    controller.password.set("Abcdef12");

    assert_eq!(controller.submit().await, SubmitOutcome::Failed);
    assert_eq!(
        controller.error_message(),
        Some("Please confirm your email address before signing in.")
    );
}

#[tokio::test]
async fn registration_flows_through_confirmation() {
    let identity = client_with(StubProvider::new());
    let mut controller = LoginController::new(identity.clone());

    controller.toggle_mode();
    assert_eq!(controller.mode(), AuthMode::Register);
    controller.email.set("new@b.com");
    controller.password.set("Abcdef12");

    // Sign-up wants a confirmation code: back to login mode with the
    // confirmation field required.
    assert_eq!(controller.submit().await, SubmitOutcome::AwaitingConfirmation);
    assert_eq!(controller.mode(), AuthMode::Login);
    assert!(controller.needs_confirmation());
    assert!(controller.success_message().is_some());

    // Empty code fails validation before any provider call.
    assert_eq!(controller.submit().await, SubmitOutcome::Invalid);
    assert_eq!(
        controller.confirmation_code_error(),
        Some("Confirmation code is required")
    );

    // A six-digit code confirms; the flag and the field are cleared.
    controller.confirmation_code.set("123456");
    assert_eq!(controller.submit().await, SubmitOutcome::Confirmed);
    assert!(!controller.needs_confirmation());
    assert!(controller.confirmation_code.value.is_empty());
    assert_eq!(
        controller.success_message(),
        Some("Email verified successfully! You can now sign in.")
    );

    // Still not signed in; the user must submit again.
    assert!(!identity.session().authenticated());
    assert_eq!(controller.submit().await, SubmitOutcome::SignedIn);
    assert!(identity.session().authenticated());
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let identity = client_with(StubProvider::new().with_user("a@b.com", "Abcdef12", true));
    let mut controller = LoginController::new(identity);

    controller.toggle_mode();
    controller.email.set("a@b.com");
    controller.password.set("Abcdef12");

    assert_eq!(controller.submit().await, SubmitOutcome::Failed);
    assert_eq!(
        controller.error_message(),
        Some("An account with this email already exists.")
    );
}

#[tokio::test]
async fn bad_confirmation_code_maps_to_code_mismatch_message() {
    let identity = client_with(StubProvider::new().with_user("new@b.com", "Abcdef12", false));
    let outcome = identity.confirm_sign_up("new@b.com", "nope").await;
    assert_eq!(
        outcome.unwrap_err(),
        AuthError::Rejected("Invalid verification code.".to_string())
    );
}

#[tokio::test]
async fn guard_redirects_when_signed_out_and_allows_when_signed_in() {
    let identity = client_with(StubProvider::new().with_user("a@b.com", "Abcdef12", true));
    let guard = AuthGuard::new(identity.clone());

    // Fresh check while signed out: protected routes redirect, login is open.
    assert_eq!(
        guard.can_activate(Route::TaskList).await,
        GuardDecision::RedirectToLogin
    );
    assert_eq!(
        guard.can_activate(Route::Tasks).await,
        GuardDecision::RedirectToLogin
    );
    assert_eq!(guard.can_activate(Route::Login).await, GuardDecision::Allow);

    identity.sign_in("a@b.com", "Abcdef12").await.unwrap();
    assert_eq!(guard.can_activate(Route::Tasks).await, GuardDecision::Allow);

    // The guard re-checks every time; signing out flips it back.
    identity.sign_out().await.unwrap();
    assert_eq!(
        guard.can_activate(Route::Tasks).await,
        GuardDecision::RedirectToLogin
    );
}

#[tokio::test]
async fn sign_out_clears_both_session_cells() {
    let identity = client_with(StubProvider::new().with_user("a@b.com", "Abcdef12", true));
    identity.sign_in("a@b.com", "Abcdef12").await.unwrap();
    assert!(identity.session().authenticated());
    assert!(identity.session().current_user().is_some());

    identity.sign_out().await.unwrap();
    assert!(!identity.session().authenticated());
    assert!(identity.session().current_user().is_none());
}

#[tokio::test]
async fn current_user_lookup_failure_clears_the_cell_without_erroring() {
    let identity = client_with(StubProvider::new());
    identity
        .session()
        .set_current_user(Some(taskdeck::models::AuthUser {
            username: "stale@b.com".to_string(),
            user_id: "stale".to_string(),
            sign_in_details: None,
        }));

    assert_eq!(identity.current_user().await, None);
    assert_eq!(identity.session().current_user(), None);
}

#[tokio::test]
async fn access_token_requires_a_session() {
    let identity = client_with(StubProvider::new().with_user("a@b.com", "Abcdef12", true));
    assert_eq!(
        identity.access_token().await,
        Err(AuthError::NotAuthenticated)
    );

    identity.sign_in("a@b.com", "Abcdef12").await.unwrap();
    assert_eq!(
        identity.access_token().await.unwrap(),
        "stub-token-a@b.com"
    );
}

#[tokio::test]
async fn password_reset_round_trip() {
    let identity = client_with(StubProvider::new().with_user("a@b.com", "OldPass12", true));

    let outcome = identity.reset_password("a@b.com").await.unwrap();
    assert_eq!(outcome.message, "Password reset code sent to your email.");

    identity
        .confirm_reset_password("a@b.com", "654321", "NewPass12")
        .await
        .unwrap();

    // Old password no longer works, the new one does.
    assert!(identity.sign_in("a@b.com", "OldPass12").await.is_err());
    assert!(
        identity
            .sign_in("a@b.com", "NewPass12")
            .await
            .unwrap()
            .is_signed_in
    );
}

#[tokio::test]
async fn watch_subscriber_observes_sign_in() {
    let identity = client_with(StubProvider::new().with_user("a@b.com", "Abcdef12", true));
    let mut authenticated = identity.session().watch_authenticated();
    assert!(!*authenticated.borrow());

    identity.sign_in("a@b.com", "Abcdef12").await.unwrap();
    authenticated.changed().await.unwrap();
    assert!(*authenticated.borrow());
}
