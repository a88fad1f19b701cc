//! Cognito-style identity provider over HTTP.
//!
//! Speaks the `x-amz-json-1.1` target-header protocol: every operation is a
//! POST to a single endpoint with an `X-Amz-Target` header naming the action.
//! Tokens from a successful sign-in are held in memory and optionally
//! persisted to a session file so separate CLI invocations share a session.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::models::AuthUser;

use super::{
    IdentityProvider, ProviderError, ProviderErrorCode, SignInResult, SignUpResult, SignUpStep,
};

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";

/// Tokens issued by the provider on sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// HTTP client for the hosted identity service.
pub struct CognitoProvider {
    http: reqwest::Client,
    endpoint: String,
    client_id: String,
    tokens: Mutex<Option<TokenSet>>,
    cache_path: Option<PathBuf>,
}

impl CognitoProvider {
    pub fn new(endpoint: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            client_id: client_id.into(),
            tokens: Mutex::new(None),
            cache_path: None,
        }
    }

    /// Persist tokens to `path` after sign-in and load any tokens already
    /// cached there.
    pub fn with_token_cache(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        if let Some(cached) = load_cached_tokens(&path) {
            *self.tokens.lock().unwrap() = Some(cached);
        }
        self.cache_path = Some(path);
        self
    }

    fn current_tokens(&self) -> Option<TokenSet> {
        self.tokens.lock().unwrap().clone()
    }

    fn store_tokens(&self, tokens: Option<TokenSet>) {
        *self.tokens.lock().unwrap() = tokens.clone();

        let Some(path) = &self.cache_path else {
            return;
        };
        match tokens {
            Some(tokens) => {
                if let Err(e) = save_cached_tokens(path, &tokens) {
                    tracing::warn!(error = %e, path = %path.display(), "Failed to write session cache");
                }
            }
            None => {
                // Missing file is fine; only real IO failures are worth a log line.
                if let Err(e) = std::fs::remove_file(path)
                    && e.kind() != std::io::ErrorKind::NotFound
                {
                    tracing::warn!(error = %e, path = %path.display(), "Failed to remove session cache");
                }
            }
        }
    }

    /// One provider call: POST the action body, decode JSON, turn non-2xx
    /// responses into a [`ProviderError`] from the `__type` field.
    async fn call(&self, target: &str, body: Value) -> Result<Value, ProviderError> {
        tracing::debug!(target, "identity provider call");

        let response = self
            .http
            .post(&self.endpoint)
            .header("Content-Type", "application/x-amz-json-1.1")
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{target}"))
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| ProviderError::other("RequestError", e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::other("RequestError", e.to_string()))?;
        let value: Value = serde_json::from_str(&text).unwrap_or_else(|_| json!({}));

        if status.is_success() {
            return Ok(value);
        }

        let type_name = value["__type"]
            .as_str()
            .map(|t| t.rsplit('#').next().unwrap_or(t))
            .unwrap_or("");
        let message = value["message"]
            .as_str()
            .or_else(|| value["Message"].as_str())
            .unwrap_or("")
            .to_string();

        Err(ProviderError::new(code_from_name(type_name), message))
    }

    fn access_token_for_api_calls(&self) -> Result<String, ProviderError> {
        self.current_tokens()
            .map(|t| t.access_token)
            .ok_or_else(|| {
                ProviderError::new(ProviderErrorCode::NotAuthorized, "No current session")
            })
    }
}

impl IdentityProvider for CognitoProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResult, ProviderError> {
        let body = json!({
            "ClientId": self.client_id,
            "Username": email,
            "Password": password,
            "UserAttributes": [{ "Name": "email", "Value": email }],
        });
        let response = self.call("SignUp", body).await?;

        let confirmed = response["UserConfirmed"].as_bool().unwrap_or(false);
        Ok(SignUpResult {
            is_sign_up_complete: confirmed,
            user_id: response["UserSub"].as_str().map(str::to_string),
            next_step: if confirmed {
                SignUpStep::Done
            } else {
                SignUpStep::ConfirmSignUp
            },
        })
    }

    async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<(), ProviderError> {
        let body = json!({
            "ClientId": self.client_id,
            "Username": email,
            "ConfirmationCode": code,
        });
        self.call("ConfirmSignUp", body).await?;
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResult, ProviderError> {
        let body = json!({
            "AuthFlow": "USER_PASSWORD_AUTH",
            "ClientId": self.client_id,
            "AuthParameters": { "USERNAME": email, "PASSWORD": password },
        });
        let response = self.call("InitiateAuth", body).await?;

        match response.get("AuthenticationResult") {
            Some(result) if result.is_object() => {
                let access_token = result["AccessToken"].as_str().unwrap_or("").to_string();
                if access_token.is_empty() {
                    return Err(ProviderError::other(
                        "InvalidResponse",
                        "Sign-in response carried no access token",
                    ));
                }
                self.store_tokens(Some(TokenSet {
                    access_token,
                    id_token: result["IdToken"].as_str().map(str::to_string),
                    refresh_token: result["RefreshToken"].as_str().map(str::to_string),
                }));
                Ok(SignInResult { is_signed_in: true })
            }
            // A challenge (MFA, new password) means not signed in yet.
            _ => Ok(SignInResult {
                is_signed_in: false,
            }),
        }
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        let tokens = self.current_tokens();
        self.store_tokens(None);

        if let Some(tokens) = tokens {
            self.call(
                "GlobalSignOut",
                json!({ "AccessToken": tokens.access_token }),
            )
            .await?;
        }
        Ok(())
    }

    async fn current_user(&self) -> Result<AuthUser, ProviderError> {
        let access_token = self.access_token_for_api_calls()?;
        let response = self
            .call("GetUser", json!({ "AccessToken": access_token }))
            .await?;

        let username = response["Username"].as_str().unwrap_or("").to_string();
        let mut email = None;
        let mut user_id = None;
        if let Some(attributes) = response["UserAttributes"].as_array() {
            for attribute in attributes {
                match attribute["Name"].as_str() {
                    Some("email") => email = attribute["Value"].as_str().map(str::to_string),
                    Some("sub") => user_id = attribute["Value"].as_str().map(str::to_string),
                    _ => {}
                }
            }
        }

        Ok(AuthUser {
            username: email.unwrap_or(username),
            user_id: user_id.unwrap_or_default(),
            sign_in_details: None,
        })
    }

    async fn access_token(&self) -> Result<String, ProviderError> {
        // The task API expects the identity (id) token as bearer; fall back
        // to the access token for providers that issue only one.
        let tokens = self.current_tokens().ok_or_else(|| {
            ProviderError::new(ProviderErrorCode::NotAuthorized, "No token available")
        })?;
        Ok(tokens.id_token.unwrap_or(tokens.access_token))
    }

    async fn reset_password(&self, email: &str) -> Result<(), ProviderError> {
        let body = json!({ "ClientId": self.client_id, "Username": email });
        self.call("ForgotPassword", body).await?;
        Ok(())
    }

    async fn confirm_reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), ProviderError> {
        let body = json!({
            "ClientId": self.client_id,
            "Username": email,
            "ConfirmationCode": code,
            "Password": new_password,
        });
        self.call("ConfirmForgotPassword", body).await?;
        Ok(())
    }
}

fn code_from_name(name: &str) -> ProviderErrorCode {
    match name {
        "UserNotFoundException" => ProviderErrorCode::UserNotFound,
        "NotAuthorizedException" => ProviderErrorCode::NotAuthorized,
        "UserNotConfirmedException" => ProviderErrorCode::UserNotConfirmed,
        "UsernameExistsException" => ProviderErrorCode::UsernameExists,
        "InvalidParameterException" => ProviderErrorCode::InvalidParameter,
        "CodeMismatchException" => ProviderErrorCode::CodeMismatch,
        "ExpiredCodeException" => ProviderErrorCode::ExpiredCode,
        "LimitExceededException" => ProviderErrorCode::LimitExceeded,
        other => ProviderErrorCode::Other(other.to_string()),
    }
}

fn load_cached_tokens(path: &Path) -> Option<TokenSet> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(tokens) => Some(tokens),
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "Ignoring unreadable session cache");
            None
        }
    }
}

fn save_cached_tokens(path: &Path, tokens: &TokenSet) -> anyhow::Result<()> {
    use anyhow::Context;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create session cache directory")?;
    }
    let content = toml::to_string_pretty(tokens).context("Failed to serialize session cache")?;
    std::fs::write(path, content).context("Failed to write session cache")?;
    Ok(())
}
