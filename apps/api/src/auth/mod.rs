//! Authentication is delegated to the hosted platform's auth REST API.
//!
//! `AppState` holds an `Arc<dyn AuthProvider>`; the default `SupabaseAuth` talks to
//! `{SUPABASE_URL}/auth/v1/*` with the anon key. Handlers never see tokens directly,
//! they take a `CurrentUser` extractor instead.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::AppError;

pub mod extractor;
pub mod handlers;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid or expired session")]
    InvalidSession,

    #[error("rejected by auth provider (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected auth provider response: {0}")]
    Unexpected(String),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidSession => AppError::Unauthorized,
            AuthError::Rejected { message, .. } => AppError::Validation(message),
            other => AppError::AuthProvider(other.to_string()),
        }
    }
}

/// Who a verified bearer token belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub auth_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignUpOutcome {
    pub email: String,
    /// `None` when the platform requires email confirmation before sign-in.
    pub session: Option<AuthSession>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn verify(&self, access_token: &str) -> Result<SessionIdentity, AuthError>;
    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, AuthError>;
    async fn sign_in(&self, request: &SignInRequest) -> Result<AuthSession, AuthError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

/// GoTrue-compatible auth client.
#[derive(Clone)]
pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    anon_key: String,
}

#[derive(Debug, Deserialize)]
struct PlatformUser {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: Value,
}

impl SupabaseAuth {
    pub fn new(base_url: String, anon_key: String) -> Result<Self, AuthError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(15)).build()?,
            base_url,
            anon_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    async fn reject(response: reqwest::Response) -> AuthError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        warn!("Auth provider returned {status}: {body}");
        AuthError::Rejected {
            status,
            message: provider_message(&body),
        }
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn verify(&self, access_token: &str) -> Result<SessionIdentity, AuthError> {
        let response = self
            .client
            .get(self.url("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(AuthError::InvalidSession)
            }
            s if !s.is_success() => return Err(Self::reject(response).await),
            _ => {}
        }

        let user: PlatformUser = response.json().await?;
        debug!("Verified session for auth user {}", user.id);
        identity_from_platform_user(user)
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, AuthError> {
        let response = self
            .client
            .post(self.url("signup"))
            .header("apikey", &self.anon_key)
            .json(&json!({
                "email": request.email,
                "password": request.password,
                "data": {
                    "first_name": request.first_name.clone().unwrap_or_default(),
                    "last_name": request.last_name.clone().unwrap_or_default(),
                }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        let body: Value = response.json().await?;
        // With auto-confirm the platform answers with a session, otherwise with the user.
        let session = if body.get("access_token").is_some() {
            Some(
                serde_json::from_value::<AuthSession>(body)
                    .map_err(|e| AuthError::Unexpected(e.to_string()))?,
            )
        } else {
            None
        };

        Ok(SignUpOutcome {
            email: request.email.clone(),
            session,
        })
    }

    async fn sign_in(&self, request: &SignInRequest) -> Result<AuthSession, AuthError> {
        let response = self
            .client
            .post(self.url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": request.email, "password": request.password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        Ok(response.json().await?)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .post(self.url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            // An already-expired session is as signed out as it gets.
            StatusCode::UNAUTHORIZED => Ok(()),
            s if s.is_success() => Ok(()),
            _ => Err(Self::reject(response).await),
        }
    }
}

fn identity_from_platform_user(user: PlatformUser) -> Result<SessionIdentity, AuthError> {
    let email = user
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AuthError::Unexpected(format!("auth user {} has no email", user.id)))?;

    let metadata_str = |key: &str| {
        user.user_metadata
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .filter(|s| !s.is_empty())
    };

    Ok(SessionIdentity {
        first_name: metadata_str("first_name"),
        last_name: metadata_str("last_name"),
        auth_id: user.id,
        email,
    })
}

/// GoTrue error bodies use `msg`, `error_description` or `message` depending on the endpoint.
fn provider_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["msg", "error_description", "message"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string())
}
