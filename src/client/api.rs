use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, error};

use super::form::{FormError, LoginForm};
use crate::auth::dto::{AuthResponse, PublicUser};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] FormError),
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("An unexpected error occurred")]
    Transport(#[from] reqwest::Error),
    /// Error response whose body is not JSON at all.
    #[error("An unexpected error occurred")]
    Decode(#[source] serde_json::Error),
    #[error("token storage failed: {0}")]
    Storage(#[source] anyhow::Error),
}

/// Result of a successful `POST /api/auth`.
///
/// The server signals signup versus login only through the status code
/// (201 versus 200); both carry the same payload.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    SignedUp(AuthResponse),
    LoggedIn(AuthResponse),
}

impl AuthOutcome {
    pub fn response(&self) -> &AuthResponse {
        match self {
            AuthOutcome::SignedUp(r) | AuthOutcome::LoggedIn(r) => r,
        }
    }

    pub fn is_signup(&self) -> bool {
        matches!(self, AuthOutcome::SignedUp(_))
    }
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    http: Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Posts the form to the auth endpoint. Does not validate it first.
    pub async fn authenticate(&self, form: &LoginForm) -> Result<AuthOutcome, ClientError> {
        let response = self
            .http
            .post(self.url("/api/auth"))
            .json(&form.to_request())
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "auth request failed");
                e
            })?;

        let status = response.status();
        debug!(%status, "auth response");
        match status {
            StatusCode::CREATED => Ok(AuthOutcome::SignedUp(response.json().await?)),
            // Any other 2xx carries the same payload; only 201 means a new account.
            s if s.is_success() => Ok(AuthOutcome::LoggedIn(response.json().await?)),
            _ => Err(server_error(status, response, "An error occurred during login").await),
        }
    }

    /// Fetches the user behind `token` from `GET /api/me`, verified server-side.
    pub async fn me(&self, token: &str) -> Result<PublicUser, ClientError> {
        let response = self
            .http
            .get(self.url("/api/me"))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            Err(server_error(status, response, "Could not load the current user").await)
        }
    }
}

/// Turns a non-success response into an error. A JSON body yields its
/// `error` string (or `fallback` when absent); a body that is not JSON is
/// reported as an unexpected error.
async fn server_error(status: StatusCode, response: reqwest::Response, fallback: &str) -> ClientError {
    let body = match response.bytes().await {
        Ok(body) => body,
        Err(e) => return ClientError::Transport(e),
    };
    let value: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            error!(%status, error = %e, "error response body is not JSON");
            return ClientError::Decode(e);
        }
    };
    let message = value
        .get("error")
        .and_then(|m| m.as_str())
        .filter(|m| !m.is_empty())
        .unwrap_or(fallback)
        .to_string();
    ClientError::Server {
        status: status.as_u16(),
        message,
    }
}
