//! Core HTTP plumbing, authentication and the public student view.

use std::time::Duration;

use quizdesk_core::{Config, LoginRequest, LoginResponse, OkResponse, WorkDetail};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::{ClientError, Result};

/// Extracts the message shown to the administrator for a failed request.
///
/// Uses the JSON `detail` field when present, the raw body otherwise, and
/// falls back to `Ошибка <status>` for an empty body.
#[must_use]
pub fn error_detail(status: u16, body: &str) -> String {
    let detail = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => match map.get("detail") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => body.to_string(),
            Some(other) => other.to_string(),
        },
        _ => body.to_string(),
    };
    if detail.trim().is_empty() {
        format!("Ошибка {status}")
    } else {
        detail
    }
}

/// Client for the admin REST API.
///
/// Paths passed to the endpoint methods are relative to the configured base
/// URL. Authenticated calls send `Authorization: Bearer <token>`.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client without a token.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Network)?;
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base_url,
            token: None,
        })
    }

    /// Creates a client from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.base_url(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Attaches a bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Replaces or removes the bearer token.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Current bearer token.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Request that carries the token when one is set.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Request that requires a token.
    pub(crate) fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        if self.token.is_none() {
            return Err(ClientError::Unauthorized);
        }
        Ok(self.request(method, path))
    }

    /// Turns a non-success response into an error.
    ///
    /// A 401 on an authenticated call means the token was rejected.
    pub(crate) async fn check(response: Response, authenticated: bool) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if authenticated && status == StatusCode::UNAUTHORIZED {
            warn!("Token rejected by backend");
            return Err(ClientError::Unauthorized);
        }
        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(status.as_u16(), &body);
        debug!(status = status.as_u16(), %detail, "Request failed");
        Err(ClientError::http(status.as_u16(), detail))
    }

    /// Sends a request and decodes a JSON body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        builder: RequestBuilder,
        authenticated: bool,
    ) -> Result<T> {
        let response = builder.send().await?;
        let response = Self::check(response, authenticated).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Sends a request and returns the raw body.
    pub(crate) async fn send_bytes(builder: RequestBuilder) -> Result<Vec<u8>> {
        let response = builder.send().await?;
        let response = Self::check(response, true).await?;
        Ok(response.bytes().await?.to_vec())
    }

    // ========================================================================
    // Auth
    // ========================================================================

    /// Exchanges the admin password for a bearer token.
    ///
    /// The token is also stored on this client.
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, password: &str) -> Result<String> {
        let builder = self.request(Method::POST, "/auth/login").json(&LoginRequest {
            password: password.to_string(),
        });
        let response: LoginResponse = Self::send_json(builder, false).await?;
        self.token = Some(response.token.clone());
        debug!("Logged in");
        Ok(response.token)
    }

    /// Checks that the stored token is still accepted.
    #[instrument(skip(self))]
    pub async fn verify(&self) -> Result<bool> {
        let builder = self.authed(Method::GET, "/auth/verify")?;
        let response: OkResponse = Self::send_json(builder, true).await?;
        Ok(response.ok)
    }

    /// Asks the backend to send a password recovery message.
    #[instrument(skip(self))]
    pub async fn recover_password(&self) -> Result<bool> {
        let builder = self.request(Method::POST, "/auth/recover-password");
        let response: OkResponse = Self::send_json(builder, false).await?;
        Ok(response.ok)
    }

    // ========================================================================
    // Public
    // ========================================================================

    /// Fetches a completed work by its share token. No login is needed.
    #[instrument(skip(self, share_token))]
    pub async fn work_stats(&self, share_token: &str) -> Result<WorkDetail> {
        let builder = self
            .http
            .get(self.url("/student/work-stats"))
            .query(&[("token", share_token)]);
        Self::send_json(builder, false).await
    }
}
