//! API client for communicating with the backend REST API.
//!
//! The client owns no token. Each request asks the injected
//! `CredentialProvider` for the current credential, so whatever the session
//! store holds is what goes on the wire.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;

use super::backend::AuthBackend;
use super::error::{ApiError, Endpoint};
use crate::auth::CredentialProvider;
use crate::models::{SignInData, SignInResponse, SignUpData};

// ============================================================================
// Constants
// ============================================================================

/// Sign-in endpoint, relative to the base URL
pub const SIGN_IN_PATH: &str = "/auth/signin";

/// Sign-up endpoint, relative to the base URL
pub const SIGN_UP_PATH: &str = "/auth/signup";

/// API client bound to one base URL and one credential source.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl ApiClient {
    /// Create a client. `timeout` of `None` leaves requests unbounded.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Create a new ApiClient with another credential source, sharing the
    /// connection pool.
    pub fn with_credentials(&self, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            base_url: self.base_url.clone(),
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// The `Authorization` value the next request will carry, if any.
    pub fn authorization(&self) -> Option<String> {
        self.credentials
            .credential()
            .filter(|c| !c.as_str().is_empty())
            .map(|c| c.bearer())
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(bearer) = self.authorization() {
            let mut value = header::HeaderValue::from_str(&bearer)
                .map_err(|_| ApiError::InvalidCredential)?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Send a request and return the body text of a 2xx reply.
    async fn send<B: Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<String, ApiError> {
        let url = self.url(path);
        debug!(%method, url = %url, "Sending request");

        let mut request = self
            .client
            .request(method, &url)
            .headers(self.auth_headers()?);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            Ok(text)
        } else {
            debug!(url = %url, %status, "Request rejected");
            Err(ApiError::from_status(endpoint, status, &text))
        }
    }

    fn parse<T: DeserializeOwned>(path: &str, text: &str) -> Result<T, ApiError> {
        serde_json::from_str(text)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", path, e)))
    }

    /// Authenticated GET returning decoded JSON.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let text = self
            .send::<()>(Endpoint::Other, Method::GET, path, None)
            .await?;
        Self::parse(path, &text)
    }

    /// Authenticated POST of a JSON body returning decoded JSON.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let text = self
            .send(Endpoint::Other, Method::POST, path, Some(body))
            .await?;
        Self::parse(path, &text)
    }
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn sign_in(&self, data: &SignInData) -> Result<SignInResponse, ApiError> {
        let text = self
            .send(Endpoint::SignIn, Method::POST, SIGN_IN_PATH, Some(data))
            .await?;
        Self::parse(SIGN_IN_PATH, &text)
    }

    async fn sign_up(&self, data: &SignUpData) -> Result<Value, ApiError> {
        let text = self
            .send(Endpoint::SignUp, Method::POST, SIGN_UP_PATH, Some(data))
            .await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        // Non-JSON confirmations are passed through as a plain string
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}
