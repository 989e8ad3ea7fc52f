use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::jar::{CookieJar, StoredCookie};
use crate::models::User;

/// Name of the cookie holding the bearer token. Every read and write of the
/// session goes through this one constant.
pub const SESSION_COOKIE_NAME: &str = "nextauth.token";

/// Session lifetime in seconds.
pub const SESSION_MAX_AGE_SECS: i64 = 60 * 60;

/// Session lifetime as a duration.
pub fn session_max_age() -> Duration {
    Duration::seconds(SESSION_MAX_AGE_SECS)
}

/// Opaque bearer token issued by the backend.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for an `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// Non-empty and legal as an `Authorization` header value.
    pub fn is_sendable(&self) -> bool {
        !self.0.is_empty() && HeaderValue::from_str(&self.bearer()).is_ok()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Source of the credential an HTTP client attaches to each request.
pub trait CredentialProvider: Send + Sync {
    fn credential(&self) -> Option<Credential>;
}

impl<F> CredentialProvider for F
where
    F: Fn() -> Option<Credential> + Send + Sync,
{
    fn credential(&self) -> Option<Credential> {
        self()
    }
}

/// Persists the single session credential in a [`CookieJar`].
#[derive(Clone)]
pub struct SessionStore {
    jar: Arc<dyn CookieJar>,
}

impl SessionStore {
    pub fn new(jar: Arc<dyn CookieJar>) -> Self {
        Self { jar }
    }

    /// Persist `credential`, replacing any existing one, expiring `max_age`
    /// from now.
    pub fn set(&self, credential: &Credential, max_age: Duration) -> Result<()> {
        debug!(max_age_secs = max_age.num_seconds(), "Storing session credential");
        self.jar.put(StoredCookie::new(
            SESSION_COOKIE_NAME,
            credential.as_str(),
            max_age,
        ))
    }

    /// The stored credential, if present and unexpired.
    pub fn get(&self) -> Result<Option<Credential>> {
        Ok(self.cookie()?.map(|c| Credential::new(c.value)))
    }

    /// The raw stored cookie, including its expiry.
    pub fn cookie(&self) -> Result<Option<StoredCookie>> {
        self.jar.fetch(SESSION_COOKIE_NAME)
    }

    /// Remove the stored credential. Removing nothing is fine.
    pub fn clear(&self) -> Result<()> {
        debug!("Clearing session credential");
        self.jar.remove(SESSION_COOKIE_NAME)
    }
}

impl CredentialProvider for SessionStore {
    fn credential(&self) -> Option<Credential> {
        match self.get() {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "Failed to read session credential");
                None
            }
        }
    }
}

/// How `is_authenticated` is computed for the consumer view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticatedPolicy {
    /// Always report authenticated, whatever the store holds.
    #[default]
    Always,
    /// Authenticated while an unexpired credential is stored.
    CredentialPresent,
}

impl AuthenticatedPolicy {
    pub fn is_authenticated(self, store: &SessionStore) -> bool {
        match self {
            AuthenticatedPolicy::Always => true,
            AuthenticatedPolicy::CredentialPresent => store.credential().is_some(),
        }
    }
}

/// What the UI sees of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub is_authenticated: bool,
    pub user: Option<User>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jar::MemoryJar;

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(MemoryJar::new()))
    }

    #[test]
    fn test_set_then_get_returns_token() {
        let store = store();
        store.set(&Credential::new("T1"), session_max_age()).unwrap();
        assert_eq!(store.get().unwrap(), Some(Credential::new("T1")));
    }

    #[test]
    fn test_set_overwrites() {
        let store = store();
        store.set(&Credential::new("T1"), session_max_age()).unwrap();
        store.set(&Credential::new("T2"), session_max_age()).unwrap();
        assert_eq!(store.get().unwrap(), Some(Credential::new("T2")));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = store();
        store.set(&Credential::new("T1"), session_max_age()).unwrap();
        store.clear().unwrap();
        assert_eq!(store.get().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_get_after_ttl_is_absent() {
        let store = store();
        store.set(&Credential::new("T1"), Duration::zero()).unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_cookie_uses_shared_name_and_max_age() {
        let store = store();
        store.set(&Credential::new("T1"), session_max_age()).unwrap();
        let cookie = store.cookie().unwrap().unwrap();
        assert_eq!(cookie.name, SESSION_COOKIE_NAME);
        let remaining = cookie.time_until_expiry().num_seconds();
        assert!((SESSION_MAX_AGE_SECS - 5..=SESSION_MAX_AGE_SECS).contains(&remaining));
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("secret-token");
        assert!(!format!("{:?}", credential).contains("secret-token"));
        assert_eq!(credential.bearer(), "Bearer secret-token");
    }

    #[test]
    fn test_credential_is_sendable() {
        assert!(Credential::new("T1").is_sendable());
        assert!(!Credential::new("").is_sendable());
        assert!(!Credential::new("bad\ntoken").is_sendable());
    }

    #[test]
    fn test_closure_provider() {
        let provider = || Some(Credential::new("T9"));
        assert_eq!(provider.credential(), Some(Credential::new("T9")));
    }

    #[test]
    fn test_policy_always_ignores_store() {
        let store = store();
        assert!(AuthenticatedPolicy::Always.is_authenticated(&store));
    }

    #[test]
    fn test_policy_credential_present_follows_store() {
        let store = store();
        assert!(!AuthenticatedPolicy::CredentialPresent.is_authenticated(&store));
        store.set(&Credential::new("T1"), session_max_age()).unwrap();
        assert!(AuthenticatedPolicy::CredentialPresent.is_authenticated(&store));
    }

    #[test]
    fn test_session_state_serializes_camel_case() {
        let state = SessionState {
            is_authenticated: true,
            user: None,
        };
        assert_eq!(
            serde_json::to_value(state).unwrap(),
            serde_json::json!({"isAuthenticated": true, "user": null})
        );
    }
}
