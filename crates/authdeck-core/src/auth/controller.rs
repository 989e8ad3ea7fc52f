use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::session::{
    session_max_age, AuthenticatedPolicy, Credential, SessionState, SessionStore,
};
use crate::api::{ApiError, AuthBackend};
use crate::models::{SignInData, SignUpData, User};

/// Delay before redirecting to sign-in after a successful sign-up,
/// long enough for a confirmation message to be read.
pub const SIGN_UP_REDIRECT_DELAY: Duration = Duration::from_secs(3);

/// Pause between clearing the session and redirecting on sign-out.
pub const SIGN_OUT_DELAY: Duration = Duration::from_secs(2);

/// Views the controller sends the UI to after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Authenticated landing view
    Dashboard,
    SignIn,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Dashboard => "/dashboard",
            Route::SignIn => "/signin",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// The router. Navigation is fire-and-forget.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

impl<F> Navigator for F
where
    F: Fn(Route) + Send + Sync,
{
    fn navigate(&self, route: Route) {
        self(route)
    }
}

/// UX pacing around transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    pub sign_up_redirect: Duration,
    pub sign_out_delay: Duration,
}

impl SessionTimings {
    /// No pacing at all; transitions navigate as soon as they finish.
    pub fn immediate() -> Self {
        Self {
            sign_up_redirect: Duration::ZERO,
            sign_out_delay: Duration::ZERO,
        }
    }
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            sign_up_redirect: SIGN_UP_REDIRECT_DELAY,
            sign_out_delay: SIGN_OUT_DELAY,
        }
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to persist session: {0:#}")]
    Storage(anyhow::Error),
}

impl SessionError {
    pub fn is_authentication(&self) -> bool {
        matches!(self, SessionError::Api(e) if e.is_authentication())
    }

    pub fn is_registration(&self) -> bool {
        matches!(self, SessionError::Api(e) if e.is_registration())
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, SessionError::Api(e) if e.is_transport())
    }
}

/// Drives sign-in, sign-up and sign-out and their side effects.
///
/// Built once with everything it touches and handed to whatever needs the
/// session. Nothing cancels the redirect scheduled by
/// [`sign_up`](Self::sign_up) except dropping the controller: pending
/// redirects live on a `JoinSet` it owns, and dropping that set aborts them.
/// Call [`shutdown`](Self::shutdown) before dropping to let them fire.
///
/// Sign-out and the session view never touch the backend, so they are
/// available for any `B`, including `()` when no backend is configured.
pub struct SessionController<B> {
    backend: B,
    store: SessionStore,
    navigator: Arc<dyn Navigator>,
    timings: SessionTimings,
    policy: AuthenticatedPolicy,
    user: Option<User>,
    pending: Mutex<JoinSet<()>>,
}

impl<B> SessionController<B> {
    pub fn new(backend: B, store: SessionStore, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            backend,
            store,
            navigator,
            timings: SessionTimings::default(),
            policy: AuthenticatedPolicy::default(),
            user: None,
            pending: Mutex::new(JoinSet::new()),
        }
    }

    pub fn with_timings(mut self, timings: SessionTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_policy(mut self, policy: AuthenticatedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn timings(&self) -> SessionTimings {
        self.timings
    }

    /// Current view of the session for the UI.
    pub fn state(&self) -> SessionState {
        SessionState {
            is_authenticated: self.policy.is_authenticated(&self.store),
            user: self.user.clone(),
        }
    }

    /// Clear the session, pause, then go to sign-in. Never fails.
    pub async fn sign_out(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear session credential");
        }
        tokio::time::sleep(self.timings.sign_out_delay).await;
        info!("Signed out");
        self.navigator.navigate(Route::SignIn);
    }

    /// Wait for every scheduled redirect to fire.
    pub async fn shutdown(&self) {
        let mut pending = std::mem::take(&mut *self.pending.lock().await);
        debug!(count = pending.len(), "Waiting for pending redirects");
        while let Some(result) = pending.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "Redirect task failed");
            }
        }
    }
}

impl<B: AuthBackend> SessionController<B> {
    /// Exchange email and password for a token, store it for the session
    /// lifetime, and go to the dashboard.
    ///
    /// Rejections come back as [`ApiError::Authentication`] and leave the
    /// store untouched. So does a token that could not be sent back, which
    /// is reported as [`ApiError::InvalidResponse`].
    pub async fn sign_in(&self, data: &SignInData) -> Result<(), SessionError> {
        let response = self.backend.sign_in(data).await.inspect_err(|e| {
            warn!(error = %e, "Sign-in failed");
        })?;

        let credential = Credential::new(response.token);
        if !credential.is_sendable() {
            warn!("Sign-in returned a token that cannot be sent as a bearer header");
            return Err(ApiError::InvalidResponse(
                "sign-in token is empty or not a valid header value".to_string(),
            )
            .into());
        }
        self.store
            .set(&credential, session_max_age())
            .map_err(SessionError::Storage)?;

        info!("Sign-in successful");
        self.navigator.navigate(Route::Dashboard);
        Ok(())
    }

    /// Register an account and return the backend's payload at once. The
    /// redirect to sign-in follows on its own after the sign-up delay.
    pub async fn sign_up(&self, data: &SignUpData) -> Result<Value, SessionError> {
        let payload = self.backend.sign_up(data).await.inspect_err(|e| {
            warn!(error = %e, "Sign-up failed");
        })?;

        info!("Sign-up successful");
        let navigator = Arc::clone(&self.navigator);
        let delay = self.timings.sign_up_redirect;

        let mut pending = self.pending.lock().await;
        while pending.try_join_next().is_some() {}
        pending.spawn(async move {
            tokio::time::sleep(delay).await;
            navigator.navigate(Route::SignIn);
        });

        Ok(payload)
    }
}
