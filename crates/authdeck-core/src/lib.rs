//! Client-side session management for a web back-end.
//!
//! `authdeck-core` keeps one bearer credential in a durable slot, attaches it
//! to every request made through [`ApiClient`], and runs the sign-in, sign-up
//! and sign-out transitions through [`SessionController`].
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use authdeck_core::{ApiClient, MemoryJar, Route, SessionController, SessionStore, SignInData};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let store = SessionStore::new(Arc::new(MemoryJar::new()));
//! let api = ApiClient::new("http://localhost:4000", None, Arc::new(store.clone()))?;
//! let navigator = Arc::new(|route: Route| println!("-> {}", route));
//! let session = SessionController::new(api, store, navigator);
//!
//! session.sign_in(&SignInData::new("a@b.com", "secret")).await?;
//! session.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, AuthBackend, StatusCode};
pub use auth::{
    AuthenticatedPolicy, CookieJar, Credential, CredentialProvider, FileJar, KeyringJar,
    MemoryJar, Navigator, Route, SessionController, SessionError, SessionState, SessionStore,
    SessionTimings,
};
pub use config::{Config, StoreKind};
pub use models::{SignInData, SignUpData, User};
