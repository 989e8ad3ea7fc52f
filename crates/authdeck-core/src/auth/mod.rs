//! Session lifecycle: where the credential lives and how it changes.
//!
//! This module provides:
//! - `SessionStore`: the single bearer credential, with expiry, in a `CookieJar`
//! - `CookieJar` backends: `MemoryJar`, `FileJar`, `KeyringJar`
//! - `SessionController`: sign-in, sign-up and sign-out with their redirects
//!
//! Sessions last one hour from sign-in or until sign-out.

pub mod controller;
pub mod credentials;
pub mod jar;
pub mod session;

pub use controller::{Navigator, Route, SessionController, SessionError, SessionTimings};
pub use credentials::KeyringJar;
pub use jar::{CookieJar, FileJar, MemoryJar, StoredCookie};
pub use session::{
    AuthenticatedPolicy, Credential, CredentialProvider, SessionState, SessionStore,
    SESSION_COOKIE_NAME, SESSION_MAX_AGE_SECS,
};
