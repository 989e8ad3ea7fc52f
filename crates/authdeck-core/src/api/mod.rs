//! HTTP access to the backend API.
//!
//! `ApiClient` talks to one base URL and resolves the `Authorization`
//! header from its `CredentialProvider` on every request. It implements
//! `AuthBackend`, the seam the session controller is written against.

pub mod backend;
pub mod client;
pub mod error;

pub use backend::AuthBackend;
pub use client::ApiClient;
pub use error::ApiError;
pub use reqwest::StatusCode;
