use async_trait::async_trait;
use serde_json::Value;

use super::ApiError;
use crate::models::{SignInData, SignInResponse, SignUpData};

/// The two auth endpoints the session controller drives.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// `POST /auth/signin`.
    async fn sign_in(&self, data: &SignInData) -> Result<SignInResponse, ApiError>;

    /// `POST /auth/signup`. The success payload is passed through untouched.
    async fn sign_up(&self, data: &SignUpData) -> Result<Value, ApiError>;
}
