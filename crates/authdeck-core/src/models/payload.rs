use serde::{Deserialize, Serialize};

/// Body of `POST /auth/signin`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SignInData {
    pub email: String,
    pub password: String,
}

impl SignInData {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Body of `POST /auth/signup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SignUpData {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignUpData {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Successful sign-in reply. Extra fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SignInResponse {
    pub token: String,
}
