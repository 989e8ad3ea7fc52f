use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Sign-in rejected ({status}): {message}")]
    Authentication { status: StatusCode, message: String },

    #[error("Sign-up rejected ({status}): {message}")]
    Registration { status: StatusCode, message: String },

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Credential cannot be sent as a header")]
    InvalidCredential,
}

/// Which call a non-2xx reply belongs to, so it maps to the right variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Endpoint {
    SignIn,
    SignUp,
    Other,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Prefer a JSON `message` field when the backend sends one.
    fn message_from_body(body: &str) -> String {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or_else(|| Self::truncate_body(body))
    }

    pub(crate) fn from_status(endpoint: Endpoint, status: StatusCode, body: &str) -> Self {
        let message = Self::message_from_body(body);
        match endpoint {
            Endpoint::SignIn => ApiError::Authentication { status, message },
            Endpoint::SignUp => ApiError::Registration { status, message },
            Endpoint::Other => ApiError::Rejected { status, message },
        }
    }

    /// HTTP status of a rejected request, if the backend answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Authentication { status, .. }
            | ApiError::Registration { status, .. }
            | ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            ApiError::InvalidResponse(_) | ApiError::InvalidCredential => None,
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, ApiError::Authentication { .. })
    }

    pub fn is_registration(&self) -> bool {
        matches!(self, ApiError::Registration { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}
