use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Failure of a single external call (completion, speech, or storing its result).
#[derive(Debug, Error)]
pub enum CallError {
    #[error("API key not found (set OPENAI_API_KEY or pass --key)")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("authentication failed ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("rate limited ({status}): {message}")]
    RateLimited { status: u16, message: String },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("failed to build prompt: {0}")]
    Prompt(String),

    #[error("failed to store audio: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallErrorKind {
    Auth,
    Network,
    RateLimit,
    Api,
    Malformed,
    Prompt,
    Storage,
}

impl CallError {
    pub fn kind(&self) -> CallErrorKind {
        match self {
            CallError::MissingApiKey | CallError::Unauthorized { .. } => CallErrorKind::Auth,
            CallError::Http(_) => CallErrorKind::Network,
            CallError::RateLimited { .. } => CallErrorKind::RateLimit,
            CallError::Api { .. } => CallErrorKind::Api,
            CallError::MalformedResponse(_) => CallErrorKind::Malformed,
            CallError::Prompt(_) => CallErrorKind::Prompt,
            CallError::Io(_) => CallErrorKind::Storage,
        }
    }

    /// Classifies a non-success HTTP response.
    pub(crate) fn from_status(status: StatusCode, body: &str, message: String) -> Self {
        let code = status.as_u16();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return CallError::Unauthorized {
                status: code,
                message,
            };
        }
        if is_rate_limited(status, body) {
            return CallError::RateLimited {
                status: code,
                message,
            };
        }
        CallError::Api {
            status: code,
            message,
        }
    }
}

fn is_rate_limited(status: StatusCode, body: &str) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }
    let code = status.as_u16();
    if code == 529 || code == 503 {
        return true;
    }
    let lower = body.to_lowercase();
    lower.contains("rate limit")
        || lower.contains("rate_limit")
        || lower.contains("too many requests")
        || lower.contains("quota")
        || lower.contains("overloaded")
}
