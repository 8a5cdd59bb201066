//! Error taxonomy for backend calls and client-side validation.
//!
//! Two enums, matching the two places a user action can fail:
//!
//! - [`ApiError`]: the request was issued and failed (network, timeout,
//!   backend-reported, or an undecodable body).
//! - [`ValidationError`]: the action was rejected locally and no request
//!   was issued.
//!
//! Views never let either escape; they turn them into a local error field or
//! an inline transcript message. See [`ApiError::user_message`].

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API error: {status} - {}", .detail.as_deref().unwrap_or("no detail"))]
    Backend { status: u16, detail: Option<String> },
    #[error("Decode error: {0}")]
    Decode(String),
}

impl ApiError {
    /// The backend's human-readable `detail`, if the response carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Backend {
                detail: Some(detail),
                ..
            } => Some(detail.as_str()),
            _ => None,
        }
    }

    /// Text to show the user: the backend detail verbatim, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail().unwrap_or(fallback).to_string()
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Network(e) if e.is_timeout())
    }

    /// Build a backend error from a non-2xx status and its raw body.
    ///
    /// FastAPI-style bodies are `{"detail": "..."}`; validation errors use a
    /// list of objects under `detail`, in which case the first `msg` is used.
    pub(crate) fn from_body(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            detail: Option<serde_json::Value>,
        }

        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail)
            .and_then(|d| match d {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Array(items) => items
                    .first()
                    .and_then(|i| i.get("msg"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string),
                _ => None,
            })
            .filter(|s| !s.is_empty());

        ApiError::Backend { status, detail }
    }
}

/// Client-side rejections. None of these issue a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("unsupported file type '{found}' (accepted: {accepted})")]
    UnsupportedFileType { found: String, accepted: String },
    #[error("file is {size} bytes, limit is {limit}")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("not an image: {0}")]
    NotAnImage(String),
    #[error("no file selected")]
    NoFileSelected,
    #[error("question is empty")]
    EmptyQuestion,
    #[error("a question is already awaiting a response")]
    ChatBusy,
    #[error("no active document")]
    NoDocument,
}
