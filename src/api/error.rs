//! Error taxonomy for API calls and decoding of server error bodies.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// One entry of a structured validation failure (`{loc, msg}`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub loc: Vec<String>,
    pub msg: String,
}

impl FieldError {
    /// `body.email: value is not a valid email address`
    pub fn display(&self) -> String {
        format!("{}: {}", self.loc.join("."), self.msg)
    }
}

/// Errors from API Client operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The session is missing or expired. The redirect to sign-in has already
    /// been issued by the time a caller sees this.
    #[error("session expired")]
    AuthExpired,
    /// Structured validation failure; `message` joins every field error.
    #[error("{message}")]
    Validation {
        status: u16,
        message: String,
        fields: Vec<FieldError>,
    },
    /// Any other non-success status with a server-supplied message.
    #[error("{message}")]
    Request { status: u16, message: String },
    /// A non-success status whose body carried no usable message.
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },
    /// No response at all (connection refused, timeout, ...).
    #[error("could not reach server: {0}")]
    Connectivity(#[from] reqwest::Error),
    /// A success response whose body could not be decoded.
    #[error("unexpected response in {context}: {source}")]
    MalformedResponse {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("client initialization failed: {0}")]
    ClientInit(String),
}

impl ApiError {
    /// Network-level or decoding failures, where only a generic retry hint helps.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            ApiError::Connectivity(_) | ApiError::MalformedResponse { .. } | ApiError::ClientInit(_)
        )
    }

    /// HTTP status, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::AuthExpired => Some(401),
            ApiError::Validation { status, .. }
            | ApiError::Request { status, .. }
            | ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text for a user notification. `None` for a silent auth redirect.
    pub fn user_message(&self, action: &str) -> Option<String> {
        match self {
            ApiError::AuthExpired => None,
            ApiError::Validation { message, .. } | ApiError::Request { message, .. } => {
                Some(message.clone())
            }
            ApiError::Status { .. } => Some(self.to_string()),
            _ => Some(format!(
                "Failed to {}. Could not reach the server, please try again.",
                action
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Build the error for a non-success, non-401 response.
///
/// Message precedence: joined validation entries, then a string `detail`,
/// then `message`. With none of those the error is [`ApiError::Status`].
pub fn decode_error_body(status: u16, reason: &str, body: &str) -> ApiError {
    let request = |message: Option<String>| match message.filter(|m| !m.is_empty()) {
        Some(message) => ApiError::Request { status, message },
        None => ApiError::Status {
            status,
            reason: reason.to_string(),
        },
    };
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        return request(None);
    };

    match parsed.detail {
        Some(Value::Array(entries)) => {
            let fields: Vec<FieldError> = entries.iter().filter_map(field_error).collect();
            if fields.is_empty() {
                return request(parsed.message);
            }
            let message = fields
                .iter()
                .map(FieldError::display)
                .collect::<Vec<_>>()
                .join(", ");
            ApiError::Validation {
                status,
                message,
                fields,
            }
        }
        Some(Value::String(detail)) if !detail.is_empty() => ApiError::Request {
            status,
            message: detail,
        },
        _ => request(parsed.message),
    }
}

fn field_error(entry: &Value) -> Option<FieldError> {
    let msg = entry.get("msg")?.as_str()?.to_string();
    let loc = entry
        .get("loc")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .map(|p| match p {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();
    Some(FieldError { loc, msg })
}
