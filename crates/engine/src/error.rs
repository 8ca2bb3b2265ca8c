//! Error types for declarative dispatch.

use courier_api::TransportError;
use thiserror::Error;

/// Everything that can stop an invocation.
///
/// Classification and assembly errors are raised before any network call is
/// attempted. Transport failures pass through unchanged.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("request URL must not be empty ({method})")]
    MissingUrl { method: String },

    #[error("request body cannot be empty ({method})")]
    EmptyBody { method: String },

    #[error("{method}: {role} parameter #{index} has a scalar type and needs an explicit key")]
    MissingKey {
        method: String,
        index: usize,
        role: &'static str,
    },

    #[error("{method}: scalar parameter #{index} has no role marker and no destination")]
    UnmarkedScalar { method: String, index: usize },

    #[error("{method}: declared return type {declared} does not match the call result ({actual})")]
    ReturnTypeMismatch {
        method: String,
        declared: &'static str,
        actual: &'static str,
    },

    #[error("{method}: a response handler is required for this return type")]
    MissingResponseHandler { method: String },

    #[error("{method}: a WebSocket listener is required")]
    MissingWebSocketListener { method: String },

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("failed to construct {type_name}: {reason}")]
    Construction { type_name: &'static str, reason: String },

    #[error("body encoding failed: {message}")]
    Encoding { message: String },

    #[error("no method named {method} is declared on {interface}")]
    UnknownMethod { interface: &'static str, method: String },

    #[error("{method}: expected {expected} arguments, got {actual}")]
    ArgumentCount {
        method: String,
        expected: usize,
        actual: usize,
    },

    #[error("{method}: response handler failed: {message}")]
    ResponseHandler { method: String, message: String },

    #[error("runtime error: {message}")]
    Runtime { message: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl DispatchError {
    pub fn missing_url(method: impl Into<String>) -> Self {
        Self::MissingUrl { method: method.into() }
    }

    pub fn empty_body(method: impl Into<String>) -> Self {
        Self::EmptyBody { method: method.into() }
    }

    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    pub fn construction(type_name: &'static str, reason: impl Into<String>) -> Self {
        Self::Construction {
            type_name,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(error: serde_json::Error) -> Self {
        Self::encoding(error.to_string())
    }
}
