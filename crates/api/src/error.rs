use thiserror::Error;

/// Failures raised by a transport client.
///
/// The dispatch engine propagates these unchanged to synchronous callers and
/// hands them to [`crate::Callback::on_failure`] for enqueued calls.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Client construction failed: {message}")]
    ClientBuild { message: String },

    #[error("WebSocket error: {message}")]
    WebSocket { message: String },

    #[error("Response body already closed")]
    Closed,

    #[error("No async runtime available to run {operation}")]
    NoRuntime { operation: &'static str },

    #[error("Transport error: {message}")]
    Other { message: String },
}

impl TransportError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn client_build(message: impl Into<String>) -> Self {
        Self::ClientBuild {
            message: message.into(),
        }
    }

    pub fn websocket(message: impl Into<String>) -> Self {
        Self::WebSocket {
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}
