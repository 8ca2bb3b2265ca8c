//! Sink capabilities a caller hands to a call.
//!
//! Sinks are recognized by declared parameter type, never by marker. All of
//! them are invoked from transport-owned tasks, hence the `Send + Sync`
//! bounds.

use async_trait::async_trait;
use bytes::Bytes;

use crate::{RawResponse, TransportError};

/// Completion sink for enqueued (asynchronous) calls.
#[async_trait]
pub trait Callback: Send + Sync {
    async fn on_response(&self, response: RawResponse);

    async fn on_failure(&self, error: TransportError);
}

/// Upload progress sink. `total` is known before the first chunk is sent.
pub trait ProgressListener: Send + Sync {
    fn on_progress(&self, total: u64, sent: u64);
}

impl<F> ProgressListener for F
where
    F: Fn(u64, u64) + Send + Sync,
{
    fn on_progress(&self, total: u64, sent: u64) {
        self(total, sent)
    }
}

/// Event sink for an open WebSocket connection.
pub trait WebSocketListener: Send + Sync {
    fn on_open(&self) {}

    fn on_text(&self, _text: &str) {}

    fn on_binary(&self, _data: &Bytes) {}

    fn on_closed(&self, _code: u16, _reason: &str) {}

    fn on_failure(&self, _error: &TransportError) {}
}
