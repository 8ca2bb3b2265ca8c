use std::sync::Arc;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tracing::debug;

use crate::{Callback, HttpRequest, RawResponse, TransportError, WebSocketHandle, WebSocketListener, websocket};

/// A shareable transport that performs the actual network I/O.
///
/// Instances are expensive to build and are cached one per factory type by
/// the dispatch engine, so implementations must be safe to use concurrently.
#[async_trait]
pub trait TransportClient: Send + Sync + 'static {
    /// Performs one round-trip and returns the raw response.
    async fn execute(&self, request: HttpRequest) -> Result<RawResponse, TransportError>;

    /// Runs the round-trip in the background and reports to `callback`.
    ///
    /// Returns as soon as the call is scheduled. The callback is invoked from a
    /// runtime worker task; no ordering is guaranteed across calls.
    fn enqueue(self: Arc<Self>, request: HttpRequest, callback: Arc<dyn Callback>) -> Result<(), TransportError> {
        let handle = Handle::try_current().map_err(|_| TransportError::NoRuntime { operation: "enqueue" })?;
        debug!(verb = %request.verb, url = %request.url, "enqueue request");
        handle.spawn(async move {
            match self.execute(request).await {
                Ok(response) => callback.on_response(response).await,
                Err(error) => callback.on_failure(error).await,
            }
        });
        Ok(())
    }

    /// Opens a WebSocket connection in the background.
    ///
    /// The handle is returned immediately; connection events are delivered to
    /// `listener` from a runtime task.
    fn open_websocket(&self, url: &str, listener: Arc<dyn WebSocketListener>) -> Result<WebSocketHandle, TransportError> {
        websocket::connect(url, listener)
    }
}

/// Produces configured transport clients.
///
/// The engine calls [`TransportClientFactory::build_client`] at most once per
/// factory type and shares the result for the process lifetime.
pub trait TransportClientFactory: Send + Sync + 'static {
    fn build_client(&self) -> Result<Arc<dyn TransportClient>, TransportError>;
}
