use async_trait::async_trait;
use tracing::debug;

use super::{CallContext, DispatchOutput, VerbExecutor, effective_url};
use crate::{DispatchError, classify::RequestAssembly};

/// Opens a WebSocket connection; headers, fields and files play no part.
pub struct WebSocketExecutor;

#[async_trait]
impl VerbExecutor for WebSocketExecutor {
    async fn execute(
        &self,
        call: CallContext<'_>,
        assembly: &mut RequestAssembly,
    ) -> Result<DispatchOutput, DispatchError> {
        let url = effective_url(call.method, call.url_template, assembly)?;
        let listener = assembly
            .sinks
            .websocket_listener
            .clone()
            .ok_or_else(|| DispatchError::MissingWebSocketListener {
                method: call.method.to_string(),
            })?;
        if !assembly.fields.is_empty() || !assembly.files.is_empty() {
            debug!(method = call.method, "fields and files are not sent over a WebSocket handshake");
        }
        let handle = call.client.open_websocket(&url, listener)?;
        debug!(method = call.method, %url, "websocket connection requested");
        Ok(DispatchOutput::WebSocket(handle))
    }
}
