//! WebSocket connections driven by `tokio-tungstenite`.

use std::sync::Arc;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::{runtime::Handle, sync::mpsc};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        Message,
        protocol::{CloseFrame, frame::coding::CloseCode},
    },
};
use tracing::{debug, warn};

use crate::{TransportError, WebSocketListener};

/// Close code reported when the peer closes without a status.
const NO_STATUS_RECEIVED: u16 = 1005;
/// Close code reported when the connection drops without a close frame.
const ABNORMAL_CLOSURE: u16 = 1006;

#[derive(Debug)]
enum Outgoing {
    Text(String),
    Binary(Bytes),
    Close { code: u16, reason: String },
}

/// Handle to an open (or opening) WebSocket connection.
///
/// Messages sent before the handshake completes are queued and flushed once
/// the connection is up. Dropping every handle stops outgoing traffic but
/// keeps delivering incoming frames until the peer closes.
#[derive(Debug, Clone)]
pub struct WebSocketHandle {
    url: String,
    outgoing: mpsc::UnboundedSender<Outgoing>,
}

impl WebSocketHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn send_text(&self, text: impl Into<String>) -> Result<(), TransportError> {
        self.push(Outgoing::Text(text.into()))
    }

    pub fn send_binary(&self, data: impl Into<Bytes>) -> Result<(), TransportError> {
        self.push(Outgoing::Binary(data.into()))
    }

    pub fn close(&self, code: u16, reason: impl Into<String>) -> Result<(), TransportError> {
        self.push(Outgoing::Close {
            code,
            reason: reason.into(),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.outgoing.is_closed()
    }

    fn push(&self, message: Outgoing) -> Result<(), TransportError> {
        self.outgoing
            .send(message)
            .map_err(|_| TransportError::websocket(format!("connection to {} is closed", self.url)))
    }
}

/// Starts connecting to `url` on the current runtime and returns a handle.
pub fn connect(url: &str, listener: Arc<dyn WebSocketListener>) -> Result<WebSocketHandle, TransportError> {
    let runtime = Handle::try_current().map_err(|_| TransportError::NoRuntime {
        operation: "open_websocket",
    })?;
    let (sender, receiver) = mpsc::unbounded_channel();
    runtime.spawn(run_connection(url.to_string(), listener, receiver));
    Ok(WebSocketHandle {
        url: url.to_string(),
        outgoing: sender,
    })
}

async fn run_connection(url: String, listener: Arc<dyn WebSocketListener>, mut outgoing: mpsc::UnboundedReceiver<Outgoing>) {
    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _)) => stream,
        Err(error) => {
            warn!(%url, %error, "websocket connect failed");
            listener.on_failure(&TransportError::websocket(error.to_string()));
            return;
        }
    };
    debug!(%url, "websocket open");
    listener.on_open();

    let (mut sink, mut source) = stream.split();
    let mut accepting = true;
    loop {
        tokio::select! {
            command = outgoing.recv(), if accepting => {
                let message = match command {
                    Some(Outgoing::Text(text)) => Message::Text(text.into()),
                    Some(Outgoing::Binary(data)) => Message::Binary(data),
                    Some(Outgoing::Close { code, reason }) => Message::Close(Some(CloseFrame {
                        code: CloseCode::from(code),
                        reason: reason.into(),
                    })),
                    None => {
                        accepting = false;
                        continue;
                    }
                };
                if let Err(error) = sink.send(message).await {
                    warn!(%url, %error, "websocket send failed");
                    listener.on_failure(&TransportError::websocket(error.to_string()));
                    return;
                }
            }
            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(text))) => listener.on_text(text.as_str()),
                Some(Ok(Message::Binary(data))) => listener.on_binary(&data),
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|frame| (u16::from(frame.code), frame.reason.as_str().to_string()))
                        .unwrap_or((NO_STATUS_RECEIVED, String::new()));
                    debug!(%url, code, "websocket closed by peer");
                    listener.on_closed(code, &reason);
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    warn!(%url, %error, "websocket read failed");
                    listener.on_failure(&TransportError::websocket(error.to_string()));
                    return;
                }
                None => {
                    listener.on_closed(ABNORMAL_CLOSURE, "");
                    return;
                }
            }
        }
    }
}
