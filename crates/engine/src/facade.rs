//! Direct requests without a declared interface.
//!
//! [`Requests`] runs ad-hoc calls through the same verb executors, strategy
//! override and registries that declared methods use.

use std::sync::Arc;

use courier_api::{Callback, ProgressListener, TransportClientFactory, WebSocketHandle, WebSocketListener};
use courier_types::{FilePart, Verb};
use indexmap::IndexMap;
use serde_json::Value;

use crate::{
    DispatchError,
    classify::{RequestAssembly, Sinks},
    dispatcher::Registries,
    executor::{CallContext, DispatchOutput, executor_for},
    registry::ClientFactoryRef,
    strategy::BodyStrategyRef,
};

/// Headers, fields, files and sinks of one direct request.
#[derive(Default)]
pub struct RequestParts {
    headers: IndexMap<String, String>,
    fields: IndexMap<String, Value>,
    files: IndexMap<String, Vec<FilePart>>,
    progress: Option<Arc<dyn ProgressListener>>,
    callback: Option<Arc<dyn Callback>>,
    strategy: BodyStrategyRef,
    client: ClientFactoryRef,
}

impl RequestParts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Adds `file` under `key`; repeated keys accumulate a file list.
    pub fn file(mut self, key: impl Into<String>, file: FilePart) -> Self {
        self.files.entry(key.into()).or_default().push(file);
        self
    }

    pub fn progress(mut self, listener: Arc<dyn ProgressListener>) -> Self {
        self.progress = Some(listener);
        self
    }

    /// Enqueues the request and reports to `callback` instead of waiting.
    pub fn callback(mut self, callback: Arc<dyn Callback>) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn strategy(mut self, strategy: BodyStrategyRef) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn client<F: TransportClientFactory + Default>(mut self) -> Self {
        self.client = ClientFactoryRef::of::<F>();
        self
    }
}

/// Entry point for direct requests, obtained from [`crate::Dispatcher::requests`].
#[derive(Clone, Debug)]
pub struct Requests {
    registries: Arc<Registries>,
}

impl Requests {
    pub fn new(registries: Arc<Registries>) -> Self {
        Self { registries }
    }

    pub async fn get(&self, url: &str, parts: RequestParts) -> Result<DispatchOutput, DispatchError> {
        self.request(Verb::Get, url, parts).await
    }

    pub async fn head(&self, url: &str, parts: RequestParts) -> Result<DispatchOutput, DispatchError> {
        self.request(Verb::Head, url, parts).await
    }

    pub async fn post(&self, url: &str, parts: RequestParts) -> Result<DispatchOutput, DispatchError> {
        self.request(Verb::Post, url, parts).await
    }

    pub async fn put(&self, url: &str, parts: RequestParts) -> Result<DispatchOutput, DispatchError> {
        self.request(Verb::Put, url, parts).await
    }

    pub async fn patch(&self, url: &str, parts: RequestParts) -> Result<DispatchOutput, DispatchError> {
        self.request(Verb::Patch, url, parts).await
    }

    pub async fn delete(&self, url: &str, parts: RequestParts) -> Result<DispatchOutput, DispatchError> {
        self.request(Verb::Delete, url, parts).await
    }

    /// Opens a WebSocket connection to `url`.
    pub async fn websocket(
        &self,
        url: &str,
        listener: Arc<dyn WebSocketListener>,
    ) -> Result<WebSocketHandle, DispatchError> {
        self.websocket_with(url, RequestParts::default(), listener).await
    }

    pub async fn websocket_with(
        &self,
        url: &str,
        mut parts: RequestParts,
        listener: Arc<dyn WebSocketListener>,
    ) -> Result<WebSocketHandle, DispatchError> {
        parts.callback = None;
        match self.dispatch(Verb::WebSocket, url, parts, Some(listener)).await? {
            DispatchOutput::WebSocket(handle) => Ok(handle),
            other => Err(DispatchError::ReturnTypeMismatch {
                method: Verb::WebSocket.to_string(),
                declared: "websocket",
                actual: other.kind(),
            }),
        }
    }

    /// Sends a request with a verb chosen at runtime.
    ///
    /// WebSocket calls need a listener and fail here; use [`Requests::websocket`].
    pub async fn request(&self, verb: Verb, url: &str, parts: RequestParts) -> Result<DispatchOutput, DispatchError> {
        self.dispatch(verb, url, parts, None).await
    }

    async fn dispatch(
        &self,
        verb: Verb,
        url: &str,
        parts: RequestParts,
        websocket_listener: Option<Arc<dyn WebSocketListener>>,
    ) -> Result<DispatchOutput, DispatchError> {
        let client = self.registries.clients().client_for(&parts.client)?;
        let mut assembly = RequestAssembly {
            headers: parts.headers,
            fields: parts.fields,
            files: parts.files,
            sinks: Sinks {
                callback: parts.callback,
                progress: parts.progress,
                response_handler: None,
                websocket_listener,
            },
            ..RequestAssembly::default()
        };
        let call = CallContext {
            method: verb.as_str(),
            verb,
            url_template: url,
            client: &client,
            strategy: parts.strategy,
            strategy_instance: None,
            strategies: self.registries.strategies(),
        };
        executor_for(verb).execute(call, &mut assembly).await
    }
}
