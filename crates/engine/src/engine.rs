//! The invocation engine: resolve, classify, dispatch, coerce.

use std::{
    any::{Any, type_name},
    fmt,
    sync::Arc,
};

use async_trait::async_trait;
use courier_api::{RawResponse, WebSocketHandle};
use courier_types::ReturnKind;
use courier_util::block_on_future;
use tracing::debug;

use crate::{
    Argument, DispatchError,
    classify::classify,
    declaration::{HttpInterface, MethodDeclaration, MethodKey},
    dispatcher::Registries,
    executor::DispatchOutput,
};

/// Error type a response handler may fail with.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Turns a raw response into a caller-defined value.
///
/// Required for methods declared with [`ReturnKind::Custom`]. The engine
/// closes the response after the handler returns.
#[async_trait]
pub trait ResponseHandler: Send + Sync {
    async fn handle(&self, response: &mut RawResponse) -> Result<Box<dyn Any + Send>, HandlerError>;
}

/// The coerced result of one invocation.
pub enum Returned {
    /// Unit methods, enqueued calls and methods without a verb marker.
    Nothing,
    Response(RawResponse),
    WebSocket(WebSocketHandle),
    Text(String),
    /// The value produced by a response handler.
    Custom(Box<dyn Any + Send>),
}

impl Returned {
    pub fn is_nothing(&self) -> bool {
        matches!(self, Returned::Nothing)
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Returned::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn into_response(self) -> Option<RawResponse> {
        match self {
            Returned::Response(response) => Some(response),
            _ => None,
        }
    }

    pub fn into_websocket(self) -> Option<WebSocketHandle> {
        match self {
            Returned::WebSocket(handle) => Some(handle),
            _ => None,
        }
    }

    /// Extracts a handler-produced value of type `T`.
    pub fn downcast<T: Any>(self) -> Option<T> {
        match self {
            Returned::Custom(value) => value.downcast::<T>().ok().map(|value| *value),
            _ => None,
        }
    }
}

impl fmt::Debug for Returned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Returned::Nothing => f.write_str("Nothing"),
            Returned::Response(response) => f.debug_tuple("Response").field(response).finish(),
            Returned::WebSocket(handle) => f.debug_tuple("WebSocket").field(&handle.url()).finish(),
            Returned::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Returned::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A result together with the non-fatal warnings recorded on the way.
#[derive(Debug)]
pub struct Invocation {
    pub returned: Returned,
    pub warnings: Vec<String>,
}

impl Invocation {
    fn nothing() -> Self {
        Self {
            returned: Returned::Nothing,
            warnings: Vec::new(),
        }
    }
}

/// Dispatches the declared methods of one interface type.
///
/// Cheap to clone; all caches live in the shared [`Registries`].
#[derive(Clone)]
pub struct InvocationEngine {
    interface_name: &'static str,
    methods: Arc<Vec<(MethodDeclaration, MethodKey)>>,
    registries: Arc<Registries>,
}

impl InvocationEngine {
    pub fn new<I: HttpInterface>(registries: Arc<Registries>) -> Self {
        let methods = I::declarations()
            .into_iter()
            .map(|declaration| {
                let key = MethodKey::new::<I>(&declaration);
                (declaration, key)
            })
            .collect();
        Self {
            interface_name: type_name::<I>(),
            methods: Arc::new(methods),
            registries,
        }
    }

    pub fn interface_name(&self) -> &'static str {
        self.interface_name
    }

    pub fn registries(&self) -> &Arc<Registries> {
        &self.registries
    }

    pub fn declarations(&self) -> impl Iterator<Item = &MethodDeclaration> {
        self.methods.iter().map(|(declaration, _)| declaration)
    }

    /// Picks the declaration named `method` whose arity matches, falling back
    /// to the first one with that name so the arity error names the method.
    fn lookup(&self, method: &str, arity: usize) -> Result<&(MethodDeclaration, MethodKey), DispatchError> {
        let mut named = self.methods.iter().filter(|(declaration, _)| declaration.name == method);
        let first = named.clone().next().ok_or_else(|| DispatchError::UnknownMethod {
            interface: self.interface_name,
            method: method.to_string(),
        })?;
        Ok(named.find(|(declaration, _)| declaration.params.len() == arity).unwrap_or(first))
    }

    pub async fn invoke(&self, method: &str, args: Vec<Argument>) -> Result<Returned, DispatchError> {
        self.invoke_detailed(method, args).await.map(|invocation| invocation.returned)
    }

    pub async fn invoke_detailed(&self, method: &str, args: Vec<Argument>) -> Result<Invocation, DispatchError> {
        let (declaration, key) = self.lookup(method, args.len())?;
        let registries = &self.registries;

        let Some(descriptor) =
            registries
                .descriptors()
                .resolve(key, declaration, registries.clients(), registries.strategies())?
        else {
            debug!(interface = self.interface_name, method, "no verb marker; nothing to do");
            return Ok(Invocation::nothing());
        };

        let mut assembly = classify(
            &descriptor.name,
            &descriptor.params,
            &descriptor.roles,
            &args,
            registries.schemas(),
        )?;
        if descriptor.returns == ReturnKind::Custom
            && assembly.sinks.callback.is_none()
            && assembly.sinks.response_handler.is_none()
        {
            return Err(DispatchError::MissingResponseHandler {
                method: descriptor.name.clone(),
            });
        }

        let output = descriptor.dispatch(&mut assembly, registries.strategies()).await?;
        debug!(method = %descriptor.name, output = output.kind(), "dispatched");
        let handler = assembly.sinks.response_handler.take();
        let returned = coerce(&descriptor.name, descriptor.returns, output, handler).await?;
        Ok(Invocation {
            returned,
            warnings: assembly.warnings,
        })
    }

    /// Runs [`InvocationEngine::invoke`] to completion from synchronous code.
    pub fn invoke_blocking(&self, method: &str, args: Vec<Argument>) -> Result<Returned, DispatchError> {
        block_on_future(self.invoke(method, args)).map_err(|error| DispatchError::Runtime {
            message: error.to_string(),
        })?
    }
}

impl fmt::Debug for InvocationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationEngine")
            .field("interface", &self.interface_name)
            .field("methods", &self.methods.len())
            .finish()
    }
}

/// Coerces a dispatch result into the declared return shape.
///
/// Every response that is not handed back to the caller is closed before
/// this returns, on success and on failure.
async fn coerce(
    method: &str,
    returns: ReturnKind,
    output: DispatchOutput,
    handler: Option<Arc<dyn ResponseHandler>>,
) -> Result<Returned, DispatchError> {
    let mismatch = |actual: &'static str| DispatchError::ReturnTypeMismatch {
        method: method.to_string(),
        declared: returns.name(),
        actual,
    };

    match (returns, output) {
        (ReturnKind::RawResponse, DispatchOutput::Response(response)) => Ok(Returned::Response(response)),
        (ReturnKind::WebSocket, DispatchOutput::WebSocket(handle)) => Ok(Returned::WebSocket(handle)),
        (ReturnKind::RawResponse | ReturnKind::WebSocket, other) => Err(mismatch(other.kind())),
        (_, DispatchOutput::Enqueued) => Ok(Returned::Nothing),
        (ReturnKind::Unit, DispatchOutput::Response(mut response)) => {
            response.close();
            Ok(Returned::Nothing)
        }
        (ReturnKind::Unit, DispatchOutput::WebSocket(_)) => Ok(Returned::Nothing),
        (ReturnKind::Text | ReturnKind::Custom, DispatchOutput::WebSocket(_)) => Err(mismatch("websocket")),
        (ReturnKind::Text, DispatchOutput::Response(mut response)) => {
            let result = if response.is_success() {
                response.text().await.map(Returned::Text).map_err(DispatchError::from)
            } else {
                Err(DispatchError::Status {
                    status: response.status().as_u16(),
                    message: response.status_message(),
                })
            };
            response.close();
            result
        }
        (ReturnKind::Custom, DispatchOutput::Response(mut response)) => {
            let Some(handler) = handler else {
                response.close();
                return Err(DispatchError::MissingResponseHandler {
                    method: method.to_string(),
                });
            };
            let result = handler
                .handle(&mut response)
                .await
                .map(Returned::Custom)
                .map_err(|error| DispatchError::ResponseHandler {
                    method: method.to_string(),
                    message: error.to_string(),
                });
            response.close();
            result
        }
    }
}
