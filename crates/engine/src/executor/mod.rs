//! Verb executors: turn an assembled call into a transport request.
//!
//! - `QueryExecutor` (GET/HEAD) serializes fields into the query string
//! - `BodyExecutor` (POST/PUT/PATCH/DELETE) encodes fields and files through a body strategy
//! - `WebSocketExecutor` opens a persistent connection
//!
//! Every executor resolves the effective URL the same way: a non-blank
//! override from classification wins over the static template, and `{name}`
//! placeholders are filled from (and consume) the body fields.

mod body;
mod query;
mod websocket;

use std::sync::Arc;

use async_trait::async_trait;
use courier_api::{Callback, HttpRequest, RawResponse, TransportClient, WebSocketHandle};
use courier_types::Verb;
use courier_util::fill_placeholders;
use tracing::debug;

use crate::{
    DispatchError,
    classify::RequestAssembly,
    registry::StrategyRegistry,
    strategy::{BodyStrategy, BodyStrategyRef},
};

pub use body::BodyExecutor;
pub use query::QueryExecutor;
pub use websocket::WebSocketExecutor;

/// What a verb executor produced.
#[derive(Debug)]
pub enum DispatchOutput {
    /// A synchronous round-trip completed.
    Response(RawResponse),
    /// A WebSocket connection is being opened.
    WebSocket(WebSocketHandle),
    /// The call was handed to the transport with a callback.
    Enqueued,
}

impl DispatchOutput {
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchOutput::Response(_) => "raw response",
            DispatchOutput::WebSocket(_) => "websocket",
            DispatchOutput::Enqueued => "enqueued call",
        }
    }
}

/// Everything an executor needs besides the assembly.
pub struct CallContext<'a> {
    pub method: &'a str,
    pub verb: Verb,
    pub url_template: &'a str,
    pub client: &'a Arc<dyn TransportClient>,
    /// Strategy configured on the verb marker, and its shared instance.
    pub strategy: BodyStrategyRef,
    pub strategy_instance: Option<&'a Arc<dyn BodyStrategy>>,
    pub strategies: &'a StrategyRegistry,
}

#[async_trait]
pub trait VerbExecutor: Send + Sync {
    async fn execute(
        &self,
        call: CallContext<'_>,
        assembly: &mut RequestAssembly,
    ) -> Result<DispatchOutput, DispatchError>;
}

static QUERY: QueryExecutor = QueryExecutor;
static BODY: BodyExecutor = BodyExecutor;
static WEBSOCKET: WebSocketExecutor = WebSocketExecutor;

/// The executor responsible for `verb`.
pub fn executor_for(verb: Verb) -> &'static dyn VerbExecutor {
    if verb == Verb::WebSocket {
        &WEBSOCKET
    } else if verb.uses_query() {
        &QUERY
    } else {
        &BODY
    }
}

/// Resolves the request URL for one call.
pub fn effective_url(method: &str, template: &str, assembly: &mut RequestAssembly) -> Result<String, DispatchError> {
    let raw = match assembly.url_override.as_deref() {
        Some(url) if !url.trim().is_empty() => url.to_string(),
        _ if !template.trim().is_empty() => template.to_string(),
        _ => return Err(DispatchError::missing_url(method)),
    };
    Ok(fill_placeholders(&raw, &mut assembly.fields))
}

/// Executes synchronously, or enqueues when a callback sink is present.
async fn send(
    client: &Arc<dyn TransportClient>,
    request: HttpRequest,
    callback: Option<Arc<dyn Callback>>,
) -> Result<DispatchOutput, DispatchError> {
    match callback {
        Some(callback) => {
            Arc::clone(client).enqueue(request, callback)?;
            Ok(DispatchOutput::Enqueued)
        }
        None => {
            debug!(verb = %request.verb, url = %request.url, "executing synchronously");
            Ok(DispatchOutput::Response(client.execute(request).await?))
        }
    }
}
