//! Default transport backed by `reqwest`.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use courier_types::Verb;
use courier_util::redact_headers;
use reqwest::{
    Body, Client, Method,
    header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
};
use tracing::{debug, info, warn};

use crate::{
    ClientConfig, HttpRequest, RawResponse, ResponseBody, TransportClient, TransportClientFactory, TransportError,
    WebSocketHandle, WebSocketListener, websocket,
};

/// Factory used when a verb marker names no client factory.
///
/// Builds a [`ReqwestTransport`] from [`ClientConfig::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultClientFactory;

impl TransportClientFactory for DefaultClientFactory {
    fn build_client(&self) -> Result<Arc<dyn TransportClient>, TransportError> {
        Ok(Arc::new(ReqwestTransport::from_config(ClientConfig::load())?))
    }
}

/// Thin wrapper around a configured `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
    config: ClientConfig,
}

impl ReqwestTransport {
    pub fn from_config(config: ClientConfig) -> Result<Self, TransportError> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::client_build(format!("invalid default header name '{}': {}", name, e)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::client_build(format!("invalid value for default header '{}': {}", name, e)))?;
            default_headers.insert(header_name, header_value);
        }

        let http = Client::builder()
            .default_headers(default_headers)
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| TransportError::client_build(e.to_string()))?;

        info!(base_url = ?config.base_url, timeout_secs = config.timeout_secs, "built reqwest transport");
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

fn method_for(verb: Verb) -> Result<Method, TransportError> {
    match verb {
        Verb::Get => Ok(Method::GET),
        Verb::Head => Ok(Method::HEAD),
        Verb::Post => Ok(Method::POST),
        Verb::Put => Ok(Method::PUT),
        Verb::Patch => Ok(Method::PATCH),
        Verb::Delete => Ok(Method::DELETE),
        Verb::WebSocket => Err(TransportError::invalid_request(
            "WebSocket requests must go through open_websocket",
        )),
    }
}

#[async_trait]
impl TransportClient for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let method = method_for(request.verb)?;
        let url = self.config.resolve_url(&request.url);
        debug!(%method, %url, headers = %redact_headers(&request.headers), "executing request");

        let mut builder = self.http.request(method, &url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.header(CONTENT_TYPE, body.content_type.as_str());
            builder = if body.has_progress() {
                let length = body.content_length();
                builder
                    .header(CONTENT_LENGTH, length)
                    .body(Body::wrap_stream(body.into_progress_stream()))
            } else {
                builder.body(body.payload)
            };
        }

        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            debug!(%url, status = status.as_u16(), "request completed");
        } else {
            warn!(%url, status = status.as_u16(), "request returned non-success status");
        }
        let headers = response.headers().clone();
        let final_url = response.url().to_string();
        Ok(RawResponse::new(status, headers, final_url, Box::new(ReqwestBody(response))))
    }

    fn open_websocket(&self, url: &str, listener: Arc<dyn WebSocketListener>) -> Result<WebSocketHandle, TransportError> {
        websocket::connect(&self.config.resolve_url(url), listener)
    }
}

/// Pooled connection behind a reqwest response.
struct ReqwestBody(reqwest::Response);

#[async_trait]
impl ResponseBody for ReqwestBody {
    async fn read_all(self: Box<Self>) -> Result<Bytes, TransportError> {
        Ok(self.0.bytes().await?)
    }

    fn release(self: Box<Self>) {
        drop(self.0);
    }
}
