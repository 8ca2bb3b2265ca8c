//! Transport boundary for the courier dispatcher.
//!
//! This crate defines the narrow contract the dispatch engine consumes to
//! perform network I/O, plus a default implementation backed by `reqwest`
//! (HTTP) and `tokio-tungstenite` (WebSocket). It focuses on:
//!
//! - Plain request and response models ([`HttpRequest`], [`RawResponse`])
//! - The [`TransportClient`] and [`TransportClientFactory`] capabilities
//! - Sink capabilities a caller can pass to a call ([`Callback`],
//!   [`ProgressListener`], [`WebSocketListener`])
//! - Client configuration loaded from disk ([`ClientConfig`])
//!
//! # Example
//!
//! ```ignore
//! use courier_api::{DefaultClientFactory, HttpRequest, TransportClientFactory};
//! use courier_types::Verb;
//!
//! async fn run() -> Result<(), courier_api::TransportError> {
//!     let client = DefaultClientFactory.build_client()?;
//!     let mut response = client.execute(HttpRequest::new(Verb::Get, "http://localhost:8080/ping")).await?;
//!     println!("{}: {}", response.status(), response.text().await?);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod listener;
pub mod request;
pub mod response;
pub mod reqwest_transport;
pub mod websocket;

pub use client::{TransportClient, TransportClientFactory};
pub use config::ClientConfig;
pub use error::TransportError;
pub use listener::{Callback, ProgressListener, WebSocketListener};
pub use request::{HttpRequest, PROGRESS_CHUNK_SIZE, RequestBody};
pub use reqwest::StatusCode;
pub use reqwest::header::HeaderMap;
pub use reqwest_transport::{DefaultClientFactory, ReqwestTransport};
pub use response::{BufferedBody, RawResponse, ResponseBody};
pub use websocket::WebSocketHandle;
