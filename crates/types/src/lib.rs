//! Shared type definitions for the courier declarative HTTP dispatcher.
//!
//! Everything in this crate is plain data: verbs, declared parameter types,
//! parameter roles, file parts and the schema description used to flatten
//! plain objects into request parts. The engine and transport crates build on
//! these definitions without depending on each other.

pub mod file;
pub mod param;
pub mod schema;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::FilePart;
pub use param::{ParamType, Role, ScalarKind, SinkKind};
pub use schema::{FieldDescriptor, FieldMarker, ObjectSchema};

/// Request verb declared on an interface method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    #[serde(rename = "WEBSOCKET")]
    WebSocket,
}

impl Verb {
    /// Returns true for verbs whose arguments travel in a request body.
    pub fn carries_body(self) -> bool {
        matches!(self, Verb::Post | Verb::Put | Verb::Patch | Verb::Delete)
    }

    /// Returns true for verbs whose fields are serialized into the query string.
    pub fn uses_query(self) -> bool {
        matches!(self, Verb::Get | Verb::Head)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Head => "HEAD",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::WebSocket => "WEBSOCKET",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown verb: {0}")]
pub struct ParseVerbError(String);

impl FromStr for Verb {
    type Err = ParseVerbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "WS" | "WEBSOCKET" => Ok(Self::WebSocket),
            _ => Err(ParseVerbError(s.to_string())),
        }
    }
}

/// Statically declared return shape of an interface method.
///
/// The engine coerces the transport result against this value after the
/// request completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnKind {
    /// The raw response handle is handed back untouched.
    RawResponse,
    /// The open connection handle of a WebSocket method.
    WebSocket,
    /// Nothing is returned; the response is closed.
    Unit,
    /// The response body text of a successful call.
    Text,
    /// Any other type, produced by a caller-supplied response handler.
    Custom,
}

impl ReturnKind {
    pub fn name(self) -> &'static str {
        match self {
            ReturnKind::RawResponse => "raw response",
            ReturnKind::WebSocket => "websocket",
            ReturnKind::Unit => "unit",
            ReturnKind::Text => "text",
            ReturnKind::Custom => "custom",
        }
    }
}
