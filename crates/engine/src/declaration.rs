//! Declarative description of an HTTP interface.
//!
//! An interface lists its methods once through [`HttpInterface::declarations`].
//! Each [`MethodDeclaration`] carries the verb marker (if any), the declared
//! parameters with their markers, and the declared return shape. The engine
//! freezes this into descriptors on first use.

use std::any::TypeId;

use courier_api::TransportClientFactory;
use courier_types::{ParamType, ReturnKind, Role, Verb};

use crate::{
    registry::ClientFactoryRef,
    strategy::{BodyStrategy, BodyStrategyRef},
};

/// A type whose methods are dispatched declaratively.
pub trait HttpInterface: Send + Sync + 'static {
    fn declarations() -> Vec<MethodDeclaration>
    where
        Self: Sized;
}

/// Verb marker on a method: the verb, its static URL template and the
/// component types supporting it.
#[derive(Debug, Clone, PartialEq)]
pub struct VerbMarker {
    pub verb: Verb,
    pub url_template: String,
    pub client_factory: ClientFactoryRef,
    pub body_strategy: BodyStrategyRef,
}

impl VerbMarker {
    pub fn new(verb: Verb, url_template: impl Into<String>) -> Self {
        Self {
            verb,
            url_template: url_template.into(),
            client_factory: ClientFactoryRef::default(),
            body_strategy: BodyStrategyRef::default(),
        }
    }

    pub fn get(url_template: impl Into<String>) -> Self {
        Self::new(Verb::Get, url_template)
    }

    pub fn head(url_template: impl Into<String>) -> Self {
        Self::new(Verb::Head, url_template)
    }

    pub fn post(url_template: impl Into<String>) -> Self {
        Self::new(Verb::Post, url_template)
    }

    pub fn put(url_template: impl Into<String>) -> Self {
        Self::new(Verb::Put, url_template)
    }

    pub fn patch(url_template: impl Into<String>) -> Self {
        Self::new(Verb::Patch, url_template)
    }

    pub fn delete(url_template: impl Into<String>) -> Self {
        Self::new(Verb::Delete, url_template)
    }

    pub fn websocket(url_template: impl Into<String>) -> Self {
        Self::new(Verb::WebSocket, url_template)
    }

    pub fn client<F: TransportClientFactory + Default>(mut self) -> Self {
        self.client_factory = ClientFactoryRef::of::<F>();
        self
    }

    pub fn strategy<S: BodyStrategy + Default>(mut self) -> Self {
        self.body_strategy = BodyStrategyRef::of::<S>();
        self
    }

    pub fn strategy_ref(mut self, strategy: BodyStrategyRef) -> Self {
        self.body_strategy = strategy;
        self
    }
}

/// Role marker on a parameter. A blank key means "no explicit key".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamMarker {
    Field(String),
    Header(String),
    Url,
}

impl ParamMarker {
    pub fn role(&self) -> Role {
        match self {
            ParamMarker::Field(_) => Role::Field,
            ParamMarker::Header(_) => Role::Header,
            ParamMarker::Url => Role::Url,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            ParamMarker::Field(key) | ParamMarker::Header(key) => key,
            ParamMarker::Url => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDeclaration {
    pub ty: ParamType,
    pub markers: Vec<ParamMarker>,
}

impl ParamDeclaration {
    pub fn new(ty: ParamType) -> Self {
        Self { ty, markers: Vec::new() }
    }

    pub fn field(mut self, key: impl Into<String>) -> Self {
        self.markers.push(ParamMarker::Field(key.into()));
        self
    }

    pub fn header(mut self, key: impl Into<String>) -> Self {
        self.markers.push(ParamMarker::Header(key.into()));
        self
    }

    pub fn url(mut self) -> Self {
        self.markers.push(ParamMarker::Url);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDeclaration {
    pub name: String,
    pub verb: Option<VerbMarker>,
    pub params: Vec<ParamDeclaration>,
    pub returns: ReturnKind,
}

impl MethodDeclaration {
    /// A method with no verb marker; invoking it is a no-op.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verb: None,
            params: Vec::new(),
            returns: ReturnKind::Unit,
        }
    }

    pub fn with_verb(name: impl Into<String>, verb: VerbMarker) -> Self {
        Self {
            verb: Some(verb),
            ..Self::new(name)
        }
    }

    pub fn param(mut self, param: ParamDeclaration) -> Self {
        self.params.push(param);
        self
    }

    pub fn returns(mut self, returns: ReturnKind) -> Self {
        self.returns = returns;
        self
    }

    /// `name(type,type,..)`, stable for a given declaration.
    pub fn signature(&self) -> String {
        let types = self.params.iter().map(|p| p.ty.to_string()).collect::<Vec<_>>();
        format!("{}({})", self.name, types.join(","))
    }
}

/// Identity of a method: its interface type plus its signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodKey {
    pub interface: TypeId,
    pub signature: String,
}

impl MethodKey {
    pub fn new<I: HttpInterface>(declaration: &MethodDeclaration) -> Self {
        Self {
            interface: TypeId::of::<I>(),
            signature: declaration.signature(),
        }
    }
}
