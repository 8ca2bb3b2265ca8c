//! # Courier Engine
//!
//! The engine turns declared interface methods into HTTP and WebSocket calls.
//! An interface lists its methods once (verb, URL template, parameter roles,
//! return shape); on every call the engine routes the arguments into headers,
//! body fields, files and sinks, runs the verb-specific executor and coerces
//! the raw response into the declared return shape.
//!
//! ## Pipeline
//!
//! - **resolve**: the method declaration is frozen into a cached
//!   [`MethodDescriptor`] together with its transport client and body strategy
//! - **classify**: arguments are routed through the frozen parameter roles into
//!   a per-call [`RequestAssembly`]
//! - **dispatch**: the [`VerbExecutor`] for the verb builds and sends the request
//! - **coerce**: the result is matched against the declared [`ReturnKind`]
//!
//! ## Usage
//!
//! ```ignore
//! use courier_engine::{
//!     Dispatcher, HttpInterface, InvocationEngine, MethodDeclaration, ParamDeclaration, ServiceProxy,
//!     VerbMarker,
//! };
//! use courier_types::{ParamType, ReturnKind, ScalarKind};
//!
//! struct Users {
//!     engine: InvocationEngine,
//! }
//!
//! impl HttpInterface for Users {
//!     fn declarations() -> Vec<MethodDeclaration> {
//!         vec![
//!             MethodDeclaration::with_verb("find", VerbMarker::post("http://localhost:8080/users"))
//!                 .param(ParamDeclaration::new(ParamType::Scalar(ScalarKind::Int)).field("id"))
//!                 .param(ParamDeclaration::new(ParamType::STRING).header("name"))
//!                 .returns(ReturnKind::Text),
//!         ]
//!     }
//! }
//!
//! impl ServiceProxy for Users {
//!     fn from_engine(engine: InvocationEngine) -> Self {
//!         Self { engine }
//!     }
//! }
//!
//! let users = Dispatcher::global().get_instance::<Users>()?;
//! let text = users.engine.invoke("find", vec![7.into(), "bob".into()]).await?.into_text();
//! ```

pub mod argument;
pub mod classify;
pub mod declaration;
pub mod descriptor;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod executor;
pub mod facade;
pub mod registry;
pub mod strategy;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests;

pub use argument::{Argument, ObjectArgument, PlainObject, SchemaCache};
pub use classify::{ParameterRole, RequestAssembly, Sinks};
pub use courier_types::ReturnKind;
pub use declaration::{HttpInterface, MethodDeclaration, MethodKey, ParamDeclaration, ParamMarker, VerbMarker};
pub use descriptor::{DescriptorResolver, MethodDescriptor};
pub use dispatcher::{Dispatcher, Registries, ServiceProxy};
pub use engine::{HandlerError, Invocation, InvocationEngine, ResponseHandler, Returned};
pub use error::DispatchError;
pub use executor::{DispatchOutput, VerbExecutor};
pub use facade::{RequestParts, Requests};
pub use registry::{ClientFactoryRef, ClientRegistry, OnceRegistry, StrategyRegistry};
pub use strategy::{BodyStrategy, BodyStrategyRef, JSON_UTF8, MultipartStrategy, SimpleJsonStrategy};
