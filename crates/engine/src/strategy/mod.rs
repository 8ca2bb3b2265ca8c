//! Request-body strategies.
//!
//! A strategy turns the named fields and named file lists of one call into a
//! wire body. Strategies are referenced by type from verb markers and built
//! at most once per type by the [`crate::StrategyRegistry`].

mod multipart;
mod simple;

use std::{
    any::{TypeId, type_name},
    fmt,
    sync::Arc,
};

use courier_api::RequestBody;
use courier_types::FilePart;
use indexmap::IndexMap;
use serde_json::Value;

use crate::DispatchError;

pub use multipart::MultipartStrategy;
pub use simple::SimpleJsonStrategy;

/// Content type of JSON payloads and of multipart field parts.
pub const JSON_UTF8: &str = "application/json;charset=utf-8";

pub trait BodyStrategy: Send + Sync + 'static {
    /// Encodes fields and files into a body.
    ///
    /// `Ok(None)` means there is nothing to send; body-bearing verbs turn
    /// that into [`DispatchError::EmptyBody`].
    fn handle(
        &self,
        fields: &IndexMap<String, Value>,
        files: &IndexMap<String, Vec<FilePart>>,
    ) -> Result<Option<RequestBody>, DispatchError>;
}

type StrategyConstructor = fn() -> Result<Arc<dyn BodyStrategy>, DispatchError>;

/// Names a strategy type and how to build it.
#[derive(Clone, Copy)]
pub struct BodyStrategyRef {
    name: &'static str,
    type_id: TypeId,
    construct: StrategyConstructor,
}

fn construct_default<S: BodyStrategy + Default>() -> Result<Arc<dyn BodyStrategy>, DispatchError> {
    Ok(Arc::new(S::default()))
}

impl BodyStrategyRef {
    pub fn of<S: BodyStrategy + Default>() -> Self {
        Self::with_constructor::<S>(construct_default::<S>)
    }

    /// References `S` with a fallible constructor.
    pub fn with_constructor<S: BodyStrategy>(construct: StrategyConstructor) -> Self {
        Self {
            name: type_name::<S>(),
            type_id: TypeId::of::<S>(),
            construct,
        }
    }

    pub fn simple() -> Self {
        Self::of::<SimpleJsonStrategy>()
    }

    pub fn multipart() -> Self {
        Self::of::<MultipartStrategy>()
    }

    pub fn is_simple(&self) -> bool {
        self.type_id == TypeId::of::<SimpleJsonStrategy>()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub(crate) fn construct(&self) -> Result<Arc<dyn BodyStrategy>, DispatchError> {
        (self.construct)()
    }
}

impl Default for BodyStrategyRef {
    fn default() -> Self {
        Self::simple()
    }
}

impl PartialEq for BodyStrategyRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl fmt::Debug for BodyStrategyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BodyStrategyRef").field(&self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refs_compare_by_type() {
        assert_eq!(BodyStrategyRef::default(), BodyStrategyRef::simple());
        assert_ne!(BodyStrategyRef::simple(), BodyStrategyRef::multipart());
        assert!(BodyStrategyRef::simple().is_simple());
        assert!(!BodyStrategyRef::multipart().is_simple());
        assert!(BodyStrategyRef::multipart().name().ends_with("MultipartStrategy"));
    }
}
