//! Runtime argument values passed to an invocation.

use std::{any::TypeId, fmt, sync::Arc};

use courier_api::{Callback, ProgressListener, WebSocketListener};
use courier_types::{FilePart, ObjectSchema};
use dashmap::DashMap;
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::ResponseHandler;

/// A struct that can be flattened into request parts.
///
/// `schema` describes the fields once per type; `field_values` returns the
/// current values in the same order.
///
/// ```ignore
/// struct Paging { page: u32, token: String }
///
/// impl PlainObject for Paging {
///     fn schema() -> ObjectSchema {
///         ObjectSchema::new("Paging")
///             .with_field(FieldDescriptor::new("page", ParamType::Scalar(ScalarKind::Int)))
///             .with_field(FieldDescriptor::new("token", ParamType::STRING).header("X-Token"))
///     }
///
///     fn field_values(&self) -> Vec<Argument> {
///         vec![self.page.into(), self.token.clone().into()]
///     }
/// }
/// ```
pub trait PlainObject: 'static {
    fn schema() -> ObjectSchema
    where
        Self: Sized;

    fn field_values(&self) -> Vec<Argument>;
}

/// A flattened plain object: its type identity, schema source and values.
#[derive(Clone)]
pub struct ObjectArgument {
    pub(crate) type_id: TypeId,
    pub(crate) schema: fn() -> ObjectSchema,
    pub(crate) values: Vec<Argument>,
}

impl ObjectArgument {
    pub fn of<T: PlainObject>(value: &T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            schema: T::schema,
            values: value.field_values(),
        }
    }
}

/// One argument of an invocation, in declaration order.
#[derive(Clone, Default)]
pub enum Argument {
    #[default]
    Null,
    Json(Value),
    File(FilePart),
    Files(Vec<FilePart>),
    Map(IndexMap<String, Argument>),
    Object(ObjectArgument),
    Callback(Arc<dyn Callback>),
    Progress(Arc<dyn ProgressListener>),
    ResponseHandler(Arc<dyn ResponseHandler>),
    WebSocketListener(Arc<dyn WebSocketListener>),
}

impl Argument {
    pub fn object<T: PlainObject>(value: &T) -> Self {
        Argument::Object(ObjectArgument::of(value))
    }

    pub fn callback(callback: impl Callback + 'static) -> Self {
        Argument::Callback(Arc::new(callback))
    }

    pub fn progress(listener: impl ProgressListener + 'static) -> Self {
        Argument::Progress(Arc::new(listener))
    }

    pub fn response_handler(handler: impl ResponseHandler + 'static) -> Self {
        Argument::ResponseHandler(Arc::new(handler))
    }

    pub fn websocket_listener(listener: impl WebSocketListener + 'static) -> Self {
        Argument::WebSocketListener(Arc::new(listener))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Argument::Null | Argument::Json(Value::Null))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Argument::Json(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// JSON view of a data argument; `None` for sinks.
    ///
    /// Files collapse to their file names and objects to a map of field
    /// names, which is what a header or nested field can carry.
    pub fn to_json(&self, schemas: &SchemaCache) -> Option<Value> {
        match self {
            Argument::Null => Some(Value::Null),
            Argument::Json(value) => Some(value.clone()),
            Argument::File(file) => Some(Value::String(file.file_name.clone())),
            Argument::Files(files) => Some(Value::Array(
                files.iter().map(|f| Value::String(f.file_name.clone())).collect(),
            )),
            Argument::Map(entries) => Some(Value::Object(
                entries
                    .iter()
                    .filter_map(|(k, v)| v.to_json(schemas).map(|v| (k.clone(), v)))
                    .collect::<Map<String, Value>>(),
            )),
            Argument::Object(object) => {
                let schema = schemas.resolve(object);
                Some(Value::Object(
                    schema
                        .fields
                        .iter()
                        .zip(&object.values)
                        .filter_map(|(field, v)| v.to_json(schemas).map(|v| (field.name.clone(), v)))
                        .collect::<Map<String, Value>>(),
                ))
            }
            Argument::Callback(_)
            | Argument::Progress(_)
            | Argument::ResponseHandler(_)
            | Argument::WebSocketListener(_) => None,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Argument::Null => "null",
            Argument::Json(_) => "json",
            Argument::File(_) => "file",
            Argument::Files(_) => "file list",
            Argument::Map(_) => "map",
            Argument::Object(_) => "object",
            Argument::Callback(_) => "callback",
            Argument::Progress(_) => "progress listener",
            Argument::ResponseHandler(_) => "response handler",
            Argument::WebSocketListener(_) => "websocket listener",
        }
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Json(value) => write!(f, "Json({})", value),
            Argument::File(file) => write!(f, "File({})", file.file_name),
            other => f.write_str(other.kind()),
        }
    }
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Argument::Json(value)
    }
}

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Argument::Json(Value::String(value.to_string()))
    }
}

impl From<String> for Argument {
    fn from(value: String) -> Self {
        Argument::Json(Value::String(value))
    }
}

macro_rules! json_argument_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Argument {
            fn from(value: $ty) -> Self {
                Argument::Json(Value::from(value))
            }
        })*
    };
}

json_argument_from!(bool, i32, i64, u32, u64, f64);

impl From<FilePart> for Argument {
    fn from(value: FilePart) -> Self {
        Argument::File(value)
    }
}

impl From<Vec<FilePart>> for Argument {
    fn from(value: Vec<FilePart>) -> Self {
        Argument::Files(value)
    }
}

impl<T: Into<Argument>> From<Option<T>> for Argument {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Argument::Null)
    }
}

/// Schemas of plain-object types, resolved once per type.
#[derive(Default)]
pub struct SchemaCache {
    schemas: DashMap<TypeId, Arc<ObjectSchema>>,
}

impl SchemaCache {
    pub fn resolve(&self, object: &ObjectArgument) -> Arc<ObjectSchema> {
        if let Some(schema) = self.schemas.get(&object.type_id) {
            return Arc::clone(schema.value());
        }
        Arc::clone(
            self.schemas
                .entry(object.type_id)
                .or_insert_with(|| Arc::new((object.schema)()))
                .value(),
        )
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
