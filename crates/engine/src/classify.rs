//! Parameter classification.
//!
//! Parameter markers are frozen once per method into a list of
//! [`ParameterRole`]s. At call time the concrete arguments are routed through
//! those roles into a fresh [`RequestAssembly`]: headers, body fields, files,
//! an optional URL override and the sink slots.
//!
//! Precedence for each role entry:
//! 1. sink-typed parameters fill their slot (last one wins, with a warning)
//! 2. `Url` takes a string override
//! 3. `Header` with a key stores the scalar string form
//! 4. `Header` without a key flattens a plain object into headers
//! 5. `Field` with a key stores the raw value
//! 6. `Field` without a key flattens a plain object into fields
//! 7. no marker: maps merge into fields, bare collections are skipped with a
//!    warning, plain objects flatten into fields, scalars are an error

use std::sync::Arc;

use courier_api::{Callback, ProgressListener, WebSocketListener};
use courier_types::{FieldMarker, FilePart, ParamType, Role, SinkKind};
use courier_util::{cast_string, redact_headers};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    Argument, DispatchError, ResponseHandler,
    argument::SchemaCache,
    declaration::ParamDeclaration,
};

/// Frozen destination of one parameter marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRole {
    pub index: usize,
    pub declared: ParamType,
    pub key: String,
    pub role: Role,
}

impl ParameterRole {
    fn has_key(&self) -> bool {
        !self.key.trim().is_empty()
    }
}

/// Builds the role list for a method's parameters.
///
/// Sink-typed parameters are left out; a parameter with several markers
/// yields one entry per marker and a parameter with none yields a single
/// [`Role::None`] entry.
pub fn freeze_roles(params: &[ParamDeclaration]) -> Vec<ParameterRole> {
    let mut roles = Vec::with_capacity(params.len());
    for (index, param) in params.iter().enumerate() {
        if param.ty.is_sink() {
            continue;
        }
        if param.markers.is_empty() {
            roles.push(ParameterRole {
                index,
                declared: param.ty,
                key: String::new(),
                role: Role::None,
            });
            continue;
        }
        for marker in &param.markers {
            roles.push(ParameterRole {
                index,
                declared: param.ty,
                key: marker.key().to_string(),
                role: marker.role(),
            });
        }
    }
    roles
}

/// Sink slots of one call.
#[derive(Clone, Default)]
pub struct Sinks {
    pub callback: Option<Arc<dyn Callback>>,
    pub progress: Option<Arc<dyn ProgressListener>>,
    pub response_handler: Option<Arc<dyn ResponseHandler>>,
    pub websocket_listener: Option<Arc<dyn WebSocketListener>>,
}

/// Per-call request parts. Built fresh for every invocation.
#[derive(Default)]
pub struct RequestAssembly {
    pub headers: IndexMap<String, String>,
    pub fields: IndexMap<String, Value>,
    pub files: IndexMap<String, Vec<FilePart>>,
    pub url_override: Option<String>,
    pub sinks: Sinks,
    /// Non-fatal problems met while classifying or dispatching.
    pub warnings: Vec<String>,
}

impl RequestAssembly {
    /// Records a non-fatal warning and logs it.
    pub fn warn(&mut self, method: &str, message: String) {
        warn!(method, "{}", message);
        self.warnings.push(message);
    }

    /// Number of files carried across all file fields.
    pub fn file_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }
}

enum FieldValue {
    Json(Value),
    File(FilePart),
    Files(Vec<FilePart>),
}

struct Classifier<'a> {
    method: &'a str,
    schemas: &'a SchemaCache,
    headers: IndexMap<String, String>,
    raw_fields: IndexMap<String, FieldValue>,
    url_override: Option<String>,
    sinks: Sinks,
    warnings: Vec<String>,
}

/// Routes `args` through the frozen roles of a method.
///
/// Fails before anything is sent when the argument count is wrong or when a
/// scalar parameter has no usable destination.
pub fn classify(
    method: &str,
    params: &[ParamDeclaration],
    roles: &[ParameterRole],
    args: &[Argument],
    schemas: &SchemaCache,
) -> Result<RequestAssembly, DispatchError> {
    if args.len() != params.len() {
        return Err(DispatchError::ArgumentCount {
            method: method.to_string(),
            expected: params.len(),
            actual: args.len(),
        });
    }

    let mut classifier = Classifier {
        method,
        schemas,
        headers: IndexMap::new(),
        raw_fields: IndexMap::new(),
        url_override: None,
        sinks: Sinks::default(),
        warnings: Vec::new(),
    };

    for (index, param) in params.iter().enumerate() {
        if let Some(kind) = param.ty.sink_kind()
            && !args[index].is_null()
        {
            classifier.collect_sink(index, kind, &args[index]);
        }
    }
    for role in roles {
        classifier.check_destination(role)?;
        let arg = &args[role.index];
        if arg.is_null() {
            continue;
        }
        classifier.apply_role(role, arg);
    }

    Ok(classifier.finish())
}

impl Classifier<'_> {
    fn warn(&mut self, message: String) {
        warn!(method = self.method, "{}", message);
        self.warnings.push(message);
    }

    fn collect_sink(&mut self, index: usize, kind: SinkKind, arg: &Argument) {
        let (replaced, name) = match (kind, arg) {
            (SinkKind::Callback, Argument::Callback(sink)) => {
                (self.sinks.callback.replace(Arc::clone(sink)).is_some(), "Callback")
            }
            (SinkKind::Progress, Argument::Progress(sink)) => {
                (self.sinks.progress.replace(Arc::clone(sink)).is_some(), "ProgressListener")
            }
            (SinkKind::ResponseHandler, Argument::ResponseHandler(sink)) => (
                self.sinks.response_handler.replace(Arc::clone(sink)).is_some(),
                "ResponseHandler",
            ),
            (SinkKind::WebSocketListener, Argument::WebSocketListener(sink)) => (
                self.sinks.websocket_listener.replace(Arc::clone(sink)).is_some(),
                "WebSocketListener",
            ),
            (kind, other) => {
                self.warn(format!(
                    "parameter #{} is declared as {:?} but received a {}; ignored",
                    index,
                    kind,
                    other.kind()
                ));
                return;
            }
        };
        if replaced {
            self.warn(format!("multiple {} parameters; only the last one takes effect", name));
        }
    }

    /// Scalar parameters must name their destination, whatever the argument value.
    fn check_destination(&self, role: &ParameterRole) -> Result<(), DispatchError> {
        if !role.declared.is_scalar() {
            return Ok(());
        }
        match role.role {
            Role::None => Err(DispatchError::UnmarkedScalar {
                method: self.method.to_string(),
                index: role.index,
            }),
            Role::Header if !role.has_key() => Err(DispatchError::MissingKey {
                method: self.method.to_string(),
                index: role.index,
                role: "header",
            }),
            Role::Field if !role.has_key() => Err(DispatchError::MissingKey {
                method: self.method.to_string(),
                index: role.index,
                role: "field",
            }),
            _ => Ok(()),
        }
    }

    fn apply_role(&mut self, role: &ParameterRole, arg: &Argument) {
        match role.role {
            Role::Url => {
                let what = format!("parameter #{}", role.index);
                self.set_url(role.declared, arg, &what);
            }
            Role::Header if role.has_key() => {
                let value = self.scalar_string(arg);
                self.headers.insert(role.key.clone(), value);
            }
            Role::Header => self.flatten(role.index, arg, Role::Header),
            Role::Field if role.has_key() => self.put_field(role.key.clone(), arg),
            Role::Field => self.flatten(role.index, arg, Role::Field),
            Role::None if role.declared.is_map() => self.merge_map(role.index, arg),
            Role::None if role.declared.is_collection() => self.warn(format!(
                "parameter #{} is a bare collection without a marker; unsupported and skipped",
                role.index
            )),
            Role::None if role.declared.is_file() || role.declared.is_file_list() => self.warn(format!(
                "parameter #{} is a file without a field key; skipped",
                role.index
            )),
            Role::None => self.flatten(role.index, arg, Role::Field),
        }
    }

    fn set_url(&mut self, declared: ParamType, arg: &Argument, what: &str) {
        match arg.as_str() {
            Some(url) if declared.is_string() => {
                if !url.trim().is_empty() {
                    self.url_override = Some(url.to_string());
                }
            }
            _ => self.warn(format!("{} is marked as URL but is not a String; ignored", what)),
        }
    }

    fn scalar_string(&self, arg: &Argument) -> String {
        arg.to_json(self.schemas).map(|value| cast_string(&value)).unwrap_or_default()
    }

    fn put_field(&mut self, key: String, arg: &Argument) {
        let value = match arg {
            Argument::File(file) => FieldValue::File(file.clone()),
            Argument::Files(files) => FieldValue::Files(files.clone()),
            other => match other.to_json(self.schemas) {
                Some(value) => FieldValue::Json(value),
                None => {
                    self.warn(format!("field '{}' received a {}; ignored", key, other.kind()));
                    return;
                }
            },
        };
        self.raw_fields.insert(key, value);
    }

    fn put_unmarked(&mut self, default_role: Role, key: String, value: &Argument) {
        if default_role == Role::Header {
            let text = self.scalar_string(value);
            self.headers.insert(key, text);
        } else {
            self.put_field(key, value);
        }
    }

    fn merge_map(&mut self, index: usize, arg: &Argument) {
        match arg {
            Argument::Map(entries) => {
                for (key, value) in entries {
                    if !value.is_null() {
                        self.put_field(key.clone(), value);
                    }
                }
            }
            Argument::Json(Value::Object(entries)) => {
                for (key, value) in entries {
                    if !value.is_null() {
                        self.raw_fields.insert(key.clone(), FieldValue::Json(value.clone()));
                    }
                }
            }
            Argument::Object(_) => self.flatten(index, arg, Role::Field),
            other => self.warn(format!(
                "parameter #{} is declared as a map but received a {}; ignored",
                index,
                other.kind()
            )),
        }
    }

    /// Walks one level of a plain object, map or JSON object.
    fn flatten(&mut self, index: usize, arg: &Argument, default_role: Role) {
        match arg {
            Argument::Object(object) => {
                let schema = self.schemas.resolve(object);
                if schema.len() != object.values.len() {
                    self.warn(format!(
                        "{} declares {} fields but supplied {} values",
                        schema.type_name,
                        schema.len(),
                        object.values.len()
                    ));
                }
                for (field, value) in schema.fields.iter().zip(&object.values) {
                    if value.is_null() {
                        continue;
                    }
                    match &field.marker {
                        FieldMarker::Field(_) => self.put_field(field.effective_key().to_string(), value),
                        FieldMarker::Header(_) => {
                            let text = self.scalar_string(value);
                            self.headers.insert(field.effective_key().to_string(), text);
                        }
                        FieldMarker::Url => {
                            let what = format!("field {}.{}", schema.type_name, field.name);
                            self.set_url(field.ty, value, &what);
                        }
                        FieldMarker::Unmarked => self.put_unmarked(default_role, field.name.clone(), value),
                    }
                }
            }
            Argument::Map(entries) => {
                for (key, value) in entries {
                    if !value.is_null() {
                        self.put_unmarked(default_role, key.clone(), value);
                    }
                }
            }
            Argument::Json(Value::Object(entries)) => {
                for (key, value) in entries {
                    if !value.is_null() {
                        self.put_unmarked(default_role, key.clone(), &Argument::Json(value.clone()));
                    }
                }
            }
            other => self.warn(format!(
                "parameter #{} should be a plain object but received a {}; ignored",
                index,
                other.kind()
            )),
        }
    }

    /// Moves file-valued fields into the files map.
    fn finish(self) -> RequestAssembly {
        let mut fields = IndexMap::new();
        let mut files = IndexMap::new();
        for (key, value) in self.raw_fields {
            match value {
                FieldValue::Json(value) => {
                    fields.insert(key, value);
                }
                FieldValue::File(file) => {
                    files.insert(key, vec![file]);
                }
                FieldValue::Files(list) if list.is_empty() => {}
                FieldValue::Files(list) => {
                    files.insert(key, list);
                }
            }
        }
        debug!(
            method = self.method,
            headers = %redact_headers(&self.headers),
            fields = fields.len(),
            files = files.len(),
            url_override = ?self.url_override,
            "classified arguments"
        );
        RequestAssembly {
            headers: self.headers,
            fields,
            files,
            url_override: self.url_override,
            sinks: self.sinks,
            warnings: self.warnings,
        }
    }
}
