//! Field metadata for plain-object parameters.
//!
//! A plain object describes its fields once through an [`ObjectSchema`]; the
//! engine caches the schema per type and walks it at call time to route each
//! field value into headers, body fields or the URL override.

use crate::param::ParamType;

/// Marker attached to one field of a plain object.
///
/// A blank key on `Field` or `Header` means "use the field name".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMarker {
    Unmarked,
    Field(String),
    Header(String),
    Url,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: ParamType,
    pub marker: FieldMarker,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            marker: FieldMarker::Unmarked,
        }
    }

    pub fn field(mut self, key: impl Into<String>) -> Self {
        self.marker = FieldMarker::Field(key.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>) -> Self {
        self.marker = FieldMarker::Header(key.into());
        self
    }

    pub fn url(mut self) -> Self {
        self.marker = FieldMarker::Url;
        self
    }

    /// Key the field is stored under: the marker key when non-blank, else the field name.
    pub fn effective_key(&self) -> &str {
        match &self.marker {
            FieldMarker::Field(key) | FieldMarker::Header(key) if !key.trim().is_empty() => key,
            _ => &self.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSchema {
    pub type_name: &'static str,
    pub fields: Vec<FieldDescriptor>,
}

impl ObjectSchema {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
