//! Declared parameter types and the predicates that classify them.

use std::fmt;

/// Scalar kinds accepted as "simple" values.
///
/// Booleans count as scalars here, so an unmarked `bool` parameter is
/// rejected the same way an unmarked `int` is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Char,
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl ScalarKind {
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::String => "String",
            ScalarKind::Char => "char",
            ScalarKind::Bool => "boolean",
            ScalarKind::Byte => "byte",
            ScalarKind::Short => "short",
            ScalarKind::Int => "int",
            ScalarKind::Long => "long",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
        }
    }
}

/// The four sink capabilities recognized by declared type alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
    Callback,
    Progress,
    ResponseHandler,
    WebSocketListener,
}

/// Declared type of a method parameter or of a plain-object field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Scalar(ScalarKind),
    /// Array of scalars, still a simple type.
    ScalarList(ScalarKind),
    File,
    FileList,
    /// String-keyed map merged wholesale into the body fields.
    Map,
    /// Bare collection without a key; unsupported as an unmarked parameter.
    Collection,
    /// Plain object whose fields are flattened through its schema.
    Object(&'static str),
    Callback,
    ProgressListener,
    ResponseHandler,
    WebSocketListener,
}

impl ParamType {
    pub const STRING: ParamType = ParamType::Scalar(ScalarKind::String);

    /// True for scalars and arrays of scalars.
    pub fn is_scalar(self) -> bool {
        matches!(self, ParamType::Scalar(_) | ParamType::ScalarList(_))
    }

    pub fn is_string(self) -> bool {
        self == ParamType::STRING
    }

    pub fn is_file(self) -> bool {
        self == ParamType::File
    }

    pub fn is_file_list(self) -> bool {
        self == ParamType::FileList
    }

    pub fn is_map(self) -> bool {
        self == ParamType::Map
    }

    pub fn is_collection(self) -> bool {
        self == ParamType::Collection
    }

    /// Returns the sink capability for sink-typed parameters.
    pub fn sink_kind(self) -> Option<SinkKind> {
        match self {
            ParamType::Callback => Some(SinkKind::Callback),
            ParamType::ProgressListener => Some(SinkKind::Progress),
            ParamType::ResponseHandler => Some(SinkKind::ResponseHandler),
            ParamType::WebSocketListener => Some(SinkKind::WebSocketListener),
            _ => None,
        }
    }

    pub fn is_sink(self) -> bool {
        self.sink_kind().is_some()
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Scalar(kind) => f.write_str(kind.name()),
            ParamType::ScalarList(kind) => write!(f, "{}[]", kind.name()),
            ParamType::File => f.write_str("File"),
            ParamType::FileList => f.write_str("File[]"),
            ParamType::Map => f.write_str("Map"),
            ParamType::Collection => f.write_str("Collection"),
            ParamType::Object(name) => f.write_str(name),
            ParamType::Callback => f.write_str("Callback"),
            ParamType::ProgressListener => f.write_str("ProgressListener"),
            ParamType::ResponseHandler => f.write_str("ResponseHandler"),
            ParamType::WebSocketListener => f.write_str("WebSocketListener"),
        }
    }
}

/// Destination category of a parameter, derived from its markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    None,
    Header,
    Field,
    Url,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_predicates() {
        assert!(ParamType::Scalar(ScalarKind::Int).is_scalar());
        assert!(ParamType::Scalar(ScalarKind::Bool).is_scalar());
        assert!(ParamType::ScalarList(ScalarKind::String).is_scalar());
        assert!(!ParamType::Object("User").is_scalar());
        assert!(!ParamType::Map.is_scalar());
        assert!(!ParamType::File.is_scalar());
        assert!(ParamType::STRING.is_string());
        assert!(!ParamType::Scalar(ScalarKind::Char).is_string());
    }

    #[test]
    fn file_predicates_do_not_overlap() {
        assert!(ParamType::File.is_file());
        assert!(!ParamType::File.is_file_list());
        assert!(ParamType::FileList.is_file_list());
        assert!(!ParamType::FileList.is_file());
    }

    #[test]
    fn only_capability_types_are_sinks() {
        assert_eq!(ParamType::Callback.sink_kind(), Some(SinkKind::Callback));
        assert_eq!(ParamType::ProgressListener.sink_kind(), Some(SinkKind::Progress));
        assert_eq!(ParamType::ResponseHandler.sink_kind(), Some(SinkKind::ResponseHandler));
        assert_eq!(ParamType::WebSocketListener.sink_kind(), Some(SinkKind::WebSocketListener));
        assert!(!ParamType::Map.is_sink());
        assert!(!ParamType::Object("Callback").is_sink());
    }

    #[test]
    fn display_names_feed_method_signatures() {
        assert_eq!(ParamType::Scalar(ScalarKind::Int).to_string(), "int");
        assert_eq!(ParamType::ScalarList(ScalarKind::Long).to_string(), "long[]");
        assert_eq!(ParamType::FileList.to_string(), "File[]");
        assert_eq!(ParamType::Object("Query").to_string(), "Query");
    }
}
