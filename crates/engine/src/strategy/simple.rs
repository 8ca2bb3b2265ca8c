use courier_api::RequestBody;
use courier_types::FilePart;
use indexmap::IndexMap;
use serde_json::Value;

use super::{BodyStrategy, JSON_UTF8};
use crate::DispatchError;

/// Encodes the field map as one JSON object.
///
/// Fails when there are no fields (a body-bearing call must carry a body)
/// and when files are present (JSON cannot carry them).
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleJsonStrategy;

impl BodyStrategy for SimpleJsonStrategy {
    fn handle(
        &self,
        fields: &IndexMap<String, Value>,
        files: &IndexMap<String, Vec<FilePart>>,
    ) -> Result<Option<RequestBody>, DispatchError> {
        if !files.is_empty() {
            return Err(DispatchError::encoding("the JSON body strategy cannot encode files"));
        }
        if fields.is_empty() {
            return Err(DispatchError::empty_body(""));
        }
        let payload = serde_json::to_vec(fields)?;
        Ok(Some(RequestBody::new(JSON_UTF8, payload)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encodes_fields_in_insertion_order() {
        let mut fields = IndexMap::new();
        fields.insert("id".to_string(), json!(7));
        fields.insert("name".to_string(), json!("bob"));
        let body = SimpleJsonStrategy.handle(&fields, &IndexMap::new()).unwrap().unwrap();
        assert_eq!(body.content_type, JSON_UTF8);
        assert_eq!(&body.payload[..], br#"{"id":7,"name":"bob"}"#);
    }

    #[test]
    fn single_field_encodes_exactly() {
        let mut fields = IndexMap::new();
        fields.insert("id".to_string(), json!(7));
        let body = SimpleJsonStrategy.handle(&fields, &IndexMap::new()).unwrap().unwrap();
        assert_eq!(&body.payload[..], br#"{"id":7}"#);
    }

    #[test]
    fn empty_fields_fail_loudly() {
        let err = SimpleJsonStrategy.handle(&IndexMap::new(), &IndexMap::new()).unwrap_err();
        assert!(matches!(err, DispatchError::EmptyBody { .. }));
    }

    #[test]
    fn files_are_rejected() {
        let mut fields = IndexMap::new();
        fields.insert("id".to_string(), json!(1));
        let mut files = IndexMap::new();
        files.insert("f".to_string(), vec![FilePart::from_bytes("a.txt", "x")]);
        let err = SimpleJsonStrategy.handle(&fields, &files).unwrap_err();
        assert!(matches!(err, DispatchError::Encoding { .. }));
    }
}
