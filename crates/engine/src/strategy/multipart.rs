use bytes::{BufMut, BytesMut};
use courier_api::RequestBody;
use courier_types::FilePart;
use courier_util::guess_media_type;
use indexmap::IndexMap;
use serde_json::Value;
use uuid::Uuid;

use super::{BodyStrategy, JSON_UTF8};
use crate::DispatchError;

/// Encodes fields and files as `multipart/form-data`.
///
/// Every field becomes one part typed as JSON (strings are written verbatim,
/// other values as JSON text). Every file becomes one part carrying its file
/// name and media type; a file list yields one part per file under the same
/// name.
#[derive(Debug, Default, Clone, Copy)]
pub struct MultipartStrategy;

impl MultipartStrategy {
    fn part_header(out: &mut BytesMut, boundary: &str, name: &str, file_name: &str, media_type: &str) {
        out.put_slice(b"--");
        out.put_slice(boundary.as_bytes());
        out.put_slice(b"\r\n");
        out.put_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                escape_quoted(name),
                escape_quoted(file_name)
            )
            .as_bytes(),
        );
        out.put_slice(format!("Content-Type: {}\r\n\r\n", media_type).as_bytes());
    }
}

fn escape_quoted(value: &str) -> String {
    value.replace('\r', "%0D").replace('\n', "%0A").replace('"', "%22")
}

fn field_text(value: &Value) -> Result<String, DispatchError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Ok(serde_json::to_string(other)?),
    }
}

impl BodyStrategy for MultipartStrategy {
    fn handle(
        &self,
        fields: &IndexMap<String, Value>,
        files: &IndexMap<String, Vec<FilePart>>,
    ) -> Result<Option<RequestBody>, DispatchError> {
        if fields.is_empty() && files.values().all(Vec::is_empty) {
            return Ok(None);
        }

        let boundary = format!("courier-{}", Uuid::new_v4().simple());
        let mut out = BytesMut::new();
        for (name, value) in fields {
            Self::part_header(&mut out, &boundary, name, "", JSON_UTF8);
            out.put_slice(field_text(value)?.as_bytes());
            out.put_slice(b"\r\n");
        }
        for (name, parts) in files {
            for file in parts {
                let media_type = file
                    .media_type
                    .clone()
                    .unwrap_or_else(|| guess_media_type(&file.file_name));
                Self::part_header(&mut out, &boundary, name, &file.file_name, &media_type);
                out.put_slice(&file.content);
                out.put_slice(b"\r\n");
            }
        }
        out.put_slice(b"--");
        out.put_slice(boundary.as_bytes());
        out.put_slice(b"--\r\n");

        let content_type = format!("multipart/form-data; boundary={}", boundary);
        Ok(Some(RequestBody::new(content_type, out.freeze())))
    }
}
