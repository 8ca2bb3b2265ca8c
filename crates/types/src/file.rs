use std::{fs, io, path::Path};

use bytes::Bytes;

/// An in-memory file destined for a multipart body.
///
/// The media type is optional; when absent the multipart encoder guesses it
/// from the file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub file_name: String,
    pub content: Bytes,
    pub media_type: Option<String>,
}

impl FilePart {
    pub fn from_bytes(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
            media_type: None,
        }
    }

    /// Reads a file from disk, keeping only its final path component as the name.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let content = fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::from_bytes(file_name, content))
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn from_path_uses_the_final_component_as_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avatar.png");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(b"\x89PNG").unwrap();

        let part = FilePart::from_path(&path).unwrap();
        assert_eq!(part.file_name, "avatar.png");
        assert_eq!(part.len(), 4);
        assert!(part.media_type.is_none());
    }

    #[test]
    fn from_path_reports_missing_files() {
        let err = FilePart::from_path("/definitely/not/here.bin").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
