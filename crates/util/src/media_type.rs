/// Media type used when nothing better can be guessed.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Best-guess media type for a file name, falling back to [`OCTET_STREAM`].
pub fn guess_media_type(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_raw()
        .unwrap_or(OCTET_STREAM)
        .to_string()
}
