use std::{fmt, io, sync::Arc};

use bytes::Bytes;
use courier_types::Verb;
use futures_util::{Stream, stream};
use indexmap::IndexMap;

use crate::ProgressListener;

/// Chunk size used when streaming a body with upload progress.
pub const PROGRESS_CHUNK_SIZE: usize = 8 * 1024;

/// A fully assembled request, ready for the transport.
#[derive(Debug)]
pub struct HttpRequest {
    pub verb: Verb,
    pub url: String,
    pub headers: IndexMap<String, String>,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    pub fn new(verb: Verb, url: impl Into<String>) -> Self {
        Self {
            verb,
            url: url.into(),
            headers: IndexMap::new(),
            body: None,
        }
    }

    pub fn with_headers(mut self, headers: IndexMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }
}

/// Encoded request body with a length known up front.
#[derive(Clone)]
pub struct RequestBody {
    pub content_type: String,
    pub payload: Bytes,
    progress: Option<Arc<dyn ProgressListener>>,
}

impl RequestBody {
    pub fn new(content_type: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            payload: payload.into(),
            progress: None,
        }
    }

    /// Decorates the body so that streaming it reports upload progress.
    pub fn with_progress(mut self, listener: Arc<dyn ProgressListener>) -> Self {
        self.progress = Some(listener);
        self
    }

    pub fn has_progress(&self) -> bool {
        self.progress.is_some()
    }

    pub fn content_length(&self) -> u64 {
        self.payload.len() as u64
    }

    /// Splits the payload into [`PROGRESS_CHUNK_SIZE`] chunks.
    ///
    /// Each chunk, as it is pulled by the transport, bumps a cumulative byte
    /// counter and reports `(total, sent)` to the progress listener, if any.
    pub fn into_progress_stream(self) -> impl Stream<Item = Result<Bytes, io::Error>> + Send + 'static {
        let total = self.content_length();
        let listener = self.progress;
        let payload = self.payload;
        let chunks: Vec<Bytes> = (0..payload.len())
            .step_by(PROGRESS_CHUNK_SIZE)
            .map(|start| payload.slice(start..(start + PROGRESS_CHUNK_SIZE).min(payload.len())))
            .collect();
        let mut sent = 0u64;
        stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            if let Some(listener) = &listener {
                listener.on_progress(total, sent);
            }
            Ok(chunk)
        }))
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBody")
            .field("content_type", &self.content_type)
            .field("content_length", &self.payload.len())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}
