//! In-memory transport and sinks shared by the engine tests.

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use courier_api::{
    Callback, HeaderMap, HttpRequest, RawResponse, ResponseBody, StatusCode, TransportClient, TransportClientFactory,
    TransportError,
};
use courier_types::Verb;
use futures_util::StreamExt;
use indexmap::IndexMap;
use tokio::sync::Notify;

/// What the mock transport saw for one request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub verb: Verb,
    pub url: String,
    pub headers: IndexMap<String, String>,
    pub content_type: Option<String>,
    pub body: Bytes,
    pub has_progress: bool,
}

impl RecordedRequest {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Records requests and answers from a script (200 with an empty body when
/// the script runs dry).
#[derive(Default)]
pub struct MockTransport {
    requests: Mutex<Vec<RecordedRequest>>,
    responses: Mutex<VecDeque<(u16, String)>>,
    releases: Arc<AtomicUsize>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, status: u16, body: &str) {
        self.responses.lock().unwrap().push_back((status, body.to_string()));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of response bodies released so far.
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

struct TrackedBody {
    bytes: Bytes,
    releases: Arc<AtomicUsize>,
}

#[async_trait]
impl ResponseBody for TrackedBody {
    async fn read_all(self: Box<Self>) -> Result<Bytes, TransportError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(self.bytes)
    }

    fn release(self: Box<Self>) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TransportClient for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let (content_type, body, has_progress) = match request.body {
            Some(body) => {
                let content_type = body.content_type.clone();
                let has_progress = body.has_progress();
                let mut buffer = BytesMut::new();
                let mut chunks = body.into_progress_stream();
                while let Some(chunk) = chunks.next().await {
                    let chunk = chunk.map_err(|e| TransportError::other(e.to_string()))?;
                    buffer.extend_from_slice(&chunk);
                }
                (Some(content_type), buffer.freeze(), has_progress)
            }
            None => (None, Bytes::new(), false),
        };
        self.requests.lock().unwrap().push(RecordedRequest {
            verb: request.verb,
            url: request.url.clone(),
            headers: request.headers,
            content_type,
            body,
            has_progress,
        });

        let (status, text) = self.responses.lock().unwrap().pop_front().unwrap_or((200, String::new()));
        let status = StatusCode::from_u16(status).map_err(|e| TransportError::other(e.to_string()))?;
        Ok(RawResponse::new(
            status,
            HeaderMap::new(),
            request.url,
            Box::new(TrackedBody {
                bytes: Bytes::from(text),
                releases: Arc::clone(&self.releases),
            }),
        ))
    }
}

/// Builds a fresh, unscripted mock transport.
#[derive(Default)]
pub struct MockFactory;

impl TransportClientFactory for MockFactory {
    fn build_client(&self) -> Result<Arc<dyn TransportClient>, TransportError> {
        Ok(MockTransport::new())
    }
}

/// A factory whose construction always fails.
#[derive(Default)]
pub struct FailingFactory;

impl TransportClientFactory for FailingFactory {
    fn build_client(&self) -> Result<Arc<dyn TransportClient>, TransportError> {
        Err(TransportError::client_build("no credentials"))
    }
}

/// Collects callback events as strings.
#[derive(Default)]
pub struct RecordingCallback {
    events: Mutex<Vec<String>>,
    notify: Notify,
}

impl RecordingCallback {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Waits until at least `count` events arrived, or a second passed.
    pub async fn wait_for(&self, count: usize) -> Vec<String> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
        loop {
            let notified = self.notify.notified();
            let events = self.events();
            if events.len() >= count {
                return events;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.events();
            }
        }
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
        self.notify.notify_waiters();
    }
}

#[async_trait]
impl Callback for RecordingCallback {
    async fn on_response(&self, mut response: RawResponse) {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        self.push(format!("{} {}", status, text));
    }

    async fn on_failure(&self, error: TransportError) {
        self.push(format!("error: {}", error));
    }
}
