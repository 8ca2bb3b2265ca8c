use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{StatusCode, header::HeaderMap};
use tracing::debug;

use crate::TransportError;

/// The releasable resource behind a response.
///
/// Implementations hold whatever the transport needs to free once the body
/// is no longer wanted: a pooled connection, a stream, or just bytes.
/// Exactly one of `read_all` or `release` is called per body.
#[async_trait]
pub trait ResponseBody: Send {
    /// Reads the remaining body and releases the resource.
    async fn read_all(self: Box<Self>) -> Result<Bytes, TransportError>;

    /// Releases the resource without reading.
    fn release(self: Box<Self>);
}

/// A body that is already fully in memory.
pub struct BufferedBody(pub Bytes);

#[async_trait]
impl ResponseBody for BufferedBody {
    async fn read_all(self: Box<Self>) -> Result<Bytes, TransportError> {
        Ok(self.0)
    }

    fn release(self: Box<Self>) {}
}

/// Raw response handle returned by a transport client.
///
/// The underlying resource is released exactly once: by reading the body,
/// by an explicit [`RawResponse::close`], or on drop.
pub struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    url: String,
    body: Option<Box<dyn ResponseBody>>,
}

impl RawResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, url: impl Into<String>, body: Box<dyn ResponseBody>) -> Self {
        Self {
            status,
            headers,
            url: url.into(),
            body: Some(body),
        }
    }

    /// Convenience constructor for an in-memory response.
    pub fn buffered(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self::new(status, HeaderMap::new(), "", Box::new(BufferedBody(body.into())))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Reason phrase for the status, or the numeric code when none is known.
    pub fn status_message(&self) -> String {
        match self.status.canonical_reason() {
            Some(reason) => reason.to_string(),
            None => self.status.as_u16().to_string(),
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_closed(&self) -> bool {
        self.body.is_none()
    }

    /// Reads the whole body. The response is closed afterwards.
    pub async fn bytes(&mut self) -> Result<Bytes, TransportError> {
        let body = self.body.take().ok_or(TransportError::Closed)?;
        body.read_all().await
    }

    /// Reads the whole body as UTF-8 text (lossy). The response is closed afterwards.
    pub async fn text(&mut self) -> Result<String, TransportError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Releases the underlying resource. Calling it again is a no-op.
    pub fn close(&mut self) {
        if let Some(body) = self.body.take() {
            debug!(url = %self.url, status = self.status.as_u16(), "closing response");
            body.release();
        }
    }
}

impl Drop for RawResponse {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .field("url", &self.url)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    struct CountingBody {
        releases: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ResponseBody for CountingBody {
        async fn read_all(self: Box<Self>) -> Result<Bytes, TransportError> {
            self.releases.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::from_static(b"payload"))
        }

        fn release(self: Box<Self>) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting(status: StatusCode) -> (RawResponse, Arc<AtomicUsize>) {
        let releases = Arc::new(AtomicUsize::new(0));
        let body = CountingBody {
            releases: Arc::clone(&releases),
        };
        (RawResponse::new(status, HeaderMap::new(), "http://h/a", Box::new(body)), releases)
    }

    #[test]
    fn close_releases_exactly_once() {
        let (mut response, releases) = counting(StatusCode::OK);
        response.close();
        response.close();
        drop(response);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_closes_an_open_response() {
        let (response, releases) = counting(StatusCode::OK);
        drop(response);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reading_consumes_the_body() {
        let (mut response, releases) = counting(StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "payload");
        assert!(response.is_closed());
        assert!(matches!(response.bytes().await, Err(TransportError::Closed)));
        response.close();
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn status_message_uses_reason_phrase() {
        let response = RawResponse::buffered(StatusCode::NOT_FOUND, "");
        assert!(!response.is_success());
        assert_eq!(response.status_message(), "Not Found");
        let custom = RawResponse::buffered(StatusCode::from_u16(599).unwrap(), "");
        assert_eq!(custom.status_message(), "599");
    }
}
