//! Response writer shared between the dispatcher and operation handlers.
//!
//! Handlers receive a [`ResponseWriter`] and may write their own output
//! instead of returning a value for the dispatcher to encode. Every write is
//! prefixed with the XML declaration, and the first write flips
//! `output_started` so the dispatcher knows not to write a second document.
//!
//! # Thread Safety
//!
//! `ResponseWriter` is `Clone`; clones share the same buffered response, so
//! a handler may hand it to a spawned task. The response is assembled by the
//! dispatcher once the handler returns.

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{HeaderName, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use bytes::BytesMut;
use parking_lot::Mutex;

use crate::logging::LogConfig;

/// XML declaration prepended to every write.
pub const XML_DECLARATION: &[u8] = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Length of [`XML_DECLARATION`], added to `Content-Length`.
pub const XML_DECLARATION_LEN: usize = XML_DECLARATION.len();

#[derive(Debug)]
struct ResponseState {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    output_started: bool,
}

impl Default for ResponseState {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
            output_started: false,
        }
    }
}

/// Buffered HTTP response handle.
#[derive(Debug, Clone, Default)]
pub struct ResponseWriter {
    state: Arc<Mutex<ResponseState>>,
    log: LogConfig,
}

impl ResponseWriter {
    /// Create an empty writer (status 200, no headers).
    pub fn new(log: LogConfig) -> Self {
        Self {
            state: Arc::default(),
            log,
        }
    }

    /// Write `data` preceded by the XML declaration. Returns the number of
    /// bytes appended, declaration included.
    pub fn write(&self, data: &[u8]) -> usize {
        if self.log.verbose {
            tracing::debug!(
                "writing response: {}{}",
                String::from_utf8_lossy(XML_DECLARATION),
                String::from_utf8_lossy(data)
            );
        }

        let mut state = self.state.lock();
        state.output_started = true;
        state.body.extend_from_slice(XML_DECLARATION);
        state.body.extend_from_slice(data);
        XML_DECLARATION_LEN + data.len()
    }

    /// Write `data` verbatim, without the declaration.
    pub(crate) fn write_raw(&self, data: &[u8]) {
        let mut state = self.state.lock();
        state.output_started = true;
        state.body.extend_from_slice(data);
    }

    /// Whether anything has been written.
    pub fn output_started(&self) -> bool {
        self.state.lock().output_started
    }

    /// Set the response status.
    pub fn write_header(&self, status: StatusCode) {
        self.state.lock().status = status;
    }

    /// Current response status.
    pub fn status(&self) -> StatusCode {
        self.state.lock().status
    }

    /// Set (replace) a response header.
    pub fn set_header(&self, name: HeaderName, value: HeaderValue) {
        self.state.lock().headers.insert(name, value);
    }

    /// Read a response header.
    pub fn header(&self, name: &HeaderName) -> Option<HeaderValue> {
        self.state.lock().headers.get(name).cloned()
    }

    /// Set `Content-Type`.
    pub fn set_content_type(&self, content_type: &str) {
        if let Ok(value) = HeaderValue::from_str(content_type) {
            self.set_header(CONTENT_TYPE, value);
        } else {
            tracing::warn!("invalid content type {:?} ignored", content_type);
        }
    }

    /// Set `Content-Type` and `Content-Length` for an envelope of
    /// `content_length` bytes that will be written with [`write`](Self::write).
    pub fn add_soap_headers(&self, content_length: usize, content_type: &str) {
        self.set_content_type(content_type);
        self.set_header(
            CONTENT_LENGTH,
            HeaderValue::from(content_length + XML_DECLARATION_LEN),
        );
    }

    /// Take the buffered response, leaving the writer empty.
    pub fn take_response(&self) -> Response {
        let state = std::mem::take(&mut *self.state.lock());
        let mut response = Response::new(Body::from(state.body.freeze()));
        *response.status_mut() = state.status;
        *response.headers_mut() = state.headers;
        response
    }
}
