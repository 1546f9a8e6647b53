//! Handler replies.

use std::fmt;

use serde::Serialize;

use crate::envelope::{Envelope, Payload};
use crate::error::CodecError;

type Encode = Box<dyn FnOnce() -> Result<Payload, CodecError> + Send>;

/// What a handler hands back for the dispatcher to encode.
///
/// Values are serialized only when the dispatcher builds the success
/// envelope, and only if the handler has not written to the
/// [`ResponseWriter`](crate::ResponseWriter) itself.
#[derive(Default)]
pub struct Reply {
    body: Option<Encode>,
    header: Option<Encode>,
}

impl Reply {
    /// Reply whose body is `response`, serialized under its type name.
    pub fn new<R>(response: R) -> Self
    where
        R: Serialize + Send + 'static,
    {
        Self {
            body: Some(encoder(response)),
            header: None,
        }
    }

    /// Reply with an empty body.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Reply with an already-encoded body.
    pub fn raw(payload: Payload) -> Self {
        Self {
            body: Some(Box::new(move || Ok(payload))),
            header: None,
        }
    }

    /// Attach a header value.
    pub fn with_header<H>(mut self, header: H) -> Self
    where
        H: Serialize + Send + 'static,
    {
        self.header = Some(encoder(header));
        self
    }

    /// Attach an already-encoded header.
    pub fn with_raw_header(mut self, header: Payload) -> Self {
        self.header = Some(Box::new(move || Ok(header)));
        self
    }

    /// Encode into a success envelope.
    pub(crate) fn into_envelope(self) -> Result<Envelope, CodecError> {
        let body = self.body.map(|encode| encode()).transpose()?;
        let header = self.header.map(|encode| encode()).transpose()?;
        Ok(Envelope::response(body, header))
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reply")
            .field("body", &self.body.is_some())
            .field("header", &self.header.is_some())
            .finish()
    }
}

fn encoder<T>(value: T) -> Encode
where
    T: Serialize + Send + 'static,
{
    Box::new(move || Ok(Payload::from_xml(quick_xml::se::to_string(&value)?)))
}
