//! Envelope data model.
//!
//! Outbound envelopes ([`Envelope`]) carry opaque, already-encoded payloads
//! and are written by an [`EnvelopeCodec`](crate::codec::EnvelopeCodec).
//! Inbound envelopes ([`EnvelopeRequest`]) are decoded into a body whose
//! content slot is bound before decoding starts; see [`crate::codec`] for
//! the two-phase decode.

mod fault;
mod version;

use std::any::Any;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{BodyContent, DiscardContent};
use crate::error::{DecodeError, Result};

pub use fault::Fault;
pub use version::{
    SoapVersion, UnknownVersion, CONTENT_TYPE_SOAP11, CONTENT_TYPE_SOAP12, NAMESPACE_SOAP11,
    NAMESPACE_SOAP12, XMLNS_XSD, XMLNS_XSI,
};

/// An opaque XML fragment used as header or body content.
///
/// The codec never looks inside a payload; it is copied verbatim into the
/// envelope on the way out and captured verbatim on the way in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload(String);

impl Payload {
    /// Serialize a value, using its type name as the root tag.
    pub fn to_xml<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self(quick_xml::se::to_string(value)?))
    }

    /// Serialize a value under an explicit root tag.
    pub fn to_xml_with_root<T: Serialize + ?Sized>(root: &str, value: &T) -> Result<Self> {
        Ok(Self(quick_xml::se::to_string_with_root(root, value)?))
    }

    /// Wrap an already-encoded fragment. The fragment is not validated.
    pub fn from_xml(fragment: impl Into<String>) -> Self {
        Self(fragment.into())
    }

    /// The raw fragment.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Deserialize the fragment into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> std::result::Result<T, DecodeError> {
        Ok(quick_xml::de::from_str(&self.0)?)
    }

    /// Consume into the raw fragment.
    pub fn into_string(self) -> String {
        self.0
    }
}

/// Outbound body: content or fault, never both.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EnvelopeBody {
    /// `<soap:Body></soap:Body>`
    #[default]
    Empty,
    /// A single content element.
    Content(Payload),
    /// A fault.
    Fault(Fault),
}

/// Outbound envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    /// Header content; an empty `soap:Header` is written when absent.
    pub header: Option<Payload>,
    /// Body content or fault.
    pub body: EnvelopeBody,
}

impl Envelope {
    /// Success envelope from a handler's response and header values.
    pub fn response(body: Option<Payload>, header: Option<Payload>) -> Self {
        Self {
            header,
            body: body.map_or(EnvelopeBody::Empty, EnvelopeBody::Content),
        }
    }

    /// Envelope carrying only a fault.
    pub fn fault(fault: Fault) -> Self {
        Self {
            header: None,
            body: EnvelopeBody::Fault(fault),
        }
    }
}

/// Inbound body.
///
/// Holds the content slot the decoder writes into, the fault if the body
/// carried one, and the local name of the body's child element.
#[derive(Default)]
pub struct BodyRequest {
    fault: Option<Fault>,
    content: Option<Box<dyn BodyContent>>,
    content_type: String,
}

impl BodyRequest {
    /// Body with `content` bound as the decode target.
    pub fn new(content: Box<dyn BodyContent>) -> Self {
        Self {
            fault: None,
            content: Some(content),
            content_type: String::new(),
        }
    }

    /// Bind a new decode target, replacing the current one.
    pub fn bind(&mut self, content: Box<dyn BodyContent>) {
        self.content = Some(content);
    }

    /// Local tag name of the body's child element, empty until decoded.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The fault carried by the body, if any.
    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    /// The bound content slot.
    pub fn content(&self) -> Option<&dyn BodyContent> {
        self.content.as_deref()
    }

    /// Borrow the decoded content as `T`.
    pub fn content_as<T: Any>(&self) -> Option<&T> {
        self.content
            .as_deref()
            .and_then(|content| content.as_any().downcast_ref::<T>())
    }

    /// Take the content slot out of the body.
    pub fn take_content(&mut self) -> Option<Box<dyn BodyContent>> {
        self.content.take()
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.content.is_some()
    }

    /// Record a fault child. The content slot is released.
    pub(crate) fn set_fault(&mut self, fault: Fault) {
        self.fault = Some(fault);
        self.content = None;
    }

    /// Record the content type and decode `element` into the bound slot.
    pub(crate) fn decode_content(
        &mut self,
        content_type: &str,
        element: &str,
    ) -> std::result::Result<(), DecodeError> {
        let content = self.content.as_mut().ok_or(DecodeError::UnboundContent)?;
        self.content_type = content_type.to_string();
        content.decode_element(element)
    }
}

impl fmt::Debug for BodyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyRequest")
            .field("fault", &self.fault)
            .field("bound", &self.content.is_some())
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Inbound envelope.
#[derive(Debug, Default)]
pub struct EnvelopeRequest {
    /// Inner XML of `Header`, if present and non-empty.
    pub header: Option<Payload>,
    /// Decoded body.
    pub body: BodyRequest,
}

impl EnvelopeRequest {
    /// Request whose body decodes into `content`.
    pub fn new(content: Box<dyn BodyContent>) -> Self {
        Self {
            header: None,
            body: BodyRequest::new(content),
        }
    }

    /// Request for the probe pass: the body content is discarded.
    pub fn probe() -> Self {
        Self::new(Box::new(DiscardContent))
    }
}
