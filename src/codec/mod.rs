//! Envelope codec - XML encoding and decoding of SOAP envelopes.
//!
//! - [`EnvelopeCodec`] - the marshal/unmarshal seam the server calls through
//! - [`XmlCodec`] - default implementation on `quick-xml`
//! - [`BodyContent`] - decode target bound to an inbound body
//!
//! # Two-phase decode
//!
//! The body of a request names its own type: the concrete structure is only
//! known once the child element of `<Body>` has been read. The server
//! therefore decodes every request twice over the same bytes:
//!
//! 1. Probe: decode into an [`EnvelopeRequest::probe`](crate::envelope::EnvelopeRequest::probe),
//!    whose [`DiscardContent`] drops the element but records its local name.
//! 2. Full: bind the [`TypedContent`] built by the resolved operation and
//!    decode again, this time populating the request.
//!
//! # Example
//!
//! ```
//! use soapwire::codec::{EnvelopeCodec, XmlCodec};
//! use soapwire::envelope::{EnvelopeRequest, SoapVersion};
//!
//! let xml = br#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
//!   <soap:Body><GetQuote><Symbol>ACME</Symbol></GetQuote></soap:Body>
//! </soap:Envelope>"#;
//!
//! let mut probe = EnvelopeRequest::probe();
//! XmlCodec.unmarshal(xml, &mut probe, SoapVersion::V11).unwrap();
//! assert_eq!(probe.body.content_type(), "GetQuote");
//! ```

mod body;
mod xml;

pub use body::{BodyContent, DiscardContent, TypedContent};
pub use xml::XmlCodec;

use crate::envelope::{Envelope, EnvelopeRequest, SoapVersion};
use crate::error::{CodecError, DecodeError};

/// Encodes outbound envelopes and decodes inbound ones.
///
/// The version only selects namespaces on the way out; decoding accepts
/// either envelope namespace.
pub trait EnvelopeCodec: Send + Sync + 'static {
    /// Encode `envelope` for `version`. The XML declaration is not included.
    fn marshal(&self, envelope: &Envelope, version: SoapVersion) -> Result<Vec<u8>, CodecError>;

    /// Decode `data` into `envelope`, whose body content must already be bound.
    fn unmarshal(
        &self,
        data: &[u8],
        envelope: &mut EnvelopeRequest,
        version: SoapVersion,
    ) -> Result<(), DecodeError>;
}
