//! Error types for soapwire.

use thiserror::Error;

/// Boxed error returned by operation handlers and header validators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for crate-level operations (serving, payload encoding).
#[derive(Debug, Error)]
pub enum SoapError {
    /// I/O error while binding or serving.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML serialization error for a payload value.
    #[error("XML encode error: {0}")]
    Encode(#[from] quick_xml::SeError),

    /// Inbound decode error.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Envelope marshaling error.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Errors produced while decoding an inbound envelope.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Malformed XML.
    #[error("XML syntax error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Request bytes are not valid UTF-8.
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Element content does not match the bound structure.
    #[error("{0}")]
    Deserialize(#[from] quick_xml::DeError),

    /// The document root is not a SOAP envelope.
    #[error("expected soap Envelope element, found {0:?}")]
    NotAnEnvelope(String),

    /// No root element at all.
    #[error("missing soap Envelope element")]
    MissingEnvelope,

    /// The envelope has no body.
    #[error("missing soap Body element")]
    MissingBody,

    /// Input ended inside the envelope.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// More than one top-level element inside the body.
    #[error("found multiple elements inside SOAP body; not wrapped-document/literal WS-I compliant")]
    MultipleBodyElements,

    /// Decode attempted without a content placeholder bound to the body.
    #[error("body content placeholder must be bound before decoding")]
    UnboundContent,
}

/// Errors produced while marshaling an outbound envelope.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Writer I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML writer failure.
    #[error("XML write error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Payload value could not be serialized.
    #[error("XML encode error: {0}")]
    Encode(#[from] quick_xml::SeError),
}

/// A routing lookup that found no registered operation.
///
/// Each level of the registry reports its own miss so the fault names the
/// exact token that failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryMiss {
    /// No operations registered for the request path.
    #[error("unknown path \"{0}\"")]
    UnknownPath(String),

    /// Path known, action not.
    #[error("unknown action \"{0}\"")]
    UnknownAction(String),

    /// Path and action known, body content type not.
    #[error("no action handler for content type: \"{0}\"")]
    UnknownContentType(String),
}

/// Failure of a single dispatch. The `Display` text is the fault string sent
/// back to the client.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Any method other than POST.
    #[error("this is a soap service - you have to POST soap requests")]
    MethodNotAllowed,

    /// The request body could not be read from the transport.
    #[error("could not read POST:: {0}")]
    ReadBody(String),

    /// The probe pass failed.
    #[error("could not probe soap body content:: {0}")]
    Probe(DecodeError),

    /// No operation registered for the request.
    #[error(transparent)]
    Route(#[from] RegistryMiss),

    /// The full decode pass failed.
    #[error("could not unmarshal request:: {0}")]
    Decode(DecodeError),

    /// The header validator rejected the request.
    #[error("{0}")]
    HeaderRejected(BoxError),

    /// The operation handler failed.
    #[error("{0}")]
    Handler(BoxError),

    /// The success envelope could not be produced.
    #[error("could not marshal response:: {0}")]
    Marshal(CodecError),
}

/// Result type alias using SoapError.
pub type Result<T> = std::result::Result<T, SoapError>;
