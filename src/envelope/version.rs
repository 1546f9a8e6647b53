//! Protocol versions and the namespace/content-type values they select.
//!
//! SOAP 1.1 and SOAP 1.2 clients expect different `Content-Type` headers and
//! envelope namespaces. The schema namespaces are the same for both.

use std::fmt;
use std::str::FromStr;

/// `Content-Type` for SOAP 1.1 responses.
pub const CONTENT_TYPE_SOAP11: &str = "text/xml; charset=\"utf-8\"";

/// `Content-Type` for SOAP 1.2 responses.
pub const CONTENT_TYPE_SOAP12: &str = "application/soap+xml; charset=\"utf-8\"";

/// SOAP 1.1 envelope namespace.
pub const NAMESPACE_SOAP11: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// SOAP 1.2 envelope namespace.
pub const NAMESPACE_SOAP12: &str = "http://www.w3.org/2003/05/soap-envelope";

/// XML Schema namespace, bound to `xsd` on every outbound envelope.
pub const XMLNS_XSD: &str = "http://www.w3.org/2001/XMLSchema";

/// XML Schema instance namespace, bound to `xsi` on every outbound envelope.
pub const XMLNS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// SOAP protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SoapVersion {
    /// SOAP 1.1 (`text/xml`).
    #[default]
    V11,
    /// SOAP 1.2 (`application/soap+xml`).
    V12,
}

impl SoapVersion {
    /// Version string as used in configuration ("1.1" / "1.2").
    pub const fn as_str(self) -> &'static str {
        match self {
            SoapVersion::V11 => "1.1",
            SoapVersion::V12 => "1.2",
        }
    }

    /// Response `Content-Type` for this version.
    pub const fn content_type(self) -> &'static str {
        match self {
            SoapVersion::V11 => CONTENT_TYPE_SOAP11,
            SoapVersion::V12 => CONTENT_TYPE_SOAP12,
        }
    }

    /// Envelope namespace URI written as `xmlns:soap`.
    pub const fn envelope_namespace(self) -> &'static str {
        match self {
            SoapVersion::V11 => NAMESPACE_SOAP11,
            SoapVersion::V12 => NAMESPACE_SOAP12,
        }
    }
}

impl fmt::Display for SoapVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unsupported version string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported SOAP version {0:?} (expected \"1.1\" or \"1.2\")")]
pub struct UnknownVersion(pub String);

impl FromStr for SoapVersion {
    type Err = UnknownVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.1" => Ok(SoapVersion::V11),
            "1.2" => Ok(SoapVersion::V12),
            other => Err(UnknownVersion(other.to_string())),
        }
    }
}
