//! SOAP fault payload.

use std::fmt;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::DecodeError;

/// Standard SOAP fault.
///
/// Used in place of body content to report a failure. Every field is
/// optional and maps to the fixed wire names `faultcode`, `faultstring`,
/// `faultactor` and `detail`; empty fields are omitted when written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fault {
    /// `faultcode`
    pub code: Option<String>,
    /// `faultstring`, the human-readable message.
    pub string: Option<String>,
    /// `faultactor`
    pub actor: Option<String>,
    /// `detail`
    pub detail: Option<String>,
}

impl Fault {
    /// Create a fault carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            string: Some(message.into()),
            ..Self::default()
        }
    }

    /// Set the fault code (e.g. `soap:Server`).
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the fault actor.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Set the detail text.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// The fault message, empty when absent.
    pub fn message(&self) -> &str {
        self.string.as_deref().unwrap_or_default()
    }

    /// Wire fields in document order, skipping empty ones.
    pub(crate) fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("faultcode", self.code.as_deref()),
            ("faultstring", self.string.as_deref()),
            ("faultactor", self.actor.as_deref()),
            ("detail", self.detail.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| match value {
            Some(v) if !v.is_empty() => Some((name, v)),
            _ => None,
        })
    }

    /// Read a complete `Fault` element.
    ///
    /// Each field keeps only its own text. Elements nested inside a field
    /// (the usual shape of `detail`) are skipped, as are unknown fields.
    pub(crate) fn from_element(element: &str) -> Result<Self, DecodeError> {
        let mut reader = Reader::from_str(element);
        let mut fault = Fault::default();
        let mut depth = 0usize;
        let mut field: Option<String> = None;
        let mut text = String::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    depth += 1;
                    if depth == 2 {
                        field = Some(std::str::from_utf8(e.local_name().into_inner())?.to_string());
                        text.clear();
                    } else if depth > 2 {
                        reader.read_to_end(e.name())?;
                        depth -= 1;
                    }
                }
                Event::Empty(_) if depth == 0 => return Ok(fault),
                Event::Text(t) if depth == 2 => {
                    text.push_str(&t.unescape().map_err(quick_xml::Error::from)?);
                }
                Event::CData(c) if depth == 2 => text.push_str(std::str::from_utf8(&c)?),
                Event::End(_) => {
                    if depth == 2 {
                        if let Some(name) = field.take() {
                            fault.set_field(&name, text.trim());
                        }
                    }
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(fault);
                    }
                }
                Event::Eof => return Err(DecodeError::UnexpectedEof),
                _ => {}
            }
        }
    }

    fn set_field(&mut self, name: &str, value: &str) {
        let slot = match name {
            "faultcode" => &mut self.code,
            "faultstring" => &mut self.string,
            "faultactor" => &mut self.actor,
            "detail" => &mut self.detail,
            _ => return,
        };
        *slot = (!value.is_empty()).then(|| value.to_string());
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for Fault {}
