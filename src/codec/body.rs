//! Body content slots and the single-child body decoder.
//!
//! The concrete type of a body is only known after its child element name
//! has been read, but the decoder needs somewhere to put that element while
//! it reads. A [`BodyContent`] is that somewhere: the probe pass binds
//! [`DiscardContent`], which records nothing, and once routing has resolved
//! the operation the full pass binds a [`TypedContent`] built by the
//! operation's request factory and decodes the same bytes again.

use std::any::Any;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::DeserializeOwned;

use crate::envelope::{BodyRequest, Fault};
use crate::error::DecodeError;

/// Local name of a fault child element.
const FAULT_ELEMENT: &str = "Fault";

/// A decode target for the body's child element.
pub trait BodyContent: Send + 'static {
    /// Populate from the complete child element (start tag through end tag).
    fn decode_element(&mut self, element: &str) -> Result<(), DecodeError>;

    /// The decoded value.
    fn as_any(&self) -> &dyn Any;

    /// Consume into the decoded value.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

/// Inert placeholder for the probe pass. Element content is discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardContent;

impl BodyContent for DiscardContent {
    fn decode_element(&mut self, _element: &str) -> Result<(), DecodeError> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// Decode target for a concrete request type.
///
/// Starts from the value produced by the operation's factory; a successful
/// decode replaces it with the value read from the wire.
#[derive(Debug, Clone, Default)]
pub struct TypedContent<T>(T);

impl<T> TypedContent<T> {
    /// Wrap a freshly constructed request value.
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the value.
    pub fn get(&self) -> &T {
        &self.0
    }

    /// Unwrap the value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> BodyContent for TypedContent<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn decode_element(&mut self, element: &str) -> Result<(), DecodeError> {
        self.0 = quick_xml::de::from_str(element)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        &self.0
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        Box::new(self.0)
    }
}

/// Decode the children of `<Body>`, stopping at its end tag.
///
/// `reader` must be positioned just after the `Body` start tag and read from
/// `xml`. The first child element names the content type; a `Fault` child is
/// decoded into the body's fault, anything else into the bound content slot.
/// A second child element is rejected.
pub(crate) fn decode_body(
    reader: &mut Reader<&[u8]>,
    xml: &str,
    body: &mut BodyRequest,
) -> Result<(), DecodeError> {
    if !body.is_bound() {
        return Err(DecodeError::UnboundContent);
    }

    let mut consumed = false;
    loop {
        let start = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Start(e) => {
                if consumed {
                    return Err(DecodeError::MultipleBodyElements);
                }
                reader.read_to_end(e.name())?;
                let element = &xml[start..reader.buffer_position() as usize];
                bind_child(body, e.local_name().into_inner(), element)?;
                consumed = true;
            }
            Event::Empty(e) => {
                if consumed {
                    return Err(DecodeError::MultipleBodyElements);
                }
                let element = &xml[start..reader.buffer_position() as usize];
                bind_child(body, e.local_name().into_inner(), element)?;
                consumed = true;
            }
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(DecodeError::UnexpectedEof),
            _ => {}
        }
    }
}

fn bind_child(body: &mut BodyRequest, local: &[u8], element: &str) -> Result<(), DecodeError> {
    let local = std::str::from_utf8(local)?;
    if local == FAULT_ELEMENT {
        body.set_fault(Fault::from_element(element)?);
        Ok(())
    } else {
        body.decode_content(local, element)
    }
}
