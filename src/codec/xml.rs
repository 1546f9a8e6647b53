//! `quick-xml` implementation of [`EnvelopeCodec`].

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Reader;
use quick_xml::Writer;

use super::body::decode_body;
use super::EnvelopeCodec;
use crate::envelope::{
    Envelope, EnvelopeBody, EnvelopeRequest, Fault, Payload, SoapVersion, XMLNS_XSD, XMLNS_XSI,
};
use crate::error::{CodecError, DecodeError};

const ENVELOPE: &str = "soap:Envelope";
const HEADER: &str = "soap:Header";
const BODY: &str = "soap:Body";
const FAULT: &str = "soap:Fault";

/// Default envelope codec.
///
/// Writes `soap:`-prefixed envelopes with the version's namespace plus the
/// `xsd`/`xsi` schema namespaces. Reads envelopes by local name, so any
/// prefix (or none) is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlCodec;

impl EnvelopeCodec for XmlCodec {
    fn marshal(&self, envelope: &Envelope, version: SoapVersion) -> Result<Vec<u8>, CodecError> {
        let mut writer = Writer::new(Vec::new());

        let mut root = BytesStart::new(ENVELOPE);
        root.push_attribute(("xmlns:soap", version.envelope_namespace()));
        root.push_attribute(("xmlns:xsd", XMLNS_XSD));
        root.push_attribute(("xmlns:xsi", XMLNS_XSI));
        writer.write_event(Event::Start(root))?;

        writer.write_event(Event::Start(BytesStart::new(HEADER)))?;
        if let Some(header) = &envelope.header {
            write_payload(&mut writer, header)?;
        }
        writer.write_event(Event::End(BytesEnd::new(HEADER)))?;

        writer.write_event(Event::Start(BytesStart::new(BODY)))?;
        match &envelope.body {
            EnvelopeBody::Empty => {}
            EnvelopeBody::Content(payload) => write_payload(&mut writer, payload)?,
            EnvelopeBody::Fault(fault) => write_fault(&mut writer, fault)?,
        }
        writer.write_event(Event::End(BytesEnd::new(BODY)))?;

        writer.write_event(Event::End(BytesEnd::new(ENVELOPE)))?;
        Ok(writer.into_inner())
    }

    fn unmarshal(
        &self,
        data: &[u8],
        envelope: &mut EnvelopeRequest,
        _version: SoapVersion,
    ) -> Result<(), DecodeError> {
        let xml = std::str::from_utf8(data)?;
        let mut reader = Reader::from_str(xml);

        // Skip the declaration, comments and whitespace up to the root.
        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = local_name(&e)?;
                    if name == "Envelope" {
                        break;
                    }
                    return Err(DecodeError::NotAnEnvelope(name.to_string()));
                }
                Event::Empty(e) => {
                    let name = local_name(&e)?;
                    if name == "Envelope" {
                        return Err(DecodeError::MissingBody);
                    }
                    return Err(DecodeError::NotAnEnvelope(name.to_string()));
                }
                Event::Eof => return Err(DecodeError::MissingEnvelope),
                _ => {}
            }
        }

        let mut seen_body = false;
        loop {
            match reader.read_event()? {
                Event::Start(e) => match local_name(&e)? {
                    "Header" => {
                        let span = reader.read_to_end(e.name())?;
                        let inner = xml[span.start as usize..span.end as usize].trim();
                        envelope.header = (!inner.is_empty()).then(|| Payload::from_xml(inner));
                    }
                    "Body" => {
                        decode_body(&mut reader, xml, &mut envelope.body)?;
                        seen_body = true;
                    }
                    _ => {
                        reader.read_to_end(e.name())?;
                    }
                },
                Event::Empty(e) => match local_name(&e)? {
                    "Header" => envelope.header = None,
                    "Body" => {
                        if !envelope.body.is_bound() {
                            return Err(DecodeError::UnboundContent);
                        }
                        seen_body = true;
                    }
                    _ => {}
                },
                Event::End(_) => break,
                Event::Eof => return Err(DecodeError::UnexpectedEof),
                _ => {}
            }
        }

        if seen_body {
            Ok(())
        } else {
            Err(DecodeError::MissingBody)
        }
    }
}

fn local_name<'a>(e: &'a BytesStart<'_>) -> Result<&'a str, DecodeError> {
    Ok(std::str::from_utf8(e.local_name().into_inner())?)
}

fn write_payload(writer: &mut Writer<Vec<u8>>, payload: &Payload) -> Result<(), CodecError> {
    writer.write_event(Event::Text(BytesText::from_escaped(payload.as_str())))?;
    Ok(())
}

fn write_fault(writer: &mut Writer<Vec<u8>>, fault: &Fault) -> Result<(), CodecError> {
    writer.write_event(Event::Start(BytesStart::new(FAULT)))?;
    for (name, value) in fault.fields() {
        writer.write_event(Event::Start(BytesStart::new(name)))?;
        writer.write_event(Event::Text(BytesText::new(value)))?;
        writer.write_event(Event::End(BytesEnd::new(name)))?;
    }
    writer.write_event(Event::End(BytesEnd::new(FAULT)))?;
    Ok(())
}
