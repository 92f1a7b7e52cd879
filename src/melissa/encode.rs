//! Request encoders for the two WebSmart interfaces.
//!
//! Both are driven by [`FIELD_ENCODINGS`]: the XML encoder writes every
//! per-record element (empty when the field is unset), the REST encoder only
//! writes parameters that carry a value.

use std::io::Write;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use url::form_urlencoded;
use crate::config::ClientConfig;
use crate::error::WebsmartError;
use crate::record::AddressRecord;
use crate::melissa::model::{BatchRequest, FIELD_ENCODINGS};

const ROOT_ELEMENT: &str = "RequestArray";
const RECORD_ELEMENT: &str = "Record";

/// Build the XML document for a batch submission.
///
/// ```xml
/// <RequestArray>
///   <TransmissionReference>...</TransmissionReference>
///   <CustomerID>123456789</CustomerID>
///   <OptAddressParsed>True</OptAddressParsed>
///   <Record>
///     <RecordID>0</RecordID>
///     <Company/>
///     <AddressLine1>22382 Avenida Empresa</AddressLine1>
///     ...
///   </Record>
/// </RequestArray>
/// ```
///
/// Batch size limits are checked by the caller.
pub fn encode_xml(config: &ClientConfig, batch: &BatchRequest) -> Result<Vec<u8>, WebsmartError> {
    let mut writer = Writer::new(Vec::new());

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(encode_err)?;
    writer.write_event(Event::Start(BytesStart::new(ROOT_ELEMENT)))
        .map_err(encode_err)?;

    if let Some(reference) = batch.transmission_reference.as_deref().filter(|r| !r.is_empty()) {
        write_element(&mut writer, "TransmissionReference", Some(reference))?;
    }
    write_element(&mut writer, "CustomerID", Some(config.customer_id()))?;
    write_element(&mut writer, "OptAddressParsed", Some(xml_bool(config.parse_address())))?;

    for (idx, record) in batch.records.iter().enumerate() {
        write_record(&mut writer, idx, record)?;
    }

    writer.write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))
        .map_err(encode_err)?;
    Ok(writer.into_inner())
}

fn write_record<W: Write>(writer: &mut Writer<W>, idx: usize, record: &AddressRecord) -> Result<(), WebsmartError> {
    writer.write_event(Event::Start(BytesStart::new(RECORD_ELEMENT)))
        .map_err(encode_err)?;
    write_element(writer, "RecordID", Some(&idx.to_string()))?;

    for encoding in FIELD_ENCODINGS {
        if let Some(element) = encoding.xml_element {
            write_element(writer, element, record.get(encoding.field))?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new(RECORD_ELEMENT)))
        .map_err(encode_err)?;
    Ok(())
}

/// `<name>text</name>`, or `<name/>` when there is no text
fn write_element<W: Write>(writer: &mut Writer<W>, name: &str, text: Option<&str>) -> Result<(), WebsmartError> {
    match text {
        Some(text) => {
            if let Some(c) = text.chars().find(|c| !is_xml_char(*c)) {
                return Err(WebsmartError::Encode(format!(
                    "<{name}> contains character U+{:04X}, which XML 1.0 does not allow", c as u32
                )));
            }
            writer.write_event(Event::Start(BytesStart::new(name)))
                .map_err(encode_err)?;
            // BytesText::new escapes markup characters
            writer.write_event(Event::Text(BytesText::new(text)))
                .map_err(encode_err)?;
            writer.write_event(Event::End(BytesEnd::new(name)))
                .map_err(encode_err)?;
        }
        None => {
            writer.write_event(Event::Empty(BytesStart::new(name)))
                .map_err(encode_err)?;
        }
    }
    Ok(())
}

/// Build the query string for a single-record REST lookup.
///
/// `id` and `opt` always come first, followed by every record field that
/// has a value, form-urlencoded.
pub fn encode_query_string(config: &ClientConfig, record: &AddressRecord) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("id", config.customer_id());
    query.append_pair("opt", rest_bool(config.parse_address()));

    for encoding in FIELD_ENCODINGS {
        let Some(param) = encoding.rest_param else {
            continue;
        };
        if let Some(value) = record.get(encoding.field) {
            query.append_pair(param, value);
        }
    }
    query.finish()
}

/// `Char` production of XML 1.0; surrogates cannot occur in a `char`
fn is_xml_char(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' => true,
        '\u{0}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}' => false,
        _ => true,
    }
}

fn xml_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

fn rest_bool(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

fn encode_err(err: impl std::fmt::Display) -> WebsmartError {
    WebsmartError::Encode(err.to_string())
}
