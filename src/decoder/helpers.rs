use quick_xml::encoding::EncodingError;
use quick_xml::escape::unescape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};

use super::RecordError;

/// Helper function to get an attribute value from a BytesStart
pub(crate) fn get_attribute(e: &BytesStart, name: &str) -> Result<Option<String>, quick_xml::Error> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == name.as_bytes() {
            return attribute_value(&attr).map(Some);
        }
    }
    Ok(None)
}

/// UTF-8 value of an attribute with entity references resolved
fn attribute_value(attr: &Attribute) -> Result<String, quick_xml::Error> {
    let raw = std::str::from_utf8(&attr.value).map_err(EncodingError::from)?;
    Ok(unescape(raw)?.into_owned())
}

/// All attributes of an element as owned `(name, value)` pairs
pub(crate) fn attributes(e: &BytesStart) -> Result<Vec<(String, String)>, RecordError> {
    let mut out = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        out.push((key, attribute_value(&attr)?));
    }
    Ok(out)
}

/// A name/value/unit parameter element
#[derive(Debug, Clone, Default)]
pub(crate) struct CvParam {
    pub accession: String,
    pub name: String,
    pub value: Option<String>,
    pub unit_accession: Option<String>,
    pub unit_name: Option<String>,
}

impl CvParam {
    /// Unit accession, falling back to the unit name
    pub fn unit(&self) -> Option<&str> {
        self.unit_accession
            .as_deref()
            .or(self.unit_name.as_deref())
    }
}

/// Parse a cvParam element
pub(crate) fn parse_cv_param(e: &BytesStart) -> Result<CvParam, quick_xml::Error> {
    Ok(CvParam {
        accession: get_attribute(e, "accession")?.unwrap_or_default(),
        name: get_attribute(e, "name")?.unwrap_or_default(),
        value: get_attribute(e, "value")?.filter(|v| !v.is_empty()),
        unit_accession: get_attribute(e, "unitAccession")?,
        unit_name: get_attribute(e, "unitName")?,
    })
}

/// Short description of an event for error messages
pub(crate) fn describe_event(event: &Event) -> String {
    match event {
        Event::Start(e) | Event::Empty(e) => {
            format!("<{}>", String::from_utf8_lossy(e.name().as_ref()))
        }
        Event::End(e) => format!("</{}>", String::from_utf8_lossy(e.name().as_ref())),
        Event::Text(_) => "text".to_string(),
        Event::CData(_) => "CDATA".to_string(),
        Event::Eof => "end of file".to_string(),
        _ => "markup".to_string(),
    }
}
