//! Small helpers around quick-xml shared by the part rewriters.

use deck_core::Error;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fmt::Display;

pub(crate) type XmlWriter = Writer<Vec<u8>>;

/// Wrap any quick-xml failure.
pub(crate) fn xml_err(e: impl Display) -> Error {
    Error::Xml(e.to_string())
}

/// Extract the local name from a potentially namespaced XML element name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Namespace prefix of a qualified name, if any.
pub(crate) fn prefix_of(name: &[u8]) -> Option<String> {
    name.iter()
        .position(|&b| b == b':')
        .map(|pos| String::from_utf8_lossy(&name[..pos]).into_owned())
}

/// Join a prefix and a local name.
pub(crate) fn qualified(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{}:{}", prefix, local)
    }
}

/// Value of the attribute whose full key is `key`.
pub(crate) fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

pub(crate) fn start(w: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> deck_core::Result<()> {
    let mut elem = BytesStart::new(name);
    for &attr in attrs {
        elem.push_attribute(attr);
    }
    w.write_event(Event::Start(elem)).map_err(xml_err)
}

pub(crate) fn empty(w: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> deck_core::Result<()> {
    let mut elem = BytesStart::new(name);
    for &attr in attrs {
        elem.push_attribute(attr);
    }
    w.write_event(Event::Empty(elem)).map_err(xml_err)
}

pub(crate) fn end(w: &mut XmlWriter, name: &str) -> deck_core::Result<()> {
    w.write_event(Event::End(BytesEnd::new(name))).map_err(xml_err)
}

pub(crate) fn text(w: &mut XmlWriter, content: &str) -> deck_core::Result<()> {
    w.write_event(Event::Text(BytesText::new(content)))
        .map_err(xml_err)
}

/// Finish a writer into a UTF-8 string.
pub(crate) fn into_string(w: XmlWriter) -> deck_core::Result<String> {
    String::from_utf8(w.into_inner()).map_err(|e| Error::Xml(format!("Invalid UTF-8 output: {}", e)))
}
