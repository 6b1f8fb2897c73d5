//! Conversion between XML text and the generic [`Element`] tree.
//!
//! Names are kept as written, prefix included; namespace declarations stay ordinary
//! attributes so that a document serializes back the way it came in.

use std::io::Cursor;

use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Reader, Writer,
};

use crate::{
    element::Element,
    error::{MpdError, MpdResult, ParseReason},
};

fn xml_error(e: impl std::fmt::Display) -> MpdError {
    MpdError::Xml(e.to_string())
}

fn start_element(start: &BytesStart) -> MpdResult<Element> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(xml_error)?
        .to_string();
    let mut element = Element::new(name);
    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = std::str::from_utf8(attribute.key.as_ref())
            .map_err(xml_error)?
            .to_string();
        let value = attribute.unescape_value()?.to_string();
        element.attributes.insert(key, value);
    }
    Ok(element)
}

fn push_text(stack: &mut [Element], text: &str) {
    if text.trim().is_empty() {
        return;
    }
    if let Some(current) = stack.last_mut() {
        current.text.get_or_insert_with(String::new).push_str(text);
    }
}

/// Parses a sequence of top-level elements. Text outside of any element is ignored.
fn parse_elements(xml: &str) -> MpdResult<Vec<Element>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut roots = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(start_element(&start)?),
            Event::Empty(start) => {
                let element = start_element(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => roots.push(element),
                }
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(MpdError::Xml("unexpected closing tag".to_string()));
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => roots.push(element),
                }
            }
            Event::Text(text) => push_text(&mut stack, &text.unescape()?),
            Event::CData(data) => {
                let data = data.into_inner();
                let text = std::str::from_utf8(&data).map_err(xml_error)?;
                push_text(&mut stack, text);
            }
            Event::Eof => break,
            // declarations, comments, processing instructions and doctypes carry nothing
            // the document model keeps
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(MpdError::Xml(format!("unclosed element <{}>", open.name)));
    }
    Ok(roots)
}

/// Parses a complete document into its root element.
pub fn parse(xml: &str) -> MpdResult<Element> {
    let mut roots = parse_elements(xml)?.into_iter();
    let root = roots.next().ok_or_else(|| {
        MpdError::parse("document", ParseReason::Malformed("no root element".to_string()))
    })?;
    if roots.next().is_some() {
        return Err(MpdError::parse(
            "document",
            ParseReason::Malformed("more than one root element".to_string()),
        ));
    }
    Ok(root)
}

/// Parses a remote element fragment: zero or more top-level elements.
pub fn parse_fragment(bytes: &[u8]) -> MpdResult<Vec<Element>> {
    let xml = std::str::from_utf8(bytes).map_err(xml_error)?;
    parse_elements(xml.trim_start_matches('\u{feff}'))
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, element: &Element) -> MpdResult<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() && element.text.is_none() {
        writer.write_event(Event::Empty(start)).map_err(xml_error)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(xml_error)?;
    if let Some(text) = &element.text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_error)?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(xml_error)?;
    Ok(())
}

/// Serializes `root` as a standalone document.
pub fn write(root: &Element) -> MpdResult<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;
    write_element(&mut writer, root)?;
    String::from_utf8(writer.into_inner().into_inner()).map_err(xml_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_write() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" profiles="urn:mpeg:dash:profile:isoff-live:2011">
  <!-- a comment -->
  <BaseURL>https://cdn.example.com/a&amp;b/</BaseURL>
  <Period id="p0"/>
</MPD>"#;
        let root = parse(xml).unwrap();
        assert_eq!(root.name, "MPD");
        assert_eq!(root.children.len(), 2);
        assert_eq!(
            root.children[0].text.as_deref(),
            Some("https://cdn.example.com/a&b/")
        );
        assert_eq!(root.children[1].attribute("id"), Some("p0"));

        let written = write(&root).unwrap();
        assert!(written.contains("a&amp;b"));
        assert_eq!(parse(&written).unwrap(), root);
    }

    #[test]
    fn test_fragment() {
        let fragment = br#"<Period id="ad1"/><Period id="ad2"></Period>"#;
        let elements = parse_fragment(fragment).unwrap();
        assert_eq!(elements.len(), 2);

        assert!(parse_fragment(b"").unwrap().is_empty());
        assert!(parse("<MPD><Period></MPD>").is_err());
        assert!(parse(r#"<Period id="a"/><Period id="b"/>"#).is_err());
    }
}
