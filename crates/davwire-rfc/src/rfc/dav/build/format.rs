//! Indented rendering of XML for diagnostics.

use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesEnd, BytesPI, BytesStart, BytesText, Event};

use super::error::SerializeResult;
use crate::rfc::dav::parse::{SecureXmlParser, XmlDocument, XmlElement, XmlNode};

/// Indentation used for pretty output.
const INDENT_WIDTH: usize = 2;

/// Re-serialises XML with two-space indentation and no XML declaration.
///
/// Formatting never fails the caller: unparseable input comes back as is.
#[derive(Debug, Clone, Copy)]
pub struct XmlPrettyFormatter<'p> {
    parser: &'p SecureXmlParser,
}

impl XmlPrettyFormatter<'static> {
    /// Formatter backed by the process-wide parser.
    pub fn shared() -> Self {
        Self::new(SecureXmlParser::shared())
    }
}

impl<'p> XmlPrettyFormatter<'p> {
    #[must_use]
    pub const fn new(parser: &'p SecureXmlParser) -> Self {
        Self { parser }
    }

    /// Parses `xml` with the secure parser and re-serialises it indented.
    /// Returns the input unchanged if it does not parse or cannot be
    /// serialised.
    #[must_use]
    pub fn format_str(&self, xml: &str) -> String {
        match self.parser.parse(xml) {
            Ok(document) => self.format_document(&document).unwrap_or_else(|| xml.to_owned()),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to format XML");
                xml.to_owned()
            }
        }
    }

    /// Serialises a parsed document indented, without XML declaration.
    /// Failures are logged and yield `None`.
    #[must_use]
    pub fn format_document(&self, document: &XmlDocument) -> Option<String> {
        serialize_document(document)
            .inspect_err(|err| tracing::warn!(error = %err, "Failed to format XML"))
            .ok()
    }
}

/// Writes a document with UTF-8 output and [`INDENT_WIDTH`] indentation.
///
/// ## Errors
/// Returns an error if the underlying writer fails.
pub fn serialize_document(document: &XmlDocument) -> SerializeResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_WIDTH);

    for node in &document.prolog {
        write_node(&mut writer, node)?;
    }
    write_element(&mut writer, &document.root)?;
    for node in &document.epilog {
        write_node(&mut writer, node)?;
    }

    Ok(String::from_utf8(writer.into_inner())?)
}

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    element: &XmlElement,
) -> SerializeResult<()> {
    let name = element.qualified_name();
    let mut start = BytesStart::new(name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
    Ok(())
}

fn write_node<W: std::io::Write>(writer: &mut Writer<W>, node: &XmlNode) -> SerializeResult<()> {
    match node {
        XmlNode::Element(element) => write_element(writer, element)?,
        XmlNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        XmlNode::CData(data) => writer.write_event(Event::CData(BytesCData::new(data.as_str())))?,
        XmlNode::Comment(comment) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))?;
        }
        XmlNode::ProcessingInstruction(content) => {
            writer.write_event(Event::PI(BytesPI::new(content.as_str())))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTISTATUS: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<D:multistatus xmlns:D="DAV:"><D:response><D:href>/docs/a.txt</D:href><D:propstat><D:prop><D:displayname>a.txt</D:displayname><D:resourcetype/></D:prop><D:status>HTTP/1.1 200 OK</D:status></D:propstat></D:response></D:multistatus>"#;

    #[test]
    fn indents_by_two_and_omits_declaration() {
        let formatted = XmlPrettyFormatter::shared().format_str(MULTISTATUS);
        assert_eq!(
            formatted,
            r#"<D:multistatus xmlns:D="DAV:">
  <D:response>
    <D:href>/docs/a.txt</D:href>
    <D:propstat>
      <D:prop>
        <D:displayname>a.txt</D:displayname>
        <D:resourcetype/>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#
        );
    }

    #[test]
    fn formatting_is_idempotent() {
        let formatter = XmlPrettyFormatter::shared();
        for xml in [
            MULTISTATUS,
            r#"<!-- lead --><a xmlns="urn:a" xmlns:b="urn:b"><b:x attr="1 &amp; 2">t &lt; u</b:x>mixed <y/><![CDATA[<raw>]]><?pi data?></a>"#,
            "<root>\n\n   <child>  spaced  </child>\n</root>",
        ] {
            let once = formatter.format_str(xml);
            let twice = formatter.format_str(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn text_and_attributes_stay_escaped() {
        let formatted = XmlPrettyFormatter::shared().format_str(r#"<a k="&lt;v&gt;">x &amp; y</a>"#);
        assert!(formatted.contains("x &amp; y"), "{formatted}");
        assert!(formatted.contains("&lt;v&gt;"), "{formatted}");
    }

    #[test_log::test]
    fn unparseable_input_is_returned_unchanged() {
        let formatter = XmlPrettyFormatter::shared();
        assert_eq!(formatter.format_str("<a><b></a>"), "<a><b></a>");
        assert_eq!(formatter.format_str("not xml"), "not xml");

        let doctype = r#"<!DOCTYPE a [<!ENTITY e SYSTEM "file:///etc/passwd">]><a>&e;</a>"#;
        assert_eq!(formatter.format_str(doctype), doctype);
    }

    #[test]
    fn formats_a_built_tree() {
        let mut root = XmlElement::new("outer");
        root.children.push(XmlNode::Element(XmlElement::new("inner")));
        root.children.push(XmlNode::Comment(" done ".to_owned()));

        let formatted = XmlPrettyFormatter::shared()
            .format_document(&XmlDocument::new(root))
            .unwrap();
        assert_eq!(formatted, "<outer>\n  <inner/>\n  <!-- done -->\n</outer>");
    }
}
