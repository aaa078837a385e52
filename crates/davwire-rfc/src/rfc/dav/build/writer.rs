//! Incremental builder for namespace-qualified `WebDAV` response XML.

use std::io::{self, Write};

use davwire_core::config::XmlConfig;
use davwire_core::constants::XML_DECLARATION;

use super::format::XmlPrettyFormatter;

/// Shape of the tag emitted by [`XmlResponseWriter::write_element`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlElementType {
    /// `<p:name xmlns:p="uri">`
    Opening,
    /// `</p:name>` followed by a newline.
    Closing,
    /// `<p:name xmlns:p="uri"/>`
    SelfClosing,
}

/// ## Summary
/// Accumulates response XML in an owned buffer and hands it to an optional
/// sink in one write.
///
/// Text and CDATA are written verbatim: callers own escaping, or use
/// [`XmlResponseWriter::write_escaped_text`]. An empty prefix means the bare
/// local name is written and any namespace URI is ignored.
///
/// A writer belongs to a single response and is not shared.
#[derive(Debug)]
pub struct XmlResponseWriter<'p, W = io::Sink> {
    buffer: String,
    sink: Option<W>,
    formatter: XmlPrettyFormatter<'p>,
    log_pretty: bool,
}

impl XmlResponseWriter<'static, io::Sink> {
    /// Writer without a sink; the XML is read back through [`Self::render`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            sink: None,
            formatter: XmlPrettyFormatter::shared(),
            log_pretty: true,
        }
    }
}

impl Default for XmlResponseWriter<'static, io::Sink> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> XmlResponseWriter<'static, W> {
    /// Writer that delivers its buffer to `sink` on [`Self::flush`].
    #[must_use]
    pub fn with_sink(sink: W) -> Self {
        Self {
            buffer: String::new(),
            sink: Some(sink),
            formatter: XmlPrettyFormatter::shared(),
            log_pretty: true,
        }
    }
}

impl<'p, W: Write> XmlResponseWriter<'p, W> {
    /// Replaces the formatter used for the debug rendition on flush.
    #[must_use]
    pub fn with_formatter<'q>(self, formatter: XmlPrettyFormatter<'q>) -> XmlResponseWriter<'q, W> {
        XmlResponseWriter {
            buffer: self.buffer,
            sink: self.sink,
            formatter,
            log_pretty: self.log_pretty,
        }
    }

    /// Applies `xml.log_pretty`.
    #[must_use]
    pub fn with_settings(mut self, settings: &XmlConfig) -> Self {
        self.log_pretty = settings.log_pretty;
        self
    }

    /// Appends a single tag.
    pub fn write_element(
        &mut self,
        prefix: &str,
        namespace: Option<&str>,
        local_name: &str,
        kind: XmlElementType,
    ) {
        let bindings = namespace.map(|uri| (prefix, uri));
        self.write_element_with_namespaces(prefix, bindings, local_name, kind);
    }

    /// Appends a single tag declaring every `(prefix, uri)` binding on it.
    ///
    /// Bindings are only emitted on opening and self-closing tags of a
    /// prefixed element.
    pub fn write_element_with_namespaces<I, P, U>(
        &mut self,
        prefix: &str,
        bindings: I,
        local_name: &str,
        kind: XmlElementType,
    ) where
        I: IntoIterator<Item = (P, U)>,
        P: AsRef<str>,
        U: AsRef<str>,
    {
        match kind {
            XmlElementType::Closing => {
                self.buffer.push_str("</");
                self.push_qualified(prefix, local_name);
                self.buffer.push_str(">\n");
            }
            XmlElementType::Opening | XmlElementType::SelfClosing => {
                self.buffer.push('<');
                self.push_qualified(prefix, local_name);
                if !prefix.is_empty() {
                    for (binding_prefix, uri) in bindings {
                        self.push_declaration(binding_prefix.as_ref(), uri.as_ref());
                    }
                }
                self.buffer
                    .push_str(if kind == XmlElementType::Opening { ">" } else { "/>" });
            }
        }
    }

    /// `<p:name>value</p:name>\n`
    pub fn write_property(&mut self, prefix: &str, local_name: &str, value: &str) {
        self.write_element(prefix, None, local_name, XmlElementType::Opening);
        self.buffer.push_str(value);
        self.write_element(prefix, None, local_name, XmlElementType::Closing);
    }

    /// `<p:name xmlns:p="uri">value</p:name>\n`
    pub fn write_property_ns(&mut self, prefix: &str, namespace: &str, local_name: &str, value: &str) {
        self.write_element(prefix, Some(namespace), local_name, XmlElementType::Opening);
        self.buffer.push_str(value);
        self.write_element(prefix, None, local_name, XmlElementType::Closing);
    }

    /// `<p:name/>`
    pub fn write_empty_property(&mut self, prefix: &str, local_name: &str) {
        self.write_element(prefix, None, local_name, XmlElementType::SelfClosing);
    }

    /// Appends `text` verbatim.
    pub fn write_text(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Appends `text` with markup characters escaped.
    pub fn write_escaped_text(&mut self, text: &str) {
        self.buffer.push_str(&quick_xml::escape::escape(text));
    }

    /// Wraps `data` in a CDATA section without inspecting it.
    pub fn write_cdata(&mut self, data: &str) {
        self.buffer.push_str("<![CDATA[");
        self.buffer.push_str(data);
        self.buffer.push_str("]]>");
    }

    pub fn write_xml_declaration(&mut self) {
        self.buffer.push_str(XML_DECLARATION);
    }

    /// The XML accumulated since the last flush.
    #[must_use]
    pub fn render(&self) -> &str {
        &self.buffer
    }

    /// ## Summary
    /// Sends the buffer to the sink in one write and clears it.
    ///
    /// When DEBUG logging is enabled a pretty-printed copy is logged under
    /// `label`. Without a sink this does nothing and the buffer is kept.
    ///
    /// ## Errors
    /// Returns the sink's I/O error; the buffer is kept in that case.
    #[tracing::instrument(skip(self), fields(xml_len = self.buffer.len()))]
    pub fn flush(&mut self, label: Option<&str>) -> io::Result<()> {
        let Some(sink) = self.sink.as_mut() else {
            return Ok(());
        };

        if self.log_pretty && tracing::enabled!(tracing::Level::DEBUG) {
            let pretty = self.formatter.format_str(&self.buffer);
            tracing::debug!("{}\n{pretty}", label.unwrap_or_default());
        }

        sink.write_all(self.buffer.as_bytes())?;
        sink.flush()?;
        self.buffer.clear();
        Ok(())
    }

    /// Consumes the writer, returning its sink.
    #[must_use]
    pub fn into_sink(self) -> Option<W> {
        self.sink
    }

    fn push_qualified(&mut self, prefix: &str, local_name: &str) {
        if !prefix.is_empty() {
            self.buffer.push_str(prefix);
            self.buffer.push(':');
        }
        self.buffer.push_str(local_name);
    }

    fn push_declaration(&mut self, prefix: &str, uri: &str) {
        self.buffer.push_str(" xmlns:");
        self.buffer.push_str(prefix);
        self.buffer.push_str("=\"");
        self.buffer.push_str(uri);
        self.buffer.push('"');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::dav::parse::{SecureXmlParser, parse_requested_properties};

    #[test]
    fn property_with_value() {
        let mut writer = XmlResponseWriter::new();
        writer.write_property("D", "displayname", "index.html");
        assert_eq!(writer.render(), "<D:displayname>index.html</D:displayname>\n");
    }

    #[test]
    fn element_types() {
        let mut writer = XmlResponseWriter::new();
        writer.write_element("D", Some("DAV:"), "multistatus", XmlElementType::Opening);
        writer.write_element("D", Some("DAV:"), "collection", XmlElementType::SelfClosing);
        writer.write_element("D", None, "multistatus", XmlElementType::Closing);
        assert_eq!(
            writer.render(),
            "<D:multistatus xmlns:D=\"DAV:\"><D:collection xmlns:D=\"DAV:\"/></D:multistatus>\n"
        );
    }

    #[test]
    fn unprefixed_element_ignores_namespace() {
        let mut writer = XmlResponseWriter::new();
        writer.write_element("", Some("urn:ignored"), "plain", XmlElementType::Opening);
        writer.write_element("", None, "plain", XmlElementType::Closing);
        assert_eq!(writer.render(), "<plain></plain>\n");
    }

    #[test]
    fn multiple_bindings_on_one_tag() {
        let mut writer = XmlResponseWriter::new();
        let bindings = [("D", "DAV:"), ("Z", "urn:schemas-microsoft-com:")];
        writer.write_element_with_namespaces("D", bindings, "multistatus", XmlElementType::Opening);
        writer.write_element_with_namespaces("D", bindings, "prop", XmlElementType::SelfClosing);
        assert_eq!(
            writer.render(),
            "<D:multistatus xmlns:D=\"DAV:\" xmlns:Z=\"urn:schemas-microsoft-com:\">\
             <D:prop xmlns:D=\"DAV:\" xmlns:Z=\"urn:schemas-microsoft-com:\"/>"
        );
    }

    #[test]
    fn text_is_verbatim_unless_escaped() {
        let mut writer = XmlResponseWriter::new();
        writer.write_text("<b>");
        writer.write_escaped_text("a < b & c");
        writer.write_cdata("<raw & unescaped>");
        assert_eq!(
            writer.render(),
            "<b>a &lt; b &amp; c<![CDATA[<raw & unescaped>]]>"
        );
    }

    #[test]
    fn property_variants() {
        let mut writer = XmlResponseWriter::new();
        writer.write_xml_declaration();
        writer.write_property_ns("Z", "urn:z", "color", "blue");
        writer.write_empty_property("D", "resourcetype");
        assert_eq!(
            writer.render(),
            "<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n\
             <Z:color xmlns:Z=\"urn:z\">blue</Z:color>\n<D:resourcetype/>"
        );
    }

    #[test_log::test]
    fn flush_writes_once_and_clears() {
        let mut writer = XmlResponseWriter::with_sink(Vec::new());
        writer.write_property("D", "getcontentlength", "42");
        writer.flush(Some("PROPFIND response")).unwrap();
        assert_eq!(writer.render(), "");

        writer.write_empty_property("D", "collection");
        writer.flush(None).unwrap();

        let written = writer.into_sink().unwrap();
        assert_eq!(
            String::from_utf8(written).unwrap(),
            "<D:getcontentlength>42</D:getcontentlength>\n<D:collection/>"
        );
    }

    #[test]
    fn flush_without_sink_keeps_buffer() {
        let mut writer = XmlResponseWriter::new();
        writer.write_property("D", "displayname", "x");
        writer.flush(Some("ignored")).unwrap();
        assert_eq!(writer.render(), "<D:displayname>x</D:displayname>\n");
        assert!(writer.into_sink().is_none());
    }

    #[test]
    fn injected_formatter_and_settings() {
        let parser = SecureXmlParser::new(crate::rfc::dav::parse::ParserConfig::hardened()).unwrap();
        let settings = XmlConfig {
            log_pretty: false,
            ..XmlConfig::default()
        };
        let mut writer = XmlResponseWriter::with_sink(Vec::new())
            .with_formatter(XmlPrettyFormatter::new(&parser))
            .with_settings(&settings);
        writer.write_empty_property("D", "lockdiscovery");
        writer.flush(Some("LOCK")).unwrap();
        assert_eq!(writer.into_sink().unwrap(), b"<D:lockdiscovery/>");
    }

    #[test]
    fn built_request_parses_back() {
        let mut writer = XmlResponseWriter::new();
        writer.write_xml_declaration();
        writer.write_element("D", Some("DAV:"), "propfind", XmlElementType::Opening);
        writer.write_element("D", None, "prop", XmlElementType::Opening);
        writer.write_empty_property("D", "displayname");
        writer.write_element_with_namespaces("Z", [("Z", "urn:z")], "color", XmlElementType::SelfClosing);
        writer.write_element("D", None, "prop", XmlElementType::Closing);
        writer.write_element("D", None, "propfind", XmlElementType::Closing);

        let names = parse_requested_properties(SecureXmlParser::shared(), writer.render().as_bytes())
            .unwrap();
        let locals: Vec<_> = names.iter().map(|name| name.local_name()).collect();
        assert_eq!(locals, ["displayname", "color"]);
        assert_eq!(names[1].namespace_uri(), Some("urn:z"));
    }
}
