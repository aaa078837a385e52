//! Property name extraction from PROPFIND-style request bodies.

use super::error::{ParseError, ParseResult};
use super::secure::SecureXmlParser;
use super::tree::{XmlDocument, XmlElement};
use crate::rfc::dav::core::{Namespace, PropertyName, QName};

/// Lists the properties named by a `prop` element.
///
/// ## Summary
/// Returns the direct element children in document order, each reduced to
/// its local name (anything up to the last `:` removed) and resolved
/// namespace. Text and comments are skipped; an element without element
/// children yields an empty list.
#[must_use]
pub fn extract_property_names(prop: &XmlElement) -> Vec<PropertyName> {
    prop.child_elements()
        .map(|child| {
            let local = child
                .local_name
                .rsplit(':')
                .next()
                .unwrap_or(child.local_name.as_str())
                .to_owned();
            PropertyName::new(QName::new(
                child.namespace.clone().map(Namespace::from),
                local,
            ))
        })
        .collect()
}

/// Finds the `prop` element of a `propfind` or `propertyupdate` document.
///
/// ## Errors
/// `ParseErrorKind::MissingElement` if the root has no `prop` child.
pub fn find_prop(document: &XmlDocument) -> ParseResult<&XmlElement> {
    document
        .root()
        .find_child("prop")
        .ok_or_else(|| ParseError::missing_element("prop"))
}

/// Parses a PROPFIND body and returns the requested property names.
///
/// ## Errors
/// Returns an error if the body does not parse or has no `prop` element.
/// There is no fallback list: a caller that cannot read the request must
/// reject it.
#[tracing::instrument(skip(parser, xml), fields(xml_len = xml.len()))]
pub fn parse_requested_properties(
    parser: &SecureXmlParser,
    xml: &[u8],
) -> ParseResult<Vec<PropertyName>> {
    let document = parser.parse_bytes(xml)?;
    let properties = extract_property_names(find_prop(&document)?);
    tracing::debug!(count = properties.len(), "Extracted requested properties");
    Ok(properties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::dav::parse::error::ParseErrorKind;

    fn names(xml: &str) -> Vec<String> {
        let doc = SecureXmlParser::shared().parse(xml).unwrap();
        extract_property_names(doc.root())
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    #[test]
    fn extracts_in_document_order() {
        let xml = r#"<D:prop xmlns:D="DAV:"><D:displayname/><D:getcontentlength/></D:prop>"#;
        assert_eq!(names(xml), vec!["displayname", "getcontentlength"]);
    }

    #[test]
    fn keeps_namespaces_and_skips_text_and_comments() {
        let xml = r#"<D:prop xmlns:D="DAV:" xmlns:Z="urn:example">
  stray text
  <!-- a comment -->
  <Z:color/>
  <D:resourcetype/>
</D:prop>"#;
        let doc = SecureXmlParser::shared().parse(xml).unwrap();
        let props = extract_property_names(doc.root());

        assert_eq!(props.len(), 2);
        assert_eq!(props[0], "color");
        assert_eq!(props[0].namespace_uri(), Some("urn:example"));
        assert_eq!(props[1], "resourcetype");
        assert!(props[1].qname().is_dav());
    }

    #[test]
    fn empty_prop_yields_empty_list() {
        assert!(names(r#"<D:prop xmlns:D="DAV:"/>"#).is_empty());
        assert!(names(r#"<D:prop xmlns:D="DAV:">  </D:prop>"#).is_empty());
    }

    #[test]
    fn nested_children_are_not_flattened() {
        let xml = r#"<prop><outer><inner/></outer><second/></prop>"#;
        assert_eq!(names(xml), vec!["outer", "second"]);
    }

    #[test_log::test]
    fn full_propfind_body() {
        let xml = br#"<?xml version="1.0" encoding="utf-8"?>
<D:propfind xmlns:D="DAV:">
  <D:prop>
    <D:getlastmodified/>
    <D:getetag/>
    <D:lockdiscovery/>
  </D:prop>
</D:propfind>"#;

        let props = parse_requested_properties(SecureXmlParser::shared(), xml).unwrap();
        let props: Vec<&str> = props.iter().map(PropertyName::local_name).collect();
        assert_eq!(props, vec!["getlastmodified", "getetag", "lockdiscovery"]);
    }

    #[test]
    fn missing_prop_is_an_error() {
        let xml = br#"<D:propfind xmlns:D="DAV:"><D:allprop/></D:propfind>"#;
        let err = parse_requested_properties(SecureXmlParser::shared(), xml).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingElement);
    }

    #[test]
    fn unparseable_body_propagates() {
        let err = parse_requested_properties(SecureXmlParser::shared(), b"<D:propfind>")
            .unwrap_err();
        assert_ne!(err.kind, ParseErrorKind::MissingElement);
    }
}
