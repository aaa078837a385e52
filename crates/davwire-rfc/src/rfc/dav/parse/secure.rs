//! Hardened, namespace-aware XML parsing.
//!
//! Request bodies are attacker controlled. The parser therefore never
//! expands a DTD entity, never loads anything external and refuses any
//! document that carries a `<!DOCTYPE`. Undeclared entity references are
//! handed to [`NullEntityResolver`], which resolves them to nothing.

use std::sync::OnceLock;

use quick_xml::Reader;
use quick_xml::escape::{resolve_predefined_entity, unescape_with};
use quick_xml::events::{BytesStart, Event};

use davwire_core::config::{DEFAULT_XML_MAX_DEPTH, XmlConfig};
use davwire_core::constants::{XINCLUDE_NS, XML_NS};

use super::error::{ParseError, ParseResult};
use super::tree::{XmlDocument, XmlElement, XmlNode};

static SHARED: OnceLock<SecureXmlParser> = OnceLock::new();

/// Parser settings. Only the hardened profile can be constructed; the
/// nesting limit is the one tunable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    namespace_aware: bool,
    expand_entities: bool,
    validate_dtd: bool,
    load_external_dtd: bool,
    xinclude_aware: bool,
    allow_doctype: bool,
    max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::hardened()
    }
}

impl ParserConfig {
    #[must_use]
    pub const fn hardened() -> Self {
        Self {
            namespace_aware: true,
            expand_entities: false,
            validate_dtd: false,
            load_external_dtd: false,
            xinclude_aware: false,
            allow_doctype: false,
            max_depth: DEFAULT_XML_MAX_DEPTH,
        }
    }

    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub const fn namespace_aware(&self) -> bool {
        self.namespace_aware
    }

    #[must_use]
    pub const fn expand_entities(&self) -> bool {
        self.expand_entities
    }

    #[must_use]
    pub const fn validate_dtd(&self) -> bool {
        self.validate_dtd
    }

    #[must_use]
    pub const fn load_external_dtd(&self) -> bool {
        self.load_external_dtd
    }

    #[must_use]
    pub const fn xinclude_aware(&self) -> bool {
        self.xinclude_aware
    }

    #[must_use]
    pub const fn allow_doctype(&self) -> bool {
        self.allow_doctype
    }

    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn check(&self) -> ParseResult<()> {
        let hardened = self.namespace_aware
            && !self.expand_entities
            && !self.validate_dtd
            && !self.load_external_dtd
            && !self.xinclude_aware
            && !self.allow_doctype;
        if !hardened {
            return Err(ParseError::configuration(
                "parser configuration must disable entities, DTDs and XInclude",
            ));
        }
        if self.max_depth == 0 {
            return Err(ParseError::configuration("max_depth must be greater than zero"));
        }
        Ok(())
    }
}

/// Resolves entity references that are neither predefined nor character
/// references. Nothing is ever fetched; the reference becomes empty text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullEntityResolver;

impl NullEntityResolver {
    #[must_use]
    pub fn resolve(&self, name: &str) -> &'static str {
        tracing::warn!(entity = %name, "Undeclared entity reference resolved to empty content");
        ""
    }
}

/// The request XML parser. Immutable once built and safe to share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureXmlParser {
    config: ParserConfig,
    resolver: NullEntityResolver,
}

impl SecureXmlParser {
    /// ## Summary
    /// Builds a parser for an explicit configuration.
    ///
    /// ## Errors
    /// `ParseErrorKind::Configuration` if the configuration is not hardened.
    pub fn new(config: ParserConfig) -> ParseResult<Self> {
        config.check()?;
        Ok(Self {
            config,
            resolver: NullEntityResolver,
        })
    }

    /// ## Summary
    /// Builds a parser from the `xml` settings section.
    ///
    /// ## Errors
    /// `ParseErrorKind::Configuration` for a zero depth limit.
    pub fn from_settings(settings: &XmlConfig) -> ParseResult<Self> {
        Self::new(ParserConfig::hardened().with_max_depth(settings.max_depth))
    }

    /// The process-wide parser with the default hardened configuration,
    /// built on first use.
    pub fn shared() -> &'static Self {
        SHARED.get_or_init(|| {
            tracing::debug!("Building shared XML parser");
            Self {
                config: ParserConfig::hardened(),
                resolver: NullEntityResolver,
            }
        })
    }

    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses a UTF-8 request body.
    ///
    /// ## Errors
    /// Returns an error if the body is not UTF-8 or if [`Self::parse`] fails.
    pub fn parse_bytes(&self, xml: &[u8]) -> ParseResult<XmlDocument> {
        self.parse(std::str::from_utf8(xml)?)
    }

    /// Parses a document into an owned tree.
    ///
    /// ## Summary
    /// Resolves namespaces per element scope, decodes predefined entities
    /// and character references, drops whitespace-only text between markup
    /// and merges adjacent character data.
    ///
    /// ## Errors
    /// Returns an error if the XML is malformed, declares a DOCTYPE, uses an
    /// unbound prefix or nests deeper than the configured limit.
    #[tracing::instrument(skip(self, xml), fields(xml_len = xml.len()))]
    pub fn parse(&self, xml: &str) -> ParseResult<XmlDocument> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut builder = TreeBuilder::new(self);

        loop {
            let event = reader.read_event().map_err(|err| {
                tracing::debug!(error = %err, position = reader.error_position(), "Malformed XML");
                ParseError::xml(format!("{err} at byte {}", reader.error_position()))
            })?;

            match event {
                Event::Start(ref e) => builder.start_element(e)?,
                Event::Empty(ref e) => {
                    builder.start_element(e)?;
                    builder.end_element()?;
                }
                Event::End(_) => builder.end_element()?,
                Event::Text(ref e) => {
                    let text = self.unescape(std::str::from_utf8(e)?)?;
                    builder.push_text(&text);
                }
                Event::GeneralRef(ref e) => {
                    let reference = format!("&{};", std::str::from_utf8(e)?);
                    let text = self.unescape(&reference)?;
                    builder.push_text(&text);
                }
                Event::CData(ref e) => {
                    builder.push_node(XmlNode::CData(std::str::from_utf8(e)?.to_owned()))?;
                }
                Event::Comment(ref e) => {
                    builder.push_node(XmlNode::Comment(std::str::from_utf8(e)?.to_owned()))?;
                }
                Event::PI(ref e) => {
                    builder.push_node(XmlNode::ProcessingInstruction(
                        std::str::from_utf8(e)?.to_owned(),
                    ))?;
                }
                Event::DocType(_) => {
                    tracing::warn!("Rejecting XML document with DOCTYPE declaration");
                    return Err(ParseError::doctype_rejected());
                }
                Event::Eof => break,
                _ => {}
            }
        }

        builder.finish()
    }

    /// Decodes references in raw character data or attribute values.
    fn unescape(&self, raw: &str) -> ParseResult<String> {
        let text = unescape_with(raw, |entity| {
            Some(resolve_predefined_entity(entity).unwrap_or_else(|| self.resolver.resolve(entity)))
        })?;
        Ok(text.into_owned())
    }
}

struct OpenElement {
    element: XmlElement,
    /// Number of namespace bindings this element pushed onto the scope.
    bindings: usize,
}

/// Accumulates parser events into an [`XmlDocument`].
struct TreeBuilder<'p> {
    parser: &'p SecureXmlParser,
    stack: Vec<OpenElement>,
    /// In-scope `(prefix, uri)` bindings; the empty prefix is the default
    /// namespace, and `None` undeclares it.
    scopes: Vec<(String, Option<String>)>,
    pending_text: String,
    prolog: Vec<XmlNode>,
    root: Option<XmlElement>,
    epilog: Vec<XmlNode>,
}

impl<'p> TreeBuilder<'p> {
    fn new(parser: &'p SecureXmlParser) -> Self {
        Self {
            parser,
            stack: Vec::new(),
            scopes: Vec::new(),
            pending_text: String::new(),
            prolog: Vec::new(),
            root: None,
            epilog: Vec::new(),
        }
    }

    fn start_element(&mut self, e: &BytesStart<'_>) -> ParseResult<()> {
        self.flush_text()?;

        let max_depth = self.parser.config.max_depth;
        if self.stack.len() >= max_depth {
            tracing::warn!(max_depth, "XML nesting limit exceeded");
            return Err(ParseError::depth_exceeded(max_depth));
        }
        if self.stack.is_empty() && self.root.is_some() {
            return Err(ParseError::xml("multiple root elements"));
        }

        let name = std::str::from_utf8(e.name().as_ref())?.to_owned();
        let (prefix, local_name) = split_name(&name);

        let mut attributes = Vec::new();
        let mut bindings = 0;
        for attr in e.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?.to_owned();
            let value = self.parser.unescape(std::str::from_utf8(&attr.value)?)?;

            if key == "xmlns" {
                let uri = (!value.is_empty()).then(|| value.clone());
                self.scopes.push((String::new(), uri));
                bindings += 1;
            } else if let Some(bound) = key.strip_prefix("xmlns:") {
                if value.is_empty() {
                    return Err(ParseError::xml(format!(
                        "namespace prefix '{bound}' bound to an empty URI"
                    )));
                }
                self.scopes.push((bound.to_owned(), Some(value.clone())));
                bindings += 1;
            } else {
                // Unprefixed attributes and xmlns declarations need no binding.
            }
            attributes.push((key, value));
        }

        let namespace = match prefix {
            Some(prefix) => Some(self.lookup(prefix)?),
            None => self.lookup_default(),
        };
        for (key, _) in &attributes {
            if let (Some(attr_prefix), _) = split_name(key)
                && attr_prefix != "xmlns"
            {
                self.lookup(attr_prefix)?;
            }
        }

        if namespace.as_deref() == Some(XINCLUDE_NS) {
            tracing::debug!(element = %name, "XInclude element kept unprocessed");
        }

        let element = XmlElement {
            prefix: prefix.map(str::to_owned),
            local_name: local_name.to_owned(),
            namespace,
            attributes,
            children: Vec::new(),
        };
        self.stack.push(OpenElement { element, bindings });
        Ok(())
    }

    fn end_element(&mut self) -> ParseResult<()> {
        self.flush_text()?;

        let open = self
            .stack
            .pop()
            .ok_or_else(|| ParseError::xml("closing tag without matching opening tag"))?;
        let keep = self.scopes.len().saturating_sub(open.bindings);
        self.scopes.truncate(keep);

        match self.stack.last_mut() {
            Some(parent) => parent.element.children.push(XmlNode::Element(open.element)),
            None => self.root = Some(open.element),
        }
        Ok(())
    }

    fn push_text(&mut self, text: &str) {
        self.pending_text.push_str(text);
    }

    fn push_node(&mut self, node: XmlNode) -> ParseResult<()> {
        self.flush_text()?;
        match (self.stack.last_mut(), &self.root) {
            (Some(parent), _) => parent.element.children.push(node),
            (None, None) => self.prolog.push(node),
            (None, Some(_)) => self.epilog.push(node),
        }
        Ok(())
    }

    /// Moves pending character data into the tree. Whitespace-only runs are
    /// formatting and are dropped.
    fn flush_text(&mut self) -> ParseResult<()> {
        if self.pending_text.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.pending_text);
        if text.chars().all(char::is_whitespace) {
            return Ok(());
        }

        match self.stack.last_mut() {
            Some(parent) => {
                parent.element.children.push(XmlNode::Text(text));
                Ok(())
            }
            None => Err(ParseError::xml("text outside the root element")),
        }
    }

    fn lookup(&self, prefix: &str) -> ParseResult<String> {
        if prefix == "xml" {
            return Ok(XML_NS.to_owned());
        }
        self.scopes
            .iter()
            .rev()
            .find(|(bound, _)| bound == prefix)
            .and_then(|(_, uri)| uri.clone())
            .ok_or_else(|| ParseError::unbound_prefix(prefix))
    }

    fn lookup_default(&self) -> Option<String> {
        self.scopes
            .iter()
            .rev()
            .find(|(bound, _)| bound.is_empty())
            .and_then(|(_, uri)| uri.clone())
    }

    fn finish(mut self) -> ParseResult<XmlDocument> {
        self.flush_text()?;
        if let Some(open) = self.stack.last() {
            return Err(ParseError::xml(format!(
                "unclosed element <{}>",
                open.element.qualified_name()
            )));
        }
        let root = self
            .root
            .ok_or_else(|| ParseError::xml("document has no root element"))?;

        Ok(XmlDocument {
            prolog: self.prolog,
            root,
            epilog: self.epilog,
        })
    }
}

/// Splits `prefix:local` at the first colon.
fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}
