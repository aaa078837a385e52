//! DAV XML parse error types.

use std::fmt;

/// Result type for DAV XML parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// An error that occurred during DAV XML parsing.
///
/// Every kind maps to a client-level bad request; the kind only exists so the
/// logs say why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Error kind.
    pub kind: ParseErrorKind,
    /// Error message.
    pub message: String,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates an XML well-formedness error.
    #[must_use]
    pub fn xml(message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::XmlError, message)
    }

    /// Creates the error raised for any document type declaration.
    #[must_use]
    pub fn doctype_rejected() -> Self {
        Self::new(
            ParseErrorKind::DoctypeRejected,
            "document type declarations are not allowed",
        )
    }

    /// Creates an unbound namespace prefix error.
    #[must_use]
    pub fn unbound_prefix(prefix: &str) -> Self {
        Self::new(
            ParseErrorKind::UnboundPrefix,
            format!("namespace prefix '{prefix}' is not bound"),
        )
    }

    /// Creates a nesting limit error.
    #[must_use]
    pub fn depth_exceeded(limit: usize) -> Self {
        Self::new(
            ParseErrorKind::DepthExceeded,
            format!("element nesting exceeds {limit} levels"),
        )
    }

    /// Creates a parser configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::Configuration, message)
    }

    /// Creates a missing element error.
    #[must_use]
    pub fn missing_element(name: &str) -> Self {
        Self::new(
            ParseErrorKind::MissingElement,
            format!("missing required element: {name}"),
        )
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<quick_xml::Error> for ParseError {
    fn from(err: quick_xml::Error) -> Self {
        Self::xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for ParseError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::xml(err.to_string())
    }
}

impl From<quick_xml::escape::EscapeError> for ParseError {
    fn from(err: quick_xml::escape::EscapeError) -> Self {
        Self::xml(err.to_string())
    }
}

impl From<std::str::Utf8Error> for ParseError {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::new(ParseErrorKind::EncodingError, err.to_string())
    }
}

/// Parse error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Malformed XML.
    XmlError,
    /// The document declared a DOCTYPE.
    DoctypeRejected,
    /// A prefix was used without an `xmlns:` binding in scope.
    UnboundPrefix,
    /// Element nesting exceeded the configured limit.
    DepthExceeded,
    /// The parser configuration is not hardened.
    Configuration,
    /// Missing required element.
    MissingElement,
    /// Encoding error.
    EncodingError,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::XmlError => write!(f, "XML error"),
            Self::DoctypeRejected => write!(f, "doctype rejected"),
            Self::UnboundPrefix => write!(f, "unbound prefix"),
            Self::DepthExceeded => write!(f, "depth exceeded"),
            Self::Configuration => write!(f, "parser configuration error"),
            Self::MissingElement => write!(f, "missing element"),
            Self::EncodingError => write!(f, "encoding error"),
        }
    }
}
