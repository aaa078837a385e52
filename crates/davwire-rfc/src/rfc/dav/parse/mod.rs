//! `WebDAV` XML parsing.
//!
//! Request bodies are parsed once into an owned tree by the hardened
//! [`SecureXmlParser`] built on `quick-xml`.

mod error;
pub mod propfind;
pub mod secure;
mod tree;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use propfind::{extract_property_names, find_prop, parse_requested_properties};
pub use secure::{NullEntityResolver, ParserConfig, SecureXmlParser};
pub use tree::{XmlDocument, XmlElement, XmlNode};
