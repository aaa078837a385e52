//! Range units and namespace URIs shared across crates.

/// The only range unit understood by the content streamer.
pub const BYTES_UNIT: &str = "bytes";
/// `Content-Range` prefix for a satisfied byte range.
pub const BYTES_UNIT_PREFIX: &str = const_str::concat!(BYTES_UNIT, " ");

/// `DAV:` namespace URI.
pub const DAV_NS: &str = "DAV:";
/// Conventional prefix bound to [`DAV_NS`] in responses.
pub const DAV_PREFIX: &str = "D";

/// The `xml:` namespace, bound implicitly in every document.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
/// XInclude namespace; elements in it are never processed.
pub const XINCLUDE_NS: &str = "http://www.w3.org/2001/XInclude";

/// Methods a null resource (lock-null placeholder) still answers to.
pub const NULL_RESOURCE_ALLOW: &str = "OPTIONS, MKCOL, PUT, PROPFIND, LOCK, UNLOCK";

/// Prolog written at the top of every XML response body.
pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n";
