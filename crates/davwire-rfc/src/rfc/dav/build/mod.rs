//! `WebDAV` XML response building.

mod error;
pub mod format;
pub mod writer;

pub use error::{SerializeError, SerializeResult};
pub use format::{XmlPrettyFormatter, serialize_document};
pub use writer::{XmlElementType, XmlResponseWriter};
