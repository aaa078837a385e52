//! XML serialisation errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SerializeError {
    #[error("XML write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML write failed: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("serialised XML is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type SerializeResult<T> = Result<T, SerializeError>;
