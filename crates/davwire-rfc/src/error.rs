use thiserror::Error;

use crate::rfc::dav::build::SerializeError;
use crate::rfc::dav::parse::ParseError;
use crate::rfc::range::{RangeError, TransferError};

/// Protocol layer errors
#[derive(Error, Debug)]
pub enum RfcError {
    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error(transparent)]
    Core(#[from] davwire_core::error::CoreError),
}

pub type RfcResult<T> = std::result::Result<T, RfcError>;
