//! Byte-range and transfer error types.

use salvo::http::StatusCode;
use thiserror::Error;

/// Result type for range parsing and resolution.
pub type RangeResult<T> = Result<T, RangeError>;

/// A `Range` header that cannot be honoured.
///
/// Both variants are raised before any body byte is written, so they always
/// surface as a status code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// The header does not match `bytes=<start>?-<end>?`.
    #[error("malformed range header: {0}")]
    Syntax(String),

    /// Inverted bounds, or a start beyond the resource length.
    #[error("range not satisfiable: {reason}")]
    NotSatisfiable {
        reason: String,
        /// Resource length, when it was known at the time of the check.
        total_length: Option<u64>,
    },
}

impl RangeError {
    #[must_use]
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax(message.into())
    }

    #[must_use]
    pub fn not_satisfiable(reason: impl Into<String>, total_length: Option<u64>) -> Self {
        Self::NotSatisfiable {
            reason: reason.into(),
            total_length,
        }
    }

    /// HTTP status the protocol layer answers with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Syntax(_) => StatusCode::BAD_REQUEST,
            Self::NotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
        }
    }
}

/// A failure while copying resource content to the client.
///
/// Headers are already committed when this happens; callers log it and
/// abort the transfer.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("source ended after {skipped} of {requested} bytes while seeking to range start")]
    ShortSkip { requested: u64, skipped: u64 },

    #[error("I/O error during transfer: {0}")]
    Io(#[from] std::io::Error),
}

pub type TransferResult<T> = Result<T, TransferError>;
