use thiserror::Error;

/// Core-level errors
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Logging initialisation failed: {0}")]
    LoggingInit(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
