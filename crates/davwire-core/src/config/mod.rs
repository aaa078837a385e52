use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

/// Default size of the intermediate copy buffer used when streaming content.
pub const DEFAULT_TRANSFER_BUFFER_SIZE: usize = 64 * 1024;

/// Default element nesting limit for request XML.
pub const DEFAULT_XML_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    pub transfer: TransferConfig,
    pub xml: XmlConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferConfig {
    /// Size in bytes of the buffer used to copy resource content to the client.
    pub buffer_size: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_TRANSFER_BUFFER_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct XmlConfig {
    /// Maximum element nesting accepted by the request parser.
    pub max_depth: usize,
    /// Whether flushed responses are pretty-printed into the debug log.
    pub log_pretty: bool,
}

impl Default for XmlConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_XML_MAX_DEPTH,
            log_pretty: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `.env` file, environment variables and an optional
    /// `config.toml` into a `Settings`.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails,
    /// or if the loaded values do not pass [`Settings::validate`].
    pub fn load() -> Result<Self> {
        let raw = Self::defaults()?
            .add_source(
                config::Environment::with_prefix("DAVWIRE")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .add_source(config::File::with_name("config.toml").required(false))
            .build()?;

        Self::from_config(raw)
    }

    /// ## Summary
    /// Deserializes and validates settings from an already built configuration.
    ///
    /// ## Errors
    /// Returns an error if deserialization or validation fails.
    pub fn from_config(raw: Config) -> Result<Self> {
        let settings = raw.try_deserialize::<Self>()?;
        settings.validate()?;
        Ok(settings)
    }

    /// ## Summary
    /// Returns a configuration builder pre-populated with every default value.
    ///
    /// ## Errors
    /// Returns an error if a default cannot be registered.
    pub fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(Config::builder()
            .set_default("transfer.buffer_size", 64 * 1024)?
            .set_default("xml.max_depth", 256)?
            .set_default("xml.log_pretty", true)?
            .set_default("logging.level", "info")?)
    }

    /// ## Summary
    /// Checks the values that would make the protocol layer unusable.
    ///
    /// ## Errors
    /// Returns `CoreError::InvalidConfiguration` naming the offending key.
    pub fn validate(&self) -> CoreResult<()> {
        if self.transfer.buffer_size == 0 {
            return Err(CoreError::InvalidConfiguration(
                "transfer.buffer_size must be greater than zero".to_string(),
            ));
        }
        if self.xml.max_depth == 0 {
            return Err(CoreError::InvalidConfiguration(
                "xml.max_depth must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
