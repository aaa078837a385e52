//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::error::{CoreError, CoreResult};

/// Filter used when the configured level cannot be parsed.
const FALLBACK_FILTER: &str = "info";

/// ## Summary
/// Builds the `EnvFilter` for a configured level, falling back to `info`.
#[must_use]
pub fn filter_for(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_new(config.level.as_str()).unwrap_or_else(|err| {
        tracing::warn!(level = %config.level, error = %err, "Invalid log level in config, using info");
        EnvFilter::new(FALLBACK_FILTER)
    })
}

/// ## Summary
/// Installs the global tracing subscriber.
///
/// ## Errors
/// Returns `CoreError::LoggingInit` if a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> CoreResult<()> {
    tracing_subscriber::registry()
        .with(filter_for(config))
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init()
        .map_err(|err| CoreError::LoggingInit(err.to_string()))?;

    tracing::debug!(level = %config.level, "Logging initialised");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_level_is_kept() {
        let filter = filter_for(&LoggingConfig {
            level: "debug".to_string(),
        });
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn invalid_level_falls_back() {
        let filter = filter_for(&LoggingConfig {
            level: "davwire=notalevel".to_string(),
        });
        assert_eq!(filter.to_string(), FALLBACK_FILTER);
    }

    #[test_log::test]
    fn second_subscriber_is_rejected() {
        let result = init_logging(&LoggingConfig::default());
        assert!(matches!(result, Err(CoreError::LoggingInit(_))));
    }
}
