//! Logging setup
//!
//! The data core logs through the standard `log` facade (`log::info!` for
//! lifecycle milestones, `log::debug!` for every executed statement,
//! `log::trace!` for skipped decorations). [`init_logging`] installs an
//! `env_logger` backend once, with level and format taken from
//! [`LoggingConfig`].

pub mod formatter;

pub use crate::config::LoggingConfig;
pub use formatter::LogFormat;

use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging from configuration
///
/// Safe to call multiple times; only the first call installs a logger. An
/// invalid configuration is reported before anything is installed.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let level = config.level_filter()?;
    let format = LogFormat::parse(&config.format)
        .ok_or_else(|| anyhow::anyhow!("Invalid logging.format '{}'", config.format))?;

    INIT.call_once(|| {
        // Another logger may already be installed by the embedding application
        let _ = env_logger::Builder::new()
            .filter_level(level)
            .format(move |buf, record| writeln!(buf, "{}", format.format_record(record)))
            .try_init();
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        let config = LoggingConfig::default();
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_invalid_format_is_rejected() {
        let config = LoggingConfig {
            format: "xml".to_string(),
            ..LoggingConfig::default()
        };
        assert!(init_logging(&config).is_err());
    }
}
