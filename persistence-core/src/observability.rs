//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::config::{Config, LogFormat};
use crate::error::{Error, Result};

/// Install the global `tracing` subscriber described by `config.logging`
///
/// An unparsable level falls back to `info`. Fails with [`Error::Internal`]
/// when a global subscriber is already installed.
pub fn init_tracing(config: &Config) -> Result<()> {
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match config.logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    installed.map_err(|e| Error::Internal(format!("failed to install tracing subscriber: {e}")))?;

    tracing::info!(
        level = %config.logging.level,
        format = ?config.logging.format,
        "Tracing initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        let config = Config::default();
        // Another test may have installed the subscriber already
        let _ = init_tracing(&config);

        let error = init_tracing(&config).unwrap_err();
        assert!(matches!(error, Error::Internal(_)));
    }
}
