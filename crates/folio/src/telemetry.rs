//! Tracing subscriber setup for the binary.

use folio_error::{ConfigError, FolioResult};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects debug output for
/// folio crates and info for everything else. Logs go to stderr so command
/// output on stdout stays machine-readable.
///
/// # Errors
///
/// Returns a `ConfigError` if a global subscriber is already installed.
pub fn init_tracing(verbose: bool, format: LogFormat) -> FolioResult<()> {
    let default_directive = if verbose {
        "info,folio=debug,folio_pipeline=debug,folio_memory=debug,folio_models=debug,folio_retry=debug,folio_storage=debug"
    } else {
        "warn,folio=info,folio_pipeline=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
    result.map_err(|e| ConfigError::new(format!("Failed to install tracing subscriber: {e}")).into())
}
