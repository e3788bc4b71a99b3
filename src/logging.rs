//! Log output for the `leaf` binary
//!
//! Library code only emits `tracing` events under `leaf::*` targets; the
//! binary installs the subscriber once at startup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding an `EnvFilter` directive
pub const LOG_ENV: &str = "LEAF_LOG";

/// Level used when neither `LEAF_LOG` nor a configured level is set
pub const DEFAULT_LEVEL: &str = "info";

/// Builds the filter: `LEAF_LOG` wins over `level`, which wins over `info`
pub fn filter(level: Option<&str>) -> EnvFilter {
    if let Ok(directive) = std::env::var(LOG_ENV) {
        if let Ok(filter) = EnvFilter::try_new(&directive) {
            return filter;
        }
    }
    level
        .and_then(|level| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LEVEL))
}

/// Installs the stderr subscriber
///
/// Calling it again is harmless; only the first call takes effect.
pub fn init(level: Option<&str>, color: bool) {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(color)
        .with_target(false);

    let _ = tracing_subscriber::registry()
        .with(filter(level))
        .with(layer)
        .try_init();
}
