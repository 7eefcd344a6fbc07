use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding an `EnvFilter` directive string.
pub const LOG_ENV: &str = "CLOUDSCRIBE_LOG";

/// Errors from everything, plus cloudscribe's own warnings (selection fallbacks, leftover
/// temp files).
const DEFAULT_DIRECTIVES: &str = "error,cloudscribe=warn";

/// Initialize structured JSON logging for cloudscribe's tracing events.
///
/// The filter comes from `CLOUDSCRIBE_LOG` (e.g. `cloudscribe=debug`). An unset, empty or
/// unparsable value falls back to `error,cloudscribe=warn`. Calling this more than once, or
/// after another global subscriber was installed, is harmless.
pub fn init_logging() {
    let filter = filter_from(std::env::var(LOG_ENV).ok().as_deref());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true),
        )
        .try_init();
}

fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}
