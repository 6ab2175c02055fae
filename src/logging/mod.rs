use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding an `EnvFilter` directive, e.g. `frost=trace`.
pub(crate) const LOG_ENV: &str = "FROST_LOG";

/// Install the global subscriber: human-readable lines on stderr.
///
/// Debug builds log blur failures (`debug`), release builds only `info` and
/// above. `FROST_LOG` overrides both.
pub(crate) fn init() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter())
        .init();
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive()))
}

fn default_directive() -> &'static str {
    if cfg!(debug_assertions) {
        "frost=debug"
    } else {
        "frost=info"
    }
}
