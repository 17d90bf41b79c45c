use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter, Registry,
};

const DEFAULT_FILTER: &str = "info";

/// Install the global tracing subscriber. Progress goes to stderr, so it never mixes with
/// anything a generator prints to stdout. `RUST_LOG` overrides the default `info` level.
pub fn init() -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    Registry::default().with(filter).with(fmt_layer).try_init()
}
