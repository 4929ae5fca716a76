use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
pub use tracing::{info, error, warn, debug, trace};

/// Used when `RUST_LOG` is unset. Quiet enough that the redrawn display stays readable.
const DEFAULT_FILTER: &str = "compounder=warn,grape=warn";

/// Installs the global subscriber. Output goes to stderr; stdout belongs to
/// the console display.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
