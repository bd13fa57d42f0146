//! Logging initialization and configuration.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Initializes the logging subsystem based on configuration.
///
/// `RUST_LOG` takes precedence over the configured level. Any format other
/// than `json` falls back to the human-readable pretty printer.
pub fn init_logging(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(&config.level)));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            let json_layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_current_span(true)
                .with_target(true);
            subscriber.with(json_layer).init();
        }
        _ => {
            let pretty_layer = fmt::layer()
                .pretty()
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true);
            subscriber.with(pretty_layer).init();
        }
    }
}

/// Filter for the configured level. sqlx statement logging stays at warn
/// unless the service itself runs at trace.
fn filter_directives(level: &str) -> String {
    if level.eq_ignore_ascii_case("trace") {
        level.to_string()
    } else {
        format!("{},sqlx=warn", level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives_quiets_sqlx() {
        assert_eq!(filter_directives("info"), "info,sqlx=warn");
        assert_eq!(filter_directives("debug"), "debug,sqlx=warn");
    }

    #[test]
    fn test_filter_directives_trace_passthrough() {
        assert_eq!(filter_directives("trace"), "trace");
    }
}
