use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One short line per event, for a terminal.
    #[default]
    Compact,
    /// JSON lines with flattened fields, for `watch` runs shipped to a collector.
    Json,
}

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "flight_desk=debug,info"
    } else {
        "flight_desk=info"
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_logger(format: LogFormat, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));
    let layer = tracing_subscriber::fmt::layer()
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Compact => registry.with(layer.with_target(false).compact()).init(),
        LogFormat::Json => registry
            .with(layer.with_target(true).json().flatten_event(true))
            .init(),
    }
}
