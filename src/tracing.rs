use tracing_subscriber::{EnvFilter, fmt::SubscriberBuilder};

/// Fallback filter for a `-v` count when `RUST_LOG` is unset.
pub fn filter_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "info,reqwest=warn,hyper=warn",
        1 => "debug,reqwest=info,hyper=warn",
        _ => "trace",
    }
}

/// Sets up the global tracing subscriber with a fmt formatter and env filter.
///
/// `default_filter` applies when `RUST_LOG` is not set. Output goes to stderr
/// so tables printed on stdout can be piped.
pub fn init_tracing(default_filter: &str) -> Result<(), anyhow::Error> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))
}
