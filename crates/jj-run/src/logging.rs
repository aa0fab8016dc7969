use std::io;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset and no `-v` flag was given.
const DEFAULT_FILTER: &str = "warn";

/// Install the diagnostic subscriber: compact, on stderr.
///
/// `RUST_LOG` wins when set. Otherwise each `-v` raises the level for the
/// jj-run crates, so user-facing output on stdout stays clean by default.
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directive(verbose)));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).compact())
        .try_init();
    if let Err(e) = installed {
        eprintln!("Failed to install log subscriber: {e}");
    }
}

/// Filter directive for a `-v` count.
fn directive(verbose: u8) -> String {
    match verbose {
        0 => DEFAULT_FILTER.to_string(),
        1 => "warn,libjjrun=debug,jj_run=debug".to_string(),
        _ => "warn,libjjrun=trace,jj_run=trace".to_string(),
    }
}
